//! The Kernel: runs command lines against the tree store.
//!
//! The Kernel owns and coordinates the core components:
//! - Tool registry (the fixed builtin set)
//! - Node store, password vault, and ban list over one [`TreeStore`]
//! - Session persistence (per-identity working directory)
//! - The elevation guard
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                          Kernel                           │
//! │  ┌──────────────┐  ┌──────────────┐  ┌─────────────────┐  │
//! │  │ ToolRegistry │  │  NodeStore   │  │  PasswordVault  │  │
//! │  │  (builtins)  │  │ (fs subtree) │  │ (metadata tree) │  │
//! │  └──────────────┘  └──────────────┘  └─────────────────┘  │
//! │  ┌──────────────┐  ┌──────────────┐  ┌─────────────────┐  │
//! │  │   BanList    │  │ SessionStore │  │    SudoGuard    │  │
//! │  └──────────────┘  └──────────────┘  └─────────────────┘  │
//! └──────────────────────────┬────────────────────────────────┘
//!                            │
//!                      Arc<dyn TreeStore>
//! ```
//!
//! A line is split into `|` stages that run one after another, each getting
//! the previous stage's output as stdin. A stage that needs an answer from
//! the user parks the rest of the line in the [`Session`]; [`Kernel::resume`]
//! picks it up again.

use std::sync::Arc;

use anyhow::{Context, Result};
use regex::Regex;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::auth::{Elevation, Identity, SudoGuard};
use crate::config::ShellConfig;
use crate::interpreter::{
    ExecResult, Pipeline, Prompt, Stage, Suspended, EXIT_DENIED, EXIT_NOT_FOUND, EXIT_USAGE,
    REDIRECT_PATTERN,
};
use crate::moderation::BanList;
use crate::paths::{self, is_metadata, KeyError};
use crate::state::{Session, SessionStore};
use crate::store::{MemoryStore, Node, NodeStore, StoreError, TreeStore};
use crate::tools::{register_builtins, ExecContext, ToolArgs, ToolRegistry};
use crate::vault::PasswordVault;

/// Errors that stop a line before any command runs.
///
/// Everything else, including a store failure inside a command, comes back
/// as output text.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("identity is not verified")]
    Unauthenticated,
    #[error("no prompt is waiting for an answer")]
    NothingPending,
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What the caller should show next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The line finished; this is its final output.
    Output(String),
    /// The line is waiting; answer through [`Kernel::resume`].
    Prompt(Prompt),
}

/// The Kernel: executes treesh command lines.
pub struct Kernel {
    config: ShellConfig,
    store: Arc<dyn TreeStore>,
    nodes: Arc<NodeStore>,
    vault: PasswordVault,
    bans: BanList,
    sessions: SessionStore,
    tools: Arc<ToolRegistry>,
    /// Trailing `> target` on the last stage.
    redirect: Regex,
    sudo: SudoGuard,
}

impl Kernel {
    /// Create a kernel over `store` with the given configuration.
    pub fn new(config: ShellConfig, store: Arc<dyn TreeStore>) -> Result<Self> {
        let redirect = Regex::new(REDIRECT_PATTERN).context("failed to compile redirect pattern")?;

        let nodes = Arc::new(NodeStore::new(store.clone(), &config.fs_prefix));
        let vault = PasswordVault::new(nodes.clone());
        let bans = BanList::new(store.clone(), &config.ban_prefix);
        let sessions = SessionStore::new(store.clone(), &config.session_prefix);

        let mut tools = ToolRegistry::new();
        register_builtins(&mut tools);

        let sudo = config.sudo_guard();
        debug!(tools = tools.len(), fs_prefix = %config.fs_prefix, "kernel ready");

        Ok(Self {
            config,
            store,
            nodes,
            vault,
            bans,
            sessions,
            tools: Arc::new(tools),
            redirect,
            sudo,
        })
    }

    /// Create a kernel over a fresh in-memory store with default settings.
    pub fn transient() -> Result<Self> {
        Self::new(ShellConfig::default(), Arc::new(MemoryStore::new()))
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn TreeStore> {
        &self.store
    }

    pub fn nodes(&self) -> &Arc<NodeStore> {
        &self.nodes
    }

    pub fn vault(&self) -> &PasswordVault {
        &self.vault
    }

    pub fn bans(&self) -> &BanList {
        &self.bans
    }

    /// The guard that hands out [`Elevation`]s.
    pub fn sudo(&self) -> &SudoGuard {
        &self.sudo
    }

    /// Start a session. The persisted working directory is loaded on first use.
    pub fn open_session(&self, identity: Identity) -> Session {
        info!(identity = %identity.email, "session opened");
        Session::new(identity)
    }

    /// Run one command line.
    ///
    /// `elevation` applies to stages that start with the elevate keyword;
    /// other stages run without it. A keyword-led stage with no elevation
    /// is refused on its own and the line goes on.
    pub async fn execute(
        &self,
        session: &mut Session,
        line: &str,
        elevation: Option<&Elevation>,
    ) -> Result<Reply, ShellError> {
        if !session.identity().verified {
            warn!(identity = %session.identity().email, "refusing unverified identity");
            return Err(ShellError::Unauthenticated);
        }
        if !session.attached {
            self.sessions.attach(session).await?;
        }
        session.adopt_remote_cwd();
        if session.suspended.take().is_some() {
            warn!("new line abandons the one waiting on a prompt");
        }

        let pipeline = Pipeline::parse(line, &self.redirect);
        debug!(stages = pipeline.stages.len(), redirect = ?pipeline.redirect, "running line");
        self.run_from(session, pipeline, 0, String::new(), elevation.cloned())
            .await
    }

    /// Answer the prompt the session is waiting on. `None` cancels.
    pub async fn resume(
        &self,
        session: &mut Session,
        answer: Option<String>,
    ) -> Result<Reply, ShellError> {
        let Suspended {
            pipeline,
            index,
            stage_elevation,
            elevation,
            continuation,
        } = session.suspended.take().ok_or(ShellError::NothingPending)?;

        debug!(index, cancelled = answer.is_none(), "resuming stage");
        let mut ctx = self.context(session, String::new(), stage_elevation.clone());
        let mut result = continuation.resume(answer, &mut ctx).await;
        self.sync_cwd(session, &ctx).await;

        if let Some(pending) = result.pending.take() {
            session.suspended = Some(Suspended {
                pipeline,
                index,
                stage_elevation,
                elevation,
                continuation: pending.continuation,
            });
            return Ok(Reply::Prompt(pending.prompt));
        }
        self.run_from(session, pipeline, index + 1, result.out, elevation)
            .await
    }

    /// Run stages `index..` with `stdin` feeding the first of them.
    async fn run_from(
        &self,
        session: &mut Session,
        pipeline: Pipeline,
        mut index: usize,
        mut stdin: String,
        elevation: Option<Elevation>,
    ) -> Result<Reply, ShellError> {
        while index < pipeline.stages.len() {
            let stage = Stage::tokenize(&pipeline.stages[index], &self.config.elevate_keyword);
            let stage_elevation = if stage.elevated { elevation.clone() } else { None };

            let mut result = if stage.elevated && stage_elevation.is_none() {
                warn!(stage = %stage.name, "elevated stage without elevation");
                ExecResult::failure(
                    EXIT_DENIED,
                    format!("{}: permission denied", self.config.elevate_keyword),
                )
            } else {
                self.run_stage(session, &stage, std::mem::take(&mut stdin), stage_elevation.clone())
                    .await
            };

            if let Some(pending) = result.pending.take() {
                debug!(index, stage = %stage.name, "stage waiting on prompt");
                session.suspended = Some(Suspended {
                    pipeline,
                    index,
                    stage_elevation,
                    elevation,
                    continuation: pending.continuation,
                });
                return Ok(Reply::Prompt(pending.prompt));
            }
            stdin = result.out;
            index += 1;
        }

        let redirect_elevated = elevation.is_some()
            && pipeline
                .stages
                .last()
                .is_some_and(|s| Stage::tokenize(s, &self.config.elevate_keyword).elevated);
        let out = match pipeline.redirect {
            Some(target) => {
                let cwd = session.cwd().to_string();
                self.write_redirect(&cwd, &target, stdin, redirect_elevated).await
            }
            None => stdin,
        };
        Ok(Reply::Output(out))
    }

    async fn run_stage(
        &self,
        session: &mut Session,
        stage: &Stage,
        stdin: String,
        elevation: Option<Elevation>,
    ) -> ExecResult {
        if stage.name.is_empty() {
            return ExecResult::failure(EXIT_USAGE, "shell: empty command");
        }
        let Some(tool) = self.tools.get(&stage.name) else {
            return ExecResult::failure(
                EXIT_NOT_FOUND,
                format!("shell: command not found: {}", stage.name),
            );
        };

        debug!(stage = %stage.name, args = ?stage.args, elevated = elevation.is_some(), "dispatching stage");
        let mut ctx = self.context(session, stdin, elevation);
        let result = tool.execute(ToolArgs::from_vec(stage.args.clone()), &mut ctx).await;
        self.sync_cwd(session, &ctx).await;
        result
    }

    fn context(&self, session: &Session, stdin: String, elevation: Option<Elevation>) -> ExecContext {
        let mut ctx = ExecContext::new(self.nodes.clone(), self.vault.clone(), self.bans.clone());
        ctx.set_cwd(session.cwd().to_string());
        ctx.stdin = stdin;
        ctx.tool_schemas = self.tools.schemas();
        ctx.elevate_keyword = self.config.elevate_keyword.clone();
        ctx.set_elevation(elevation);
        ctx
    }

    /// Copy a changed working directory back to the session and persist it.
    async fn sync_cwd(&self, session: &mut Session, ctx: &ExecContext) {
        if ctx.cwd == session.cwd {
            return;
        }
        session.cwd = ctx.cwd.clone();
        if let Err(e) = self.sessions.save_cwd(session.identity(), &ctx.cwd).await {
            warn!(error = %e, "failed to persist cwd");
        }
    }

    /// Write the final output to `target`.
    ///
    /// Returns the output either way. A refused or failed write adds a line
    /// saying why.
    async fn write_redirect(&self, cwd: &str, target: &str, out: String, elevated: bool) -> String {
        let path = paths::resolve(target, cwd);
        match self.check_redirect(target, &path, elevated).await {
            Ok(()) => match self.nodes.write_file(&path, &out).await {
                Ok(()) => {
                    debug!(path = %path, bytes = out.len(), "redirected output");
                    out
                }
                Err(e) => {
                    warn!(path = %path, error = %e, "redirect write failed");
                    append_line(out, &format!("shell: storage error: {e}"))
                }
            },
            Err(refusal) => append_line(out, &refusal),
        }
    }

    async fn check_redirect(&self, target: &str, path: &str, elevated: bool) -> Result<(), String> {
        if path == "/" {
            return Err("shell: cannot redirect to root directory".to_string());
        }
        if is_metadata(path) && !elevated {
            return Err("shell: permission denied to access metadata".to_string());
        }
        let storage = |e: StoreError| format!("shell: storage error: {e}");

        if let Some(Node::Directory { .. }) = self.nodes.load(path).await.map_err(storage)? {
            return Err(format!("shell: cannot redirect to directory: {target}"));
        }
        if !elevated && self.vault.lookup(path).await.map_err(storage)?.is_some() {
            return Err(format!("shell: permission denied: '{target}' is password-protected"));
        }

        // Missing ancestors get created by the write, but a file can't hold children.
        match self.nodes.file_ancestor(path).await.map_err(storage)? {
            Some(ancestor) => Err(format!("shell: not a directory: {ancestor}")),
            None => Ok(()),
        }
    }
}

fn append_line(out: String, line: &str) -> String {
    if out.is_empty() {
        line.to_string()
    } else {
        format!("{out}\n{line}")
    }
}
