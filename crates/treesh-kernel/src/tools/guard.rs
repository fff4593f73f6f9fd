//! Password prompts shared by the builtins.
//!
//! A tool that touches a protected path hands the rest of its work to
//! [`unlock`] as an [`Unlocked`] value. If no prompt is needed it runs right
//! away; otherwise the stage suspends and the work runs once the right
//! password comes back.

use async_trait::async_trait;
use tracing::warn;

use super::{Continuation, ExecContext};
use crate::interpreter::{ExecResult, Prompt, EXIT_CANCELLED, EXIT_DENIED, EXIT_FAILURE};
use crate::store::StoreError;

/// Work to do once access is granted.
#[async_trait]
pub trait Unlocked: Send {
    async fn run(self: Box<Self>, ctx: &mut ExecContext) -> ExecResult;
}

/// `"<cmd>: storage error: ..."`.
pub fn storage_failure(cmd: &str, err: &StoreError) -> ExecResult {
    warn!(cmd, error = %err, "store round trip failed");
    ExecResult::failure(EXIT_FAILURE, format!("{cmd}: storage error: {err}"))
}

/// Run `then` once the password for `path` has been given, if it has one.
///
/// `target` is the path as the user typed it, for the prompt label.
pub async fn unlock(
    ctx: &mut ExecContext,
    cmd: &'static str,
    target: &str,
    path: &str,
    then: Box<dyn Unlocked>,
) -> ExecResult {
    if ctx.is_elevated() {
        return then.run(ctx).await;
    }
    match ctx.vault.lookup(path).await {
        Ok(None) => then.run(ctx).await,
        Ok(Some(_)) => ExecResult::awaiting(
            Prompt::password(format!("Password for '{target}':")),
            Box::new(PasswordGate {
                cmd,
                path: path.to_string(),
                then,
            }),
        ),
        Err(e) => storage_failure(cmd, &e),
    }
}

struct PasswordGate {
    cmd: &'static str,
    path: String,
    then: Box<dyn Unlocked>,
}

#[async_trait]
impl Continuation for PasswordGate {
    async fn resume(self: Box<Self>, answer: Option<String>, ctx: &mut ExecContext) -> ExecResult {
        let gate = *self;
        let granted = match answer {
            None => Ok(false),
            Some(attempt) => ctx.vault.check(&gate.path, &attempt, ctx.elevation()).await,
        };
        match granted {
            Ok(true) => gate.then.run(ctx).await,
            Ok(false) => {
                warn!(cmd = gate.cmd, path = %gate.path, "incorrect password");
                ExecResult::failure(EXIT_DENIED, format!("{}: incorrect password", gate.cmd))
            }
            Err(e) => storage_failure(gate.cmd, &e),
        }
    }
}

/// A further password check, for commands that touch two paths.
pub struct Gate {
    cmd: &'static str,
    target: String,
    path: String,
    then: Box<dyn Unlocked>,
}

impl Gate {
    pub fn new(cmd: &'static str, target: &str, path: &str, then: Box<dyn Unlocked>) -> Box<Self> {
        Box::new(Self {
            cmd,
            target: target.to_string(),
            path: path.to_string(),
            then,
        })
    }
}

#[async_trait]
impl Unlocked for Gate {
    async fn run(self: Box<Self>, ctx: &mut ExecContext) -> ExecResult {
        let gate = *self;
        unlock(ctx, gate.cmd, &gate.target, &gate.path, gate.then).await
    }
}

/// Ask for a new password twice, store it for `path`, then run `then`.
pub fn capture_password(
    cmd: &'static str,
    target: &str,
    path: &str,
    then: Box<dyn Unlocked>,
) -> ExecResult {
    ExecResult::awaiting(
        Prompt::password(format!("Set password for '{target}':")),
        Box::new(NewPassword {
            cmd,
            path: path.to_string(),
            then,
        }),
    )
}

struct NewPassword {
    cmd: &'static str,
    path: String,
    then: Box<dyn Unlocked>,
}

#[async_trait]
impl Continuation for NewPassword {
    async fn resume(self: Box<Self>, answer: Option<String>, _ctx: &mut ExecContext) -> ExecResult {
        let step = *self;
        match answer {
            Some(first) if !first.is_empty() => ExecResult::awaiting(
                Prompt::password("Confirm password:"),
                Box::new(ConfirmPassword {
                    cmd: step.cmd,
                    path: step.path,
                    first,
                    then: step.then,
                }),
            ),
            _ => ExecResult::failure(EXIT_CANCELLED, format!("{}: cancelled", step.cmd)),
        }
    }
}

struct ConfirmPassword {
    cmd: &'static str,
    path: String,
    first: String,
    then: Box<dyn Unlocked>,
}

#[async_trait]
impl Continuation for ConfirmPassword {
    async fn resume(self: Box<Self>, answer: Option<String>, ctx: &mut ExecContext) -> ExecResult {
        let step = *self;
        let Some(second) = answer else {
            return ExecResult::failure(EXIT_CANCELLED, format!("{}: cancelled", step.cmd));
        };
        if second != step.first {
            return ExecResult::failure(
                EXIT_FAILURE,
                format!("{}: passwords do not match", step.cmd),
            );
        }
        if let Err(e) = ctx.vault.set(&step.path, &step.first).await {
            return storage_failure(step.cmd, &e);
        }
        step.then.run(ctx).await
    }
}
