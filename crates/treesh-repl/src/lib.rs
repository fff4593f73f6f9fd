//! treesh REPL: a terminal stand-in for the chat surface.
//!
//! Every line typed is sent to the [`Gateway`] as a shell command. Prompts
//! coming back (passwords, the vim edit surface) are answered inline. The
//! in-memory store is loaded from and saved to a JSON snapshot so the tree
//! survives between runs.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use tracing::{debug, warn};

use treesh_kernel::state::paths;
use treesh_kernel::{Gateway, GatewayReply, Identity, Kernel, MemoryStore, Prompt, Session, ShellConfig};

/// Line that saves an edit.
pub const EDIT_SAVE: &str = ".";
/// Line that abandons an edit.
pub const EDIT_CANCEL: &str = ":q!";

#[derive(Debug, Parser)]
#[command(name = "treesh")]
#[command(about = "A Unix-style shell over a tree key-value store")]
#[command(version)]
pub struct Cli {
    /// Identity to run commands as
    #[arg(long, default_value = "local@treesh")]
    pub identity: String,

    /// Config file (defaults to the XDG config dir)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Store snapshot to load and save
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Start from an empty store and don't save it
    #[arg(long)]
    pub ephemeral: bool,

    /// Run one command and exit
    #[arg(short = 'c')]
    pub command: Option<String>,
}

type LineEditor = Editor<(), DefaultHistory>;

/// Load a store snapshot, or an empty store if there is none yet.
pub fn load_snapshot(path: &Path) -> Result<MemoryStore> {
    if !path.exists() {
        debug!(path = %path.display(), "no snapshot, starting empty");
        return Ok(MemoryStore::new());
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;
    let tree = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse snapshot: {}", path.display()))?;
    Ok(MemoryStore::from_snapshot(tree))
}

/// Write the whole store to `path` as pretty JSON.
pub async fn save_snapshot(store: &MemoryStore, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(&store.snapshot().await)
        .context("Failed to serialize snapshot")?;
    std::fs::write(path, text)
        .with_context(|| format!("Failed to write snapshot: {}", path.display()))
}

/// Collect an edited file body from `lines`.
///
/// Lines up to [`EDIT_SAVE`] become the new body; saving without typing
/// anything keeps `initial`. [`EDIT_CANCEL`] or running out of input cancels.
pub fn collect_edit(lines: impl IntoIterator<Item = String>, initial: &str) -> Option<String> {
    let mut body: Vec<String> = Vec::new();
    for line in lines {
        match line.as_str() {
            EDIT_SAVE if body.is_empty() => return Some(initial.to_string()),
            EDIT_SAVE => return Some(body.join("\n")),
            EDIT_CANCEL => return None,
            _ => body.push(line),
        }
    }
    None
}

fn answer(rl: &mut LineEditor, prompt: &Prompt) -> Option<String> {
    match prompt {
        Prompt::Password { label } => rl.readline(&format!("{label} ")).ok(),
        Prompt::Edit { file, initial } => {
            println!("-- editing {file}: type the new body, '{EDIT_SAVE}' saves, '{EDIT_CANCEL}' cancels --");
            if !initial.is_empty() {
                println!("{initial}");
                println!("-- ('{EDIT_SAVE}' right away keeps the text above) --");
            }
            let lines = std::iter::from_fn(|| rl.readline("").ok());
            collect_edit(lines, initial)
        }
    }
}

fn show(reply: &GatewayReply) {
    for message in &reply.messages {
        println!("{message}");
    }
}

/// Send `line` and keep answering prompts until the command finishes.
fn drive(
    runtime: &tokio::runtime::Runtime,
    gateway: &Gateway,
    session: &mut Session,
    rl: &mut LineEditor,
    line: &str,
) -> Result<()> {
    let message = format!("{} {line}", gateway.kernel().config().command_prefix);
    let Some(mut reply) = runtime.block_on(gateway.submit(session, &message))? else {
        return Ok(());
    };
    loop {
        show(&reply);
        let Some(prompt) = reply.prompt.take() else {
            return Ok(());
        };
        let given = answer(rl, &prompt);
        reply = runtime.block_on(gateway.resume(session, given))?;
    }
}

/// Run the REPL.
pub fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ShellConfig::load_from(path)?,
        None => ShellConfig::load().context("Failed to load configuration")?,
    };
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start runtime")?;

    let snapshot = cli.snapshot.clone().unwrap_or_else(paths::snapshot_path);
    let store = Arc::new(if cli.ephemeral {
        MemoryStore::new()
    } else {
        load_snapshot(&snapshot)?
    });
    let kernel = Arc::new(Kernel::new(config, store.clone())?);
    let gateway = Gateway::new(kernel.clone());
    let mut session = kernel.open_session(Identity::verified(cli.identity.clone()));

    let mut rl: LineEditor = Editor::new().context("Failed to create editor")?;

    if let Some(command) = &cli.command {
        if let Err(e) = drive(&runtime, &gateway, &mut session, &mut rl, command) {
            eprintln!("Error: {e}");
        }
    } else {
        println!("treesh v{}", env!("CARGO_PKG_VERSION"));
        println!("Type help for commands, exit to quit.\n");

        let history_path = paths::history_path();
        let _ = rl.load_history(&history_path);

        loop {
            let prompt = format!("treesh:{}$ ", session.cwd());
            match rl.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed == "exit" || trimmed == "quit" {
                        break;
                    }
                    let _ = rl.add_history_entry(line.as_str());
                    if let Err(e) = drive(&runtime, &gateway, &mut session, &mut rl, trimmed) {
                        eprintln!("Error: {e}");
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("^D");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {err}");
                    break;
                }
            }
        }

        if let Some(parent) = history_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Err(e) = rl.save_history(&history_path) {
            warn!(error = %e, "failed to save history");
        }
    }

    if !cli.ephemeral {
        runtime.block_on(save_snapshot(&store, &snapshot))?;
    }
    Ok(())
}
