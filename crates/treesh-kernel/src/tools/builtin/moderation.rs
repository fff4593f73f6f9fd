//! ban, unban, listbanned — Ban list maintenance.
//!
//! All three refuse to run on a stage without elevation.

use async_trait::async_trait;
use tracing::warn;

use crate::interpreter::{ExecResult, EXIT_DENIED, EXIT_FAILURE, EXIT_USAGE};
use crate::moderation::BanError;
use crate::tools::guard::storage_failure;
use crate::tools::{ExecContext, Tool, ToolArgs, ToolSchema};

fn refused(cmd: &str) -> ExecResult {
    warn!(cmd, "moderation command without elevation");
    ExecResult::failure(EXIT_DENIED, format!("{cmd}: permission denied"))
}

fn ban_failure(cmd: &str, identity: &str, err: BanError) -> ExecResult {
    match err {
        BanError::Key(e) => {
            ExecResult::failure(EXIT_USAGE, format!("{cmd}: invalid identity '{identity}': {e}"))
        }
        BanError::Store(e) => storage_failure(cmd, &e),
    }
}

/// Ban tool: flag an identity as banned.
pub struct Ban;

#[async_trait]
impl Tool for Ban {
    fn name(&self) -> &str {
        "ban"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("ban", "Ban a user").usage("<id>").elevated()
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        if !ctx.is_elevated() {
            return refused("ban");
        }
        let Some(identity) = args.get_string(0) else {
            return ExecResult::failure(EXIT_USAGE, "ban: missing operand");
        };
        match ctx.bans.ban(&identity).await {
            Ok(()) => ExecResult::success(format!("Banned '{identity}'")),
            Err(e) => ban_failure("ban", &identity, e),
        }
    }
}

/// Unban tool: clear an identity's ban.
pub struct Unban;

#[async_trait]
impl Tool for Unban {
    fn name(&self) -> &str {
        "unban"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("unban", "Unban a user").usage("<id>").elevated()
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        if !ctx.is_elevated() {
            return refused("unban");
        }
        let Some(identity) = args.get_string(0) else {
            return ExecResult::failure(EXIT_USAGE, "unban: missing operand");
        };
        match ctx.bans.unban(&identity).await {
            Ok(()) => ExecResult::success(format!("Unbanned '{identity}'")),
            Err(e) => ban_failure("unban", &identity, e),
        }
    }
}

/// ListBanned tool: one banned identity per line.
pub struct ListBanned;

#[async_trait]
impl Tool for ListBanned {
    fn name(&self) -> &str {
        "listbanned"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("listbanned", "List banned users").elevated()
    }

    async fn execute(&self, _args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        if !ctx.is_elevated() {
            return refused("listbanned");
        }
        match ctx.bans.list().await {
            Ok(banned) if banned.is_empty() => ExecResult::success("(no banned users)"),
            Ok(banned) => ExecResult::success(banned.join("\n")),
            Err(BanError::Store(e)) => storage_failure("listbanned", &e),
            Err(e) => ExecResult::failure(EXIT_FAILURE, format!("listbanned: {e}")),
        }
    }
}
