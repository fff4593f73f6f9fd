//! cd — Change working directory.

use async_trait::async_trait;
use tracing::info;

use crate::interpreter::{ExecResult, EXIT_DENIED, EXIT_FAILURE, EXIT_USAGE};
use crate::store::Node;
use crate::tools::guard::{storage_failure, unlock, Unlocked};
use crate::tools::{ExecContext, Tool, ToolArgs, ToolSchema};

/// Cd tool: change current working directory.
///
/// Only touches the context; the kernel persists the new directory for the
/// session once the stage finishes.
pub struct Cd;

#[async_trait]
impl Tool for Cd {
    fn name(&self) -> &str {
        "cd"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("cd", "Change directory").usage("<dir>")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let Some(target) = args.get_string(0) else {
            return ExecResult::failure(EXIT_USAGE, "cd: missing operand");
        };
        let path = ctx.resolve_path(&target);

        match ctx.nodes.load(&path).await {
            Ok(Some(Node::Directory { .. })) => {}
            Ok(Some(Node::File { .. })) => {
                return ExecResult::failure(EXIT_FAILURE, format!("cd: not a directory: {target}"));
            }
            Ok(None) => {
                return ExecResult::failure(EXIT_FAILURE, format!("cd: no such file or dir: {target}"));
            }
            Err(e) => return storage_failure("cd", &e),
        }

        if ctx.metadata_blocked(&path) {
            return ExecResult::failure(EXIT_DENIED, "cd: permission denied to access metadata");
        }

        let then = Box::new(Enter {
            target: target.clone(),
            path: path.clone(),
        });
        unlock(ctx, "cd", &target, &path, then).await
    }
}

struct Enter {
    target: String,
    path: String,
}

#[async_trait]
impl Unlocked for Enter {
    async fn run(self: Box<Self>, ctx: &mut ExecContext) -> ExecResult {
        let Enter { target, path } = *self;
        info!(from = %ctx.cwd, to = %path, "cd");
        ctx.set_cwd(path);
        ExecResult::success(format!("Changed directory to '{target}'"))
    }
}
