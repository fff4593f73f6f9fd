//! rm — Remove files and directories.

use async_trait::async_trait;
use tracing::debug;

use crate::interpreter::{ExecResult, EXIT_DENIED, EXIT_FAILURE, EXIT_USAGE};
use crate::paths::{base_name, is_metadata};
use crate::store::{Node, StoreResult, SENTINEL_NAME};
use crate::tools::guard::{storage_failure, unlock, Unlocked};
use crate::tools::{ExecContext, Tool, ToolArgs, ToolSchema};

/// Rm tool: remove a file, or a directory with `-r`.
///
/// A directory counts as empty only when it has no children at all, and the
/// sentinel is a child, so every directory made by `mkdir` needs `-r`.
pub struct Rm;

#[async_trait]
impl Tool for Rm {
    fn name(&self) -> &str {
        "rm"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("rm", "Remove; -r recursive").usage("[-r] <path>")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let recursive = args.has_flag("-r");
        let Some(target) = args.first_except("-r") else {
            return ExecResult::failure(EXIT_USAGE, "rm: missing operand");
        };
        let path = ctx.resolve_path(&target);

        let node = match ctx.nodes.load(&path).await {
            Ok(Some(node)) => node,
            Ok(None) => {
                return ExecResult::failure(EXIT_FAILURE, format!("rm: no such file or dir: {target}"));
            }
            Err(e) => return storage_failure("rm", &e),
        };

        if base_name(&path) == SENTINEL_NAME && !ctx.is_elevated() {
            return ExecResult::failure(EXIT_DENIED, "rm: permission denied to remove placeholder");
        }
        if is_metadata(&path) {
            return ExecResult::failure(
                EXIT_DENIED,
                "rm: permission denied to remove password metadata",
            );
        }
        if path == "/" {
            return ExecResult::failure(EXIT_DENIED, "rm: cannot remove root directory");
        }

        let then = Box::new(Remove {
            target: target.clone(),
            path: path.clone(),
            node,
            recursive,
        });
        unlock(ctx, "rm", &target, &path, then).await
    }
}

struct Remove {
    target: String,
    path: String,
    node: Node,
    recursive: bool,
}

#[async_trait]
impl Unlocked for Remove {
    async fn run(self: Box<Self>, ctx: &mut ExecContext) -> ExecResult {
        let Remove {
            target,
            path,
            node,
            recursive,
        } = *self;

        if let Node::Directory { children } = &node {
            if !recursive && !children.is_empty() {
                return ExecResult::failure(EXIT_FAILURE, "rm: directory not empty (use -r)");
            }
        }

        let removed = if recursive {
            purge(ctx, &path).await
        } else {
            remove_one(ctx, &path).await
        };
        if let Err(e) = removed {
            return storage_failure("rm", &e);
        }

        if node.is_dir() {
            ExecResult::success(format!("Removed directory '{target}'"))
        } else {
            ExecResult::success(format!("Removed file '{target}'"))
        }
    }
}

async fn remove_one(ctx: &ExecContext, path: &str) -> StoreResult<()> {
    ctx.nodes.delete(path).await?;
    ctx.vault.remove(path).await
}

/// Remove `path`, everything under it, and every password entry in that range.
///
/// The subtree goes in one delete and the password table is read once, so
/// the cost doesn't grow with the number of descendants.
pub(super) async fn purge(ctx: &ExecContext, path: &str) -> StoreResult<()> {
    let protected = ctx.vault.protected_under(path).await?;
    debug!(path, entries = protected.len(), "purging subtree");
    for entry in &protected {
        ctx.vault.remove(entry).await?;
    }
    ctx.nodes.delete(path).await
}
