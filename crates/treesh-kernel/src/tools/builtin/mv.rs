//! mv — Move or rename.

use async_trait::async_trait;

use super::rm::purge;
use crate::interpreter::{ExecResult, EXIT_DENIED, EXIT_FAILURE, EXIT_USAGE};
use crate::paths::{base_name, is_within, join};
use crate::store::{Node, SENTINEL_NAME};
use crate::tools::guard::{storage_failure, unlock, Gate, Unlocked};
use crate::tools::{ExecContext, Tool, ToolArgs, ToolSchema};

/// Mv tool: write the source at its destination, then remove the source.
///
/// An existing destination directory receives the source under its own
/// name. The source is removed without a second prompt since reading it
/// was already authorized; its password entries go with it.
pub struct Mv;

#[async_trait]
impl Tool for Mv {
    fn name(&self) -> &str {
        "mv"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("mv", "Move / rename").usage("<src> <dst>")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let (Some(src), Some(dst)) = (args.get_string(0), args.get_string(1)) else {
            return ExecResult::failure(EXIT_USAGE, "mv: missing operand");
        };
        let from = ctx.resolve_path(&src);
        let to = ctx.resolve_path(&dst);

        if ctx.metadata_blocked(&from) || ctx.metadata_blocked(&to) {
            return ExecResult::failure(EXIT_DENIED, "mv: permission denied to access metadata");
        }
        if from == "/" {
            return ExecResult::failure(EXIT_DENIED, "mv: cannot move root directory");
        }
        if base_name(&from) == SENTINEL_NAME && !ctx.is_elevated() {
            return ExecResult::failure(EXIT_DENIED, "mv: permission denied to move placeholder");
        }

        let node = match ctx.nodes.load(&from).await {
            Ok(Some(node)) => node,
            Ok(None) => {
                return ExecResult::failure(EXIT_FAILURE, format!("mv: no such file or dir: {src}"));
            }
            Err(e) => return storage_failure("mv", &e),
        };

        let target = match ctx.nodes.load(&to).await {
            Ok(Some(Node::Directory { .. })) => join(&to, base_name(&from)),
            Ok(_) => to,
            Err(e) => return storage_failure("mv", &e),
        };

        if ctx.metadata_blocked(&target) {
            return ExecResult::failure(EXIT_DENIED, "mv: permission denied to access metadata");
        }
        match ctx.nodes.file_ancestor(&target).await {
            Ok(Some(ancestor)) => {
                return ExecResult::failure(EXIT_FAILURE, format!("mv: not a directory: {ancestor}"));
            }
            Ok(None) => {}
            Err(e) => return storage_failure("mv", &e),
        }
        if target == from {
            return ExecResult::failure(
                EXIT_FAILURE,
                format!("mv: '{src}' and '{dst}' are the same"),
            );
        }
        if is_within(&target, &from) {
            return ExecResult::failure(
                EXIT_FAILURE,
                format!("mv: cannot move '{src}' into itself"),
            );
        }

        let relocate = Box::new(Relocate {
            src: src.clone(),
            from: from.clone(),
            target: target.clone(),
            node,
        });
        let gate = Gate::new("mv", &dst, &target, relocate);
        unlock(ctx, "mv", &src, &from, gate).await
    }
}

struct Relocate {
    src: String,
    from: String,
    target: String,
    node: Node,
}

#[async_trait]
impl Unlocked for Relocate {
    async fn run(self: Box<Self>, ctx: &mut ExecContext) -> ExecResult {
        if let Err(e) = ctx.nodes.save(&self.target, &self.node).await {
            return storage_failure("mv", &e);
        }
        if let Err(e) = purge(ctx, &self.from).await {
            return storage_failure("mv", &e);
        }
        ExecResult::success(format!("Moved '{}' to '{}'", self.src, base_name(&self.target)))
    }
}
