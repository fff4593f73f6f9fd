//! cat — Show file contents.

use async_trait::async_trait;

use crate::interpreter::{ExecResult, EXIT_DENIED, EXIT_FAILURE, EXIT_USAGE};
use crate::store::Node;
use crate::tools::guard::{storage_failure, unlock, Unlocked};
use crate::tools::{ExecContext, Tool, ToolArgs, ToolSchema};

/// Cat tool: print a file, or forward piped input.
pub struct Cat;

#[async_trait]
impl Tool for Cat {
    fn name(&self) -> &str {
        "cat"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("cat", "Show file contents").usage("<file>")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        // Only reads storage at the head of a pipeline.
        if !ctx.stdin.is_empty() {
            return ExecResult::success(std::mem::take(&mut ctx.stdin));
        }

        let Some(target) = args.get_string(0) else {
            return ExecResult::failure(EXIT_USAGE, "cat: missing operand");
        };
        let path = ctx.resolve_path(&target);

        let node = match ctx.nodes.load(&path).await {
            Ok(Some(node)) => node,
            Ok(None) => return ExecResult::failure(EXIT_FAILURE, format!("cat: no such file: {target}")),
            Err(e) => return storage_failure("cat", &e),
        };

        if ctx.metadata_blocked(&path) {
            return ExecResult::failure(EXIT_DENIED, "cat: permission denied to access metadata");
        }

        let then = Box::new(Print {
            target: target.clone(),
            node,
        });
        unlock(ctx, "cat", &target, &path, then).await
    }
}

struct Print {
    target: String,
    node: Node,
}

#[async_trait]
impl Unlocked for Print {
    async fn run(self: Box<Self>, _ctx: &mut ExecContext) -> ExecResult {
        let Print { target, node } = *self;
        match node {
            Node::File { content } => ExecResult::success(content),
            Node::Directory { .. } => {
                ExecResult::failure(EXIT_FAILURE, format!("cat: is a directory: {target}"))
            }
        }
    }
}
