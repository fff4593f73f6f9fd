//! file — Report whether a path is a file or a directory.

use async_trait::async_trait;

use crate::interpreter::{ExecResult, EXIT_DENIED, EXIT_FAILURE, EXIT_USAGE};
use crate::tools::guard::{storage_failure, unlock, Unlocked};
use crate::tools::{ExecContext, Tool, ToolArgs, ToolSchema};

pub struct File;

#[async_trait]
impl Tool for File {
    fn name(&self) -> &str {
        "file"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("file", "File or directory?").usage("<path>")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let Some(target) = args.get_string(0) else {
            return ExecResult::failure(EXIT_USAGE, "file: missing operand");
        };
        let path = ctx.resolve_path(&target);

        let is_dir = match ctx.nodes.load(&path).await {
            Ok(Some(node)) => node.is_dir(),
            Ok(None) => {
                return ExecResult::failure(EXIT_FAILURE, format!("file: no such file or dir: {target}"));
            }
            Err(e) => return storage_failure("file", &e),
        };

        if ctx.metadata_blocked(&path) {
            return ExecResult::failure(EXIT_DENIED, "file: permission denied to access metadata");
        }

        let then = Box::new(Describe {
            target: target.clone(),
            is_dir,
        });
        unlock(ctx, "file", &target, &path, then).await
    }
}

struct Describe {
    target: String,
    is_dir: bool,
}

#[async_trait]
impl Unlocked for Describe {
    async fn run(self: Box<Self>, _ctx: &mut ExecContext) -> ExecResult {
        if self.is_dir {
            ExecResult::success(format!("📁 '{}' is a directory", self.target))
        } else {
            ExecResult::success(format!("📄 '{}' is a file", self.target))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Node;
    use crate::tools::builtin::testutil::{answer, args};

    async fn make_ctx() -> ExecContext {
        let ctx = ExecContext::in_memory();
        ctx.nodes.save("/dir", &Node::directory_with_sentinel()).await.unwrap();
        ctx.nodes.write_file("/dir/f", "x").await.unwrap();
        ctx
    }

    #[tokio::test]
    async fn test_file_kinds() {
        let mut ctx = make_ctx().await;
        assert_eq!(
            File.execute(args(&["dir"]), &mut ctx).await.out,
            "📁 'dir' is a directory"
        );
        assert_eq!(
            File.execute(args(&["dir/f"]), &mut ctx).await.out,
            "📄 'dir/f' is a file"
        );
        assert_eq!(
            File.execute(args(&["/"]), &mut ctx).await.out,
            "📁 '/' is a directory"
        );
    }

    #[tokio::test]
    async fn test_file_errors() {
        let mut ctx = make_ctx().await;
        assert_eq!(File.execute(ToolArgs::new(), &mut ctx).await.out, "file: missing operand");
        assert_eq!(
            File.execute(args(&["nope"]), &mut ctx).await.out,
            "file: no such file or dir: nope"
        );
    }

    #[tokio::test]
    async fn test_file_protected() {
        let mut ctx = make_ctx().await;
        ctx.vault.set("/dir/f", "pw").await.unwrap();

        let result = File.execute(args(&["dir/f"]), &mut ctx).await;
        let result = answer(result, Some("wrong"), &mut ctx).await;
        assert_eq!(result.out, "file: incorrect password");
    }
}
