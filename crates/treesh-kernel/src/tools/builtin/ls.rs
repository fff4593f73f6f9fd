//! ls — List directory contents.

use async_trait::async_trait;

use crate::interpreter::{ExecResult, EXIT_DENIED, EXIT_FAILURE};
use crate::paths::{base_name, METADATA_DIR};
use crate::store::Node;
use crate::tools::guard::{storage_failure, unlock, Unlocked};
use crate::tools::{ExecContext, Tool, ToolArgs, ToolSchema};

/// Ls tool: one line per entry, `📄` for files and `📁` for directories.
pub struct Ls;

#[async_trait]
impl Tool for Ls {
    fn name(&self) -> &str {
        "ls"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("ls", "List files & directories").usage("[path]")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let target = args.get_string(0).unwrap_or_default();
        let path = ctx.resolve_path(&target);

        let node = match ctx.nodes.load(&path).await {
            Ok(Some(node)) => node,
            Ok(None) => {
                return ExecResult::failure(EXIT_FAILURE, format!("ls: no such file or dir: {target}"));
            }
            Err(e) => return storage_failure("ls", &e),
        };

        if ctx.metadata_blocked(&path) {
            return ExecResult::failure(EXIT_DENIED, "ls: permission denied to access metadata");
        }

        let then = Box::new(Listing {
            target: target.clone(),
            path: path.clone(),
            node,
        });
        unlock(ctx, "ls", &target, &path, then).await
    }
}

struct Listing {
    target: String,
    path: String,
    node: Node,
}

#[async_trait]
impl Unlocked for Listing {
    async fn run(self: Box<Self>, ctx: &mut ExecContext) -> ExecResult {
        let Listing { target, path, node } = *self;
        let children = match node {
            Node::File { .. } => {
                let name = if target.is_empty() {
                    base_name(&path)
                } else {
                    target.as_str()
                };
                return ExecResult::success(format!("📄 {name}"));
            }
            Node::Directory { children } => children,
        };

        let hide_metadata = path == "/" && !ctx.is_elevated();
        let lines: Vec<String> = children
            .iter()
            .filter(|(name, _)| !(hide_metadata && name.as_str() == METADATA_DIR))
            .map(|(name, child)| match child {
                Node::File { .. } => format!("📄 {name}"),
                Node::Directory { .. } => format!("📁 {name}"),
            })
            .collect();

        if lines.is_empty() {
            ExecResult::success("(empty directory)")
        } else {
            ExecResult::success(lines.join("\n"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Elevation;
    use crate::tools::builtin::testutil::{answer, args};

    async fn make_ctx() -> ExecContext {
        let ctx = ExecContext::in_memory();
        ctx.nodes.save("/docs", &Node::directory_with_sentinel()).await.unwrap();
        ctx.nodes.write_file("/docs/a.txt", "a").await.unwrap();
        ctx.nodes.write_file("/readme", "r").await.unwrap();
        ctx
    }

    #[tokio::test]
    async fn test_ls_root() {
        let mut ctx = make_ctx().await;
        let result = Ls.execute(ToolArgs::new(), &mut ctx).await;
        assert!(result.ok());
        assert_eq!(result.out, "📁 docs\n📄 readme");
    }

    #[tokio::test]
    async fn test_ls_shows_sentinel() {
        let mut ctx = make_ctx().await;
        let result = Ls.execute(args(&["docs"]), &mut ctx).await;
        assert_eq!(result.out, "📄 DONOTDELETE\n📄 a.txt");
    }

    #[tokio::test]
    async fn test_ls_file() {
        let mut ctx = make_ctx().await;
        assert_eq!(Ls.execute(args(&["/docs/a.txt"]), &mut ctx).await.out, "📄 /docs/a.txt");

        ctx.set_cwd("/readme".into());
        assert_eq!(Ls.execute(ToolArgs::new(), &mut ctx).await.out, "📄 readme");
    }

    #[tokio::test]
    async fn test_ls_empty_root() {
        let mut ctx = ExecContext::in_memory();
        assert_eq!(Ls.execute(ToolArgs::new(), &mut ctx).await.out, "(empty directory)");
    }

    #[tokio::test]
    async fn test_ls_missing() {
        let mut ctx = make_ctx().await;
        let result = Ls.execute(args(&["ghost"]), &mut ctx).await;
        assert!(!result.ok());
        assert_eq!(result.out, "ls: no such file or dir: ghost");
    }

    #[tokio::test]
    async fn test_ls_hides_and_blocks_metadata() {
        let mut ctx = make_ctx().await;
        ctx.vault.set("/docs", "pw").await.unwrap();

        assert_eq!(Ls.execute(ToolArgs::new(), &mut ctx).await.out, "📁 docs\n📄 readme");
        assert_eq!(
            Ls.execute(args(&["/__PASSWORDS__"]), &mut ctx).await.out,
            "ls: permission denied to access metadata"
        );

        ctx.set_elevation(Some(Elevation::internal()));
        assert_eq!(
            Ls.execute(ToolArgs::new(), &mut ctx).await.out,
            "📁 __PASSWORDS__\n📁 docs\n📄 readme"
        );
        assert_eq!(Ls.execute(args(&["/__PASSWORDS__"]), &mut ctx).await.out, "📄 docs");
    }

    #[tokio::test]
    async fn test_ls_protected() {
        let mut ctx = make_ctx().await;
        ctx.vault.set("/docs", "pw").await.unwrap();

        let result = Ls.execute(args(&["docs"]), &mut ctx).await;
        assert!(result.is_pending());
        let result = answer(result, Some("pw"), &mut ctx).await;
        assert_eq!(result.out, "📄 DONOTDELETE\n📄 a.txt");

        let result = Ls.execute(args(&["docs"]), &mut ctx).await;
        let result = answer(result, Some("nope"), &mut ctx).await;
        assert_eq!(result.code, EXIT_DENIED);
        assert_eq!(result.out, "ls: incorrect password");
    }
}
