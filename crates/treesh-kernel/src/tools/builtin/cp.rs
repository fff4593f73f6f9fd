//! cp — Copy files and directory trees.

use async_trait::async_trait;

use crate::interpreter::{ExecResult, EXIT_DENIED, EXIT_FAILURE, EXIT_USAGE};
use crate::paths::METADATA_DIR;
use crate::store::Node;
use crate::tools::guard::{storage_failure, unlock, Gate, Unlocked};
use crate::tools::{ExecContext, Tool, ToolArgs, ToolSchema};

/// Cp tool: copy a node wholesale, children included.
///
/// Password entries stay behind, so the copy is unprotected. Both the source
/// and an already protected destination are password-gated.
pub struct Cp;

#[async_trait]
impl Tool for Cp {
    fn name(&self) -> &str {
        "cp"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("cp", "Copy file or dir").usage("<src> <dst>")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let (Some(src), Some(dst)) = (args.get_string(0), args.get_string(1)) else {
            return ExecResult::failure(EXIT_USAGE, "cp: missing operand");
        };
        let from = ctx.resolve_path(&src);
        let to = ctx.resolve_path(&dst);

        if ctx.metadata_blocked(&from) || ctx.metadata_blocked(&to) {
            return ExecResult::failure(EXIT_DENIED, "cp: permission denied to access metadata");
        }
        if to == "/" {
            return ExecResult::failure(EXIT_DENIED, "cp: cannot overwrite root directory");
        }

        let mut node = match ctx.nodes.load(&from).await {
            Ok(Some(node)) => node,
            Ok(None) => {
                return ExecResult::failure(EXIT_FAILURE, format!("cp: no such file or dir: {src}"));
            }
            Err(e) => return storage_failure("cp", &e),
        };
        match ctx.nodes.file_ancestor(&to).await {
            Ok(Some(ancestor)) => {
                return ExecResult::failure(EXIT_FAILURE, format!("cp: not a directory: {ancestor}"));
            }
            Ok(None) => {}
            Err(e) => return storage_failure("cp", &e),
        }
        if from == "/" {
            if let Node::Directory { children } = &mut node {
                children.remove(METADATA_DIR);
            }
        }

        let copy = Box::new(Duplicate {
            src: src.clone(),
            dst: dst.clone(),
            to: to.clone(),
            node,
        });
        unlock(ctx, "cp", &src, &from, Gate::new("cp", &dst, &to, copy)).await
    }
}

struct Duplicate {
    src: String,
    dst: String,
    to: String,
    node: Node,
}

#[async_trait]
impl Unlocked for Duplicate {
    async fn run(self: Box<Self>, ctx: &mut ExecContext) -> ExecResult {
        if let Err(e) = ctx.nodes.save(&self.to, &self.node).await {
            return storage_failure("cp", &e);
        }
        ExecResult::success(format!("Copied '{}' to '{}'", self.src, self.dst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Elevation;
    use crate::tools::builtin::testutil::{answer, args};

    async fn make_ctx() -> ExecContext {
        let ctx = ExecContext::in_memory();
        ctx.nodes.save("/src", &Node::directory_with_sentinel()).await.unwrap();
        ctx.nodes.write_file("/src/a.txt", "alpha").await.unwrap();
        ctx.nodes.write_file("/note", "n").await.unwrap();
        ctx
    }

    #[tokio::test]
    async fn test_cp_file() {
        let mut ctx = make_ctx().await;
        let result = Cp.execute(args(&["note", "copy"]), &mut ctx).await;
        assert_eq!(result.out, "Copied 'note' to 'copy'");
        assert_eq!(ctx.nodes.load("/copy").await.unwrap(), Some(Node::file("n")));
        assert!(ctx.nodes.load("/note").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_cp_tree() {
        let mut ctx = make_ctx().await;
        Cp.execute(args(&["/src", "/dst"]), &mut ctx).await;
        assert_eq!(ctx.nodes.load("/dst/a.txt").await.unwrap(), Some(Node::file("alpha")));
        assert_eq!(ctx.nodes.load("/dst").await.unwrap(), ctx.nodes.load("/src").await.unwrap());
    }

    #[tokio::test]
    async fn test_cp_does_not_copy_password() {
        let mut ctx = make_ctx().await;
        ctx.vault.set("/note", "pw").await.unwrap();

        let result = Cp.execute(args(&["note", "copy"]), &mut ctx).await;
        let result = answer(result, Some("pw"), &mut ctx).await;
        assert_eq!(result.out, "Copied 'note' to 'copy'");
        assert_eq!(ctx.vault.lookup("/copy").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_cp_protected_destination() {
        let mut ctx = make_ctx().await;
        ctx.nodes.write_file("/locked", "secret").await.unwrap();
        ctx.vault.set("/locked", "pw").await.unwrap();

        let result = Cp.execute(args(&["note", "locked"]), &mut ctx).await;
        let result = answer(result, Some("nope"), &mut ctx).await;
        assert_eq!(result.out, "cp: incorrect password");
        assert_eq!(ctx.nodes.load("/locked").await.unwrap(), Some(Node::file("secret")));
    }

    #[tokio::test]
    async fn test_cp_errors() {
        let mut ctx = make_ctx().await;
        assert_eq!(Cp.execute(args(&["only"]), &mut ctx).await.out, "cp: missing operand");
        assert_eq!(
            Cp.execute(args(&["ghost", "x"]), &mut ctx).await.out,
            "cp: no such file or dir: ghost"
        );
        assert_eq!(
            Cp.execute(args(&["note", "/"]), &mut ctx).await.out,
            "cp: cannot overwrite root directory"
        );
        assert_eq!(
            Cp.execute(args(&["/__PASSWORDS__", "x"]), &mut ctx).await.out,
            "cp: permission denied to access metadata"
        );
    }

    #[tokio::test]
    async fn test_cp_root_leaves_metadata_behind() {
        let mut ctx = make_ctx().await;
        ctx.vault.set("/note", "pw").await.unwrap();
        ctx.set_elevation(Some(Elevation::internal()));

        Cp.execute(args(&["/", "/backup"]), &mut ctx).await;
        assert!(ctx.nodes.load("/backup/note").await.unwrap().is_some());
        assert_eq!(ctx.nodes.load("/backup/__PASSWORDS__").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_cp_refuses_to_write_beneath_file() {
        let mut ctx = make_ctx().await;
        ctx.nodes.write_file("/locked", "secret").await.unwrap();
        ctx.vault.set("/locked", "pw").await.unwrap();

        let result = Cp.execute(args(&["note", "locked/child"]), &mut ctx).await;
        assert!(!result.is_pending());
        assert_eq!(result.out, "cp: not a directory: /locked");
        assert_eq!(ctx.nodes.load("/locked").await.unwrap(), Some(Node::file("secret")));

        let result = Cp.execute(args(&["note", "locked/a/b"]), &mut ctx).await;
        assert_eq!(result.out, "cp: not a directory: /locked");
    }
}
