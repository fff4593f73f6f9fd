//! vim — Edit a file through the front end's edit surface.

use async_trait::async_trait;
use tracing::debug;

use crate::interpreter::{ExecResult, Prompt, EXIT_CANCELLED, EXIT_DENIED, EXIT_FAILURE, EXIT_USAGE};
use crate::paths::split_parent;
use crate::store::Node;
use crate::tools::guard::{capture_password, storage_failure, unlock, Unlocked};
use crate::tools::{Continuation, ExecContext, Tool, ToolArgs, ToolSchema};

/// Vim tool: open a file (new or existing) for editing.
///
/// The current content is written back before the edit prompt goes out, so
/// a new path exists as an empty file even if the edit is cancelled.
pub struct Vim;

#[async_trait]
impl Tool for Vim {
    fn name(&self) -> &str {
        "vim"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("vim", "Edit file; -s password-protected").usage("[-s] <file>")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let (protect, target) = args.leading_flag("-s");
        let Some(target) = target else {
            return ExecResult::failure(EXIT_USAGE, "vim: missing operand");
        };
        let path = ctx.resolve_path(&target);

        if ctx.metadata_blocked(&path) {
            return ExecResult::failure(EXIT_DENIED, "vim: permission denied to access metadata");
        }

        let initial = match ctx.nodes.load(&path).await {
            Ok(Some(Node::File { content })) => content,
            Ok(Some(Node::Directory { .. })) => {
                return ExecResult::failure(
                    EXIT_FAILURE,
                    format!("vim: cannot edit directory: {target}"),
                );
            }
            Ok(None) => {
                let (parent, _) = split_parent(&path);
                match ctx.nodes.load(parent).await {
                    Ok(Some(Node::Directory { .. })) => String::new(),
                    Ok(Some(Node::File { .. })) => {
                        return ExecResult::failure(
                            EXIT_FAILURE,
                            format!("vim: parent is not a directory: {target}"),
                        );
                    }
                    Ok(None) => {
                        return ExecResult::failure(
                            EXIT_FAILURE,
                            format!("vim: parent not found: {target}"),
                        );
                    }
                    Err(e) => return storage_failure("vim", &e),
                }
            }
            Err(e) => return storage_failure("vim", &e),
        };

        let then = Box::new(Setup {
            target: target.clone(),
            path: path.clone(),
            protect,
            initial,
        });
        unlock(ctx, "vim", &target, &path, then).await
    }
}

struct Setup {
    target: String,
    path: String,
    protect: bool,
    initial: String,
}

#[async_trait]
impl Unlocked for Setup {
    async fn run(self: Box<Self>, ctx: &mut ExecContext) -> ExecResult {
        let Setup {
            target,
            path,
            protect,
            initial,
        } = *self;
        let open = Box::new(OpenEditor {
            target: target.clone(),
            path: path.clone(),
            initial,
        });
        if protect && !ctx.is_elevated() {
            capture_password("vim", &target, &path, open)
        } else {
            open.run(ctx).await
        }
    }
}

struct OpenEditor {
    target: String,
    path: String,
    initial: String,
}

#[async_trait]
impl Unlocked for OpenEditor {
    async fn run(self: Box<Self>, ctx: &mut ExecContext) -> ExecResult {
        let OpenEditor {
            target,
            path,
            initial,
        } = *self;
        if let Err(e) = ctx.nodes.write_file(&path, &initial).await {
            return storage_failure("vim", &e);
        }
        debug!(path = %path, "edit surface opened");
        ExecResult::awaiting(
            Prompt::Edit {
                file: target.clone(),
                initial,
            },
            Box::new(SaveEdit { target, path }),
        )
    }
}

struct SaveEdit {
    target: String,
    path: String,
}

#[async_trait]
impl Continuation for SaveEdit {
    async fn resume(self: Box<Self>, answer: Option<String>, ctx: &mut ExecContext) -> ExecResult {
        let Some(text) = answer else {
            return ExecResult::failure(EXIT_CANCELLED, "vim: editing canceled");
        };
        if let Err(e) = ctx.nodes.write_file(&self.path, &text).await {
            return storage_failure("vim", &e);
        }
        ExecResult::success(format!("File '{}' saved.", self.target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Elevation;
    use crate::tools::builtin::testutil::{answer, args};

    fn edit_prompt(result: &ExecResult) -> Option<Prompt> {
        result.pending.as_ref().map(|p| p.prompt.clone())
    }

    #[tokio::test]
    async fn test_vim_new_file() {
        let mut ctx = ExecContext::in_memory();
        let result = Vim.execute(args(&["notes.txt"]), &mut ctx).await;
        assert_eq!(
            edit_prompt(&result),
            Some(Prompt::Edit {
                file: "notes.txt".into(),
                initial: String::new()
            })
        );
        assert_eq!(ctx.nodes.load("/notes.txt").await.unwrap(), Some(Node::file("")));

        let result = answer(result, Some("line one\nline two"), &mut ctx).await;
        assert_eq!(result.out, "File 'notes.txt' saved.");
        assert_eq!(
            ctx.nodes.load("/notes.txt").await.unwrap(),
            Some(Node::file("line one\nline two"))
        );
    }

    #[tokio::test]
    async fn test_vim_existing_file_seeds_content() {
        let mut ctx = ExecContext::in_memory();
        ctx.nodes.write_file("/a", "before").await.unwrap();
        let result = Vim.execute(args(&["a"]), &mut ctx).await;
        assert_eq!(
            edit_prompt(&result),
            Some(Prompt::Edit {
                file: "a".into(),
                initial: "before".into()
            })
        );
    }

    #[tokio::test]
    async fn test_vim_cancel_leaves_placeholder() {
        let mut ctx = ExecContext::in_memory();
        let result = Vim.execute(args(&["draft"]), &mut ctx).await;
        let result = answer(result, None, &mut ctx).await;
        assert_eq!(result.code, EXIT_CANCELLED);
        assert_eq!(result.out, "vim: editing canceled");
        assert_eq!(ctx.nodes.load("/draft").await.unwrap(), Some(Node::file("")));
    }

    #[tokio::test]
    async fn test_vim_refusals() {
        let mut ctx = ExecContext::in_memory();
        ctx.nodes.save("/dir", &Node::directory_with_sentinel()).await.unwrap();
        ctx.nodes.write_file("/f", "x").await.unwrap();

        assert_eq!(Vim.execute(ToolArgs::new(), &mut ctx).await.out, "vim: missing operand");
        assert_eq!(
            Vim.execute(args(&["dir"]), &mut ctx).await.out,
            "vim: cannot edit directory: dir"
        );
        assert_eq!(
            Vim.execute(args(&["f/child"]), &mut ctx).await.out,
            "vim: parent is not a directory: f/child"
        );
        assert_eq!(
            Vim.execute(args(&["nowhere/child"]), &mut ctx).await.out,
            "vim: parent not found: nowhere/child"
        );
        assert_eq!(
            Vim.execute(args(&["/__PASSWORDS__/x"]), &mut ctx).await.out,
            "vim: permission denied to access metadata"
        );
    }

    #[tokio::test]
    async fn test_vim_protected_needs_password() {
        let mut ctx = ExecContext::in_memory();
        ctx.nodes.write_file("/secret", "s").await.unwrap();
        ctx.vault.set("/secret", "pw").await.unwrap();

        let result = Vim.execute(args(&["secret"]), &mut ctx).await;
        let denied = answer(result, Some("bad"), &mut ctx).await;
        assert_eq!(denied.out, "vim: incorrect password");

        let result = Vim.execute(args(&["secret"]), &mut ctx).await;
        let result = answer(result, Some("pw"), &mut ctx).await;
        assert!(matches!(edit_prompt(&result), Some(Prompt::Edit { .. })));
    }

    #[tokio::test]
    async fn test_vim_sets_password() {
        let mut ctx = ExecContext::in_memory();
        let result = Vim.execute(args(&["-s", "diary"]), &mut ctx).await;
        let result = answer(result, Some("pw"), &mut ctx).await;
        let result = answer(result, Some("pw"), &mut ctx).await;
        let result = answer(result, Some("dear diary"), &mut ctx).await;

        assert_eq!(result.out, "File 'diary' saved.");
        assert_eq!(ctx.vault.lookup("/diary").await.unwrap().as_deref(), Some("pw"));
    }

    #[tokio::test]
    async fn test_vim_password_mismatch_aborts_before_write() {
        let mut ctx = ExecContext::in_memory();
        let result = Vim.execute(args(&["-s", "diary"]), &mut ctx).await;
        let result = answer(result, Some("one"), &mut ctx).await;
        let result = answer(result, Some("two"), &mut ctx).await;

        assert_eq!(result.out, "vim: passwords do not match");
        assert_eq!(ctx.nodes.load("/diary").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_vim_elevated_skips_both_prompts() {
        let mut ctx = ExecContext::in_memory();
        ctx.nodes.write_file("/secret", "s").await.unwrap();
        ctx.vault.set("/secret", "pw").await.unwrap();
        ctx.set_elevation(Some(Elevation::internal()));

        let result = Vim.execute(args(&["-s", "secret"]), &mut ctx).await;
        assert!(matches!(edit_prompt(&result), Some(Prompt::Edit { .. })));
        assert_eq!(ctx.vault.lookup("/secret").await.unwrap().as_deref(), Some("pw"));
    }
}
