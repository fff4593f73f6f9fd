//! mkdir — Create directories.

use async_trait::async_trait;

use crate::interpreter::{ExecResult, EXIT_DENIED, EXIT_FAILURE, EXIT_USAGE};
use crate::paths::split_parent;
use crate::store::Node;
use crate::tools::guard::{capture_password, storage_failure, Unlocked};
use crate::tools::{ExecContext, Tool, ToolArgs, ToolSchema};

/// Mkdir tool: create one directory under an existing parent.
///
/// New directories hold a sentinel child so the store keeps them as
/// mappings. `-s` asks for a password first (skipped when elevated).
pub struct Mkdir;

#[async_trait]
impl Tool for Mkdir {
    fn name(&self) -> &str {
        "mkdir"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("mkdir", "Make dir; -s password-protected").usage("[-s] <dir>")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let (protect, target) = args.leading_flag("-s");
        let Some(target) = target else {
            return ExecResult::failure(EXIT_USAGE, "mkdir: missing operand");
        };
        let path = ctx.resolve_path(&target);
        let (parent, name) = split_parent(&path);

        if ctx.metadata_blocked(&path) {
            return ExecResult::failure(EXIT_DENIED, "mkdir: permission denied to access metadata");
        }
        if name.is_empty() {
            return ExecResult::failure(EXIT_FAILURE, format!("mkdir: name in use: {target}"));
        }

        match ctx.nodes.load(parent).await {
            Ok(Some(Node::Directory { children })) => {
                if children.contains_key(name) {
                    return ExecResult::failure(EXIT_FAILURE, format!("mkdir: name in use: {target}"));
                }
            }
            Ok(Some(Node::File { .. })) => {
                return ExecResult::failure(
                    EXIT_FAILURE,
                    format!("mkdir: parent is not a directory: {target}"),
                );
            }
            Ok(None) => {
                return ExecResult::failure(EXIT_FAILURE, format!("mkdir: parent not found: {target}"));
            }
            Err(e) => return storage_failure("mkdir", &e),
        }

        let protected = protect && !ctx.is_elevated();
        let create = Box::new(Create {
            target: target.clone(),
            parent: parent.to_string(),
            name: name.to_string(),
            protected,
        });
        if protected {
            capture_password("mkdir", &target, &path, create)
        } else {
            create.run(ctx).await
        }
    }
}

struct Create {
    target: String,
    parent: String,
    name: String,
    protected: bool,
}

#[async_trait]
impl Unlocked for Create {
    async fn run(self: Box<Self>, ctx: &mut ExecContext) -> ExecResult {
        let node = Node::directory_with_sentinel();
        if let Err(e) = ctx.nodes.insert_child(&self.parent, &self.name, &node).await {
            return storage_failure("mkdir", &e);
        }
        let suffix = if self.protected { " (password-protected)" } else { "" };
        ExecResult::success(format!("Directory '{}' created{suffix}", self.target))
    }
}
