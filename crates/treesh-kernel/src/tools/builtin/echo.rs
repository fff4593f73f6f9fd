//! echo — Print text, or pass input through.

use async_trait::async_trait;

use crate::interpreter::ExecResult;
use crate::tools::{ExecContext, Tool, ToolArgs, ToolSchema};

/// Echo tool: joins its arguments with spaces.
///
/// With no arguments it forwards stdin unchanged, which makes
/// `ls | echo > listing` a way to save output.
pub struct Echo;

#[async_trait]
impl Tool for Echo {
    fn name(&self) -> &str {
        "echo"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("echo", "Print text").usage("<text>")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        if args.is_empty() {
            ExecResult::success(std::mem::take(&mut ctx.stdin))
        } else {
            ExecResult::success(args.positional.join(" "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::builtin::testutil::args;

    #[tokio::test]
    async fn test_echo_joins_args() {
        let mut ctx = ExecContext::in_memory();
        let result = Echo.execute(args(&["hello", "world"]), &mut ctx).await;
        assert!(result.ok());
        assert_eq!(result.out, "hello world");
    }

    #[tokio::test]
    async fn test_echo_ignores_stdin_with_args() {
        let mut ctx = ExecContext::in_memory();
        ctx.stdin = "piped".into();
        let result = Echo.execute(args(&["own"]), &mut ctx).await;
        assert_eq!(result.out, "own");
    }

    #[tokio::test]
    async fn test_echo_passes_stdin() {
        let mut ctx = ExecContext::in_memory();
        ctx.stdin = "line one\nline two".into();
        let result = Echo.execute(ToolArgs::new(), &mut ctx).await;
        assert_eq!(result.out, "line one\nline two");
    }
}
