//! help — List the commands.

use async_trait::async_trait;

use crate::interpreter::ExecResult;
use crate::tools::{ExecContext, Tool, ToolArgs, ToolSchema};

pub struct Help;

#[async_trait]
impl Tool for Help {
    fn name(&self) -> &str {
        "help"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("help", "Show this help (also -h)")
    }

    async fn execute(&self, _args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let mut out = String::from("Available commands:\n");
        for schema in &ctx.tool_schemas {
            let mut line = schema.name.clone();
            if schema.elevated {
                line = format!("{} {line}", ctx.elevate_keyword);
            }
            if !schema.usage.is_empty() {
                line.push(' ');
                line.push_str(&schema.usage);
            }
            out.push_str(&format!("  {line:<20} {}\n", schema.description));
        }
        out.push_str("\nSupports piping (|) & redirect (>) like Unix.");
        ExecResult::success(out)
    }
}
