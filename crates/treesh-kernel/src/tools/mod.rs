//! Tools: the builtin commands and what they run against.

mod builtin;
mod context;
pub(crate) mod guard;
mod registry;
mod traits;

pub use builtin::register_builtins;
pub use context::ExecContext;
pub use registry::ToolRegistry;
pub use traits::{Continuation, Tool, ToolArgs, ToolSchema};
