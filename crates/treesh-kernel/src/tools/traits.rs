//! Core tool traits and types.

use async_trait::async_trait;

use super::ExecContext;
use crate::interpreter::ExecResult;

/// A builtin command.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name as typed at the prompt.
    fn name(&self) -> &str;

    /// Usage line and description for `help`.
    fn schema(&self) -> ToolSchema;

    /// Run the tool. Never fails outright: problems come back as text.
    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult;
}

/// Resumes a stage once the user answers its prompt.
///
/// `answer` is `None` when the user cancelled.
#[async_trait]
pub trait Continuation: Send {
    async fn resume(self: Box<Self>, answer: Option<String>, ctx: &mut ExecContext) -> ExecResult;
}

/// How a tool presents itself in `help`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSchema {
    pub name: String,
    /// Arguments after the name, e.g. `[-r] <path>`.
    pub usage: String,
    pub description: String,
    /// Only meaningful with the elevate keyword.
    pub elevated: bool,
}

impl ToolSchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            usage: String::new(),
            description: description.into(),
            elevated: false,
        }
    }

    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    pub fn elevated(mut self) -> Self {
        self.elevated = true;
        self
    }
}

/// Positional arguments of a stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolArgs {
    pub positional: Vec<String>,
}

impl ToolArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_vec(positional: Vec<String>) -> Self {
        Self { positional }
    }

    pub fn get_string(&self, index: usize) -> Option<String> {
        self.positional.get(index).cloned()
    }

    /// Whether `flag` appears anywhere.
    pub fn has_flag(&self, flag: &str) -> bool {
        self.positional.iter().any(|a| a == flag)
    }

    /// First argument that isn't `flag`.
    pub fn first_except(&self, flag: &str) -> Option<String> {
        self.positional.iter().find(|a| *a != flag).cloned()
    }

    /// `(true, second)` if the first argument is `flag`, else `(false, first)`.
    pub fn leading_flag(&self, flag: &str) -> (bool, Option<String>) {
        if self.positional.first().is_some_and(|a| a == flag) {
            (true, self.get_string(1))
        } else {
            (false, self.get_string(0))
        }
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty()
    }
}
