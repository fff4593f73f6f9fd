//! ExecResult — the structured result of every pipeline stage.
//!
//! A stage either finishes with text, or stops to ask the user something
//! (a password, an edited file body). In the second case it carries a
//! [`Pending`] holding the question and what to do with the answer; the
//! kernel parks the rest of the pipeline until the answer arrives.
//!
//! Failures are text too. A failed stage's message flows into the next
//! stage like any other output, so `rm x | echo > log` records the error.

use std::fmt;

use crate::tools::Continuation;

/// Exit code for success.
pub const EXIT_OK: i64 = 0;
/// Generic failure.
pub const EXIT_FAILURE: i64 = 1;
/// Missing or malformed operands.
pub const EXIT_USAGE: i64 = 2;
/// Permission refused.
pub const EXIT_DENIED: i64 = 126;
/// Unknown command.
pub const EXIT_NOT_FOUND: i64 = 127;
/// Cancelled by the user.
pub const EXIT_CANCELLED: i64 = 130;

/// What the user is being asked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    /// A secret, one line.
    Password { label: String },
    /// A file body to edit, seeded with its current content.
    Edit { file: String, initial: String },
}

impl Prompt {
    pub fn password(label: impl Into<String>) -> Self {
        Prompt::Password {
            label: label.into(),
        }
    }
}

/// A question plus the code that consumes its answer.
pub struct Pending {
    pub prompt: Prompt,
    pub continuation: Box<dyn Continuation>,
}

impl fmt::Debug for Pending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pending")
            .field("prompt", &self.prompt)
            .finish_non_exhaustive()
    }
}

/// The result of executing a stage.
#[derive(Debug)]
pub struct ExecResult {
    /// Exit code. 0 means success.
    pub code: i64,
    /// Output text, including failure messages.
    pub out: String,
    /// Set when the stage is waiting on the user.
    pub pending: Option<Pending>,
}

impl ExecResult {
    /// Create a successful result with output.
    pub fn success(out: impl Into<String>) -> Self {
        Self {
            code: EXIT_OK,
            out: out.into(),
            pending: None,
        }
    }

    /// Create a failed result with an error message.
    pub fn failure(code: i64, out: impl Into<String>) -> Self {
        Self {
            code,
            out: out.into(),
            pending: None,
        }
    }

    /// Suspend the stage until `prompt` is answered.
    pub fn awaiting(prompt: Prompt, continuation: Box<dyn Continuation>) -> Self {
        Self {
            code: EXIT_OK,
            out: String::new(),
            pending: Some(Pending {
                prompt,
                continuation,
            }),
        }
    }

    /// True if the command succeeded (exit code 0).
    pub fn ok(&self) -> bool {
        self.code == EXIT_OK
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl Default for ExecResult {
    fn default() -> Self {
        Self::success("")
    }
}
