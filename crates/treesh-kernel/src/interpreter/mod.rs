//! Pipeline evaluation pieces: results, prompts, and line splitting.

mod pipeline;
mod result;

pub use pipeline::{Pipeline, Stage, REDIRECT_PATTERN};
pub use result::{
    ExecResult, Pending, Prompt, EXIT_CANCELLED, EXIT_DENIED, EXIT_FAILURE, EXIT_NOT_FOUND,
    EXIT_OK, EXIT_USAGE,
};

use crate::auth::Elevation;
use crate::tools::Continuation;

/// A pipeline stopped at a prompt.
pub(crate) struct Suspended {
    pub pipeline: Pipeline,
    /// Stage waiting on the answer.
    pub index: usize,
    /// Elevation the waiting stage runs with.
    pub stage_elevation: Option<Elevation>,
    /// Elevation the caller supplied for the whole line.
    pub elevation: Option<Elevation>,
    pub continuation: Box<dyn Continuation>,
}
