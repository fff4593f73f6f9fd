//! treesh-kernel: a small Unix-style shell over a remote tree store.
//!
//! This crate provides:
//!
//! - **Paths**: resolving shell paths and escaping them into store keys
//! - **Store**: the tree store boundary, an in-memory store, and typed nodes
//! - **Vault**: per-path passwords kept in a metadata subtree
//! - **Tools**: the builtin commands (`ls`, `cd`, `mkdir`, `rm`, `cp`, `mv`, ...)
//! - **Kernel**: pipeline dispatch with `|` and `> target`
//! - **Gateway**: chat-message handling, bans, and the elevation challenge

pub mod auth;
pub mod config;
pub mod gateway;
pub mod interpreter;
pub mod kernel;
pub mod moderation;
pub mod paths;
pub mod state;
pub mod store;
pub mod tools;
pub mod vault;

pub use auth::{Elevation, Identity, SudoGuard};
pub use config::ShellConfig;
pub use gateway::{Gateway, GatewayReply};
pub use interpreter::{ExecResult, Prompt};
pub use kernel::{Kernel, Reply, ShellError};
pub use state::Session;
pub use store::{MemoryStore, TreeStore};
