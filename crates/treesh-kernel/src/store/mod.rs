//! Remote tree store boundary.
//!
//! The shell keeps its entire filesystem in a tree-shaped key-value store
//! that only offers get/set/update/remove plus change subscriptions. This
//! module defines that boundary, an in-memory implementation, and the typed
//! node layer the builtins work with.

mod memory;
mod node;
mod traits;
mod tree;

pub use memory::MemoryStore;
pub use node::{Node, SENTINEL_NAME, SENTINEL_VALUE};
pub use traits::{KeyPath, StoreError, StoreResult, TreeStore};
pub use tree::{NodeStore, ROOT_PASSWORD_KEY};
