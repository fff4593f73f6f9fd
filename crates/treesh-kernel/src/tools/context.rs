//! Execution context for tools.

use std::sync::Arc;

use super::ToolSchema;
use crate::auth::Elevation;
use crate::moderation::BanList;
use crate::paths;
use crate::store::NodeStore;
use crate::vault::PasswordVault;

/// Execution context passed to tools.
///
/// Built fresh for every stage from the session. Tools change the working
/// directory through [`ExecContext::set_cwd`]; the kernel copies it back to
/// the session afterwards.
pub struct ExecContext {
    /// Filesystem view of the store.
    pub nodes: Arc<NodeStore>,
    pub vault: PasswordVault,
    pub bans: BanList,
    /// Current working directory (absolute shell path).
    pub cwd: String,
    /// Output of the previous stage.
    pub stdin: String,
    /// Everything registered, for `help`.
    pub tool_schemas: Vec<ToolSchema>,
    /// Keyword that elevates a stage, for `help`.
    pub elevate_keyword: String,
    elevation: Option<Elevation>,
}

impl ExecContext {
    pub fn new(nodes: Arc<NodeStore>, vault: PasswordVault, bans: BanList) -> Self {
        Self {
            nodes,
            vault,
            bans,
            cwd: "/".to_string(),
            stdin: String::new(),
            tool_schemas: Vec::new(),
            elevate_keyword: "sudo".to_string(),
            elevation: None,
        }
    }

    /// Resolve a path relative to cwd.
    pub fn resolve_path(&self, path: &str) -> String {
        paths::resolve(path, &self.cwd)
    }

    /// Change the current working directory.
    pub fn set_cwd(&mut self, path: String) {
        self.cwd = path;
    }

    pub fn elevation(&self) -> Option<&Elevation> {
        self.elevation.as_ref()
    }

    pub fn is_elevated(&self) -> bool {
        self.elevation.is_some()
    }

    pub fn set_elevation(&mut self, elevation: Option<Elevation>) {
        self.elevation = elevation;
    }

    /// Metadata paths are off limits without elevation.
    pub fn metadata_blocked(&self, path: &str) -> bool {
        !self.is_elevated() && paths::is_metadata(path)
    }

    /// Context over a fresh in-memory store, for tests.
    #[cfg(test)]
    pub(crate) fn in_memory() -> Self {
        use crate::store::MemoryStore;

        let store: Arc<dyn crate::store::TreeStore> = Arc::new(MemoryStore::new());
        let nodes = Arc::new(NodeStore::new(store.clone(), "shellFS"));
        let vault = PasswordVault::new(nodes.clone());
        let bans = BanList::new(store, "ban");
        Self::new(nodes, vault, bans)
    }
}
