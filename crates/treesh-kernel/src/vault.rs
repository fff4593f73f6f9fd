//! Per-path passwords.
//!
//! Entries live in a flat table next to the filesystem tree and are keyed by
//! the whole escaped path. They are independent of node existence, so
//! whoever removes a node also removes its entries.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::auth::Elevation;
use crate::paths::{is_within, unescape_segment};
use crate::store::{NodeStore, StoreResult, ROOT_PASSWORD_KEY};

/// Password table access.
///
/// Passwords are stored and compared as given. Hashing them would break
/// trees written by existing clients.
#[derive(Clone)]
pub struct PasswordVault {
    nodes: Arc<NodeStore>,
}

impl PasswordVault {
    pub fn new(nodes: Arc<NodeStore>) -> Self {
        Self { nodes }
    }

    /// Protect `path`, replacing any previous password.
    pub async fn set(&self, path: &str, password: &str) -> StoreResult<()> {
        debug!(path, "set password");
        self.nodes
            .store()
            .set(&self.nodes.password_ref(path), Value::String(password.to_string()))
            .await
    }

    /// The password protecting `path`, if any.
    pub async fn lookup(&self, path: &str) -> StoreResult<Option<String>> {
        let value = self.nodes.store().get(&self.nodes.password_ref(path)).await?;
        Ok(value.map(|v| match v {
            Value::String(s) => s,
            other => other.to_string(),
        }))
    }

    /// Whether `attempt` opens `path`. Elevation and unprotected paths always pass.
    pub async fn check(
        &self,
        path: &str,
        attempt: &str,
        elevation: Option<&Elevation>,
    ) -> StoreResult<bool> {
        if elevation.is_some() {
            return Ok(true);
        }
        Ok(match self.lookup(path).await? {
            None => true,
            Some(expected) => expected == attempt,
        })
    }

    /// Drop the entry for `path`. Missing entries are fine.
    pub async fn remove(&self, path: &str) -> StoreResult<()> {
        debug!(path, "remove password");
        self.nodes.store().remove(&self.nodes.password_ref(path)).await
    }

    /// Every protected path at or beneath `path`, from a single fetch.
    pub async fn protected_under(&self, path: &str) -> StoreResult<Vec<String>> {
        let entries = self.nodes.password_entries().await?;
        let mut found: Vec<String> = entries
            .keys()
            .filter_map(|key| {
                if key == ROOT_PASSWORD_KEY {
                    Some("/".to_string())
                } else {
                    unescape_segment(key).ok().map(|raw| format!("/{raw}"))
                }
            })
            .filter(|protected| is_within(protected, path))
            .collect();
        found.sort();
        Ok(found)
    }
}
