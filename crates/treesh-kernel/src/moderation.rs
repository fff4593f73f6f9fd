//! Flat ban list keyed by escaped identity.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::paths::{identity_from_key, identity_key, KeyError};
use crate::store::{KeyPath, StoreError, TreeStore};

#[derive(Debug, Error)]
pub enum BanError {
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Ban list under a fixed store prefix, one `identity -> true` entry each.
#[derive(Clone)]
pub struct BanList {
    store: Arc<dyn TreeStore>,
    prefix: KeyPath,
}

impl BanList {
    pub fn new(store: Arc<dyn TreeStore>, prefix: &str) -> Self {
        Self {
            store,
            prefix: KeyPath::parse(prefix),
        }
    }

    pub async fn ban(&self, identity: &str) -> Result<(), BanError> {
        let key = identity_key(identity)?;
        self.store.set(&self.prefix.child(key), Value::Bool(true)).await?;
        info!(identity, "banned");
        Ok(())
    }

    pub async fn unban(&self, identity: &str) -> Result<(), BanError> {
        let key = identity_key(identity)?;
        self.store.remove(&self.prefix.child(key)).await?;
        info!(identity, "unbanned");
        Ok(())
    }

    /// Banned identities, sorted.
    pub async fn list(&self) -> Result<Vec<String>, BanError> {
        let mut banned: Vec<String> = match self.store.get(&self.prefix).await? {
            Some(Value::Object(map)) => map
                .iter()
                .filter(|(_, flag)| flag.as_bool().unwrap_or(false))
                .map(|(key, _)| identity_from_key(key))
                .collect(),
            _ => Vec::new(),
        };
        banned.sort();
        Ok(banned)
    }

    /// Identities that can't be stored can't have been banned either.
    pub async fn is_banned(&self, identity: &str) -> Result<bool, StoreError> {
        let Ok(key) = identity_key(identity) else {
            return Ok(false);
        };
        let flag = self.store.get(&self.prefix.child(key)).await?;
        Ok(flag.and_then(|v| v.as_bool()).unwrap_or(false))
    }
}
