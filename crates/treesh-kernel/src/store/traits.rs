//! Core store traits and types.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;
use tokio::sync::watch;

/// Errors from the remote store boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A key contains a character the store refuses, or is empty.
    #[error("invalid key '{key}' in path '{path}'")]
    InvalidKey { path: String, key: String },

    /// The store couldn't complete the round trip.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A slash-joined location in the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct KeyPath {
    segments: Vec<String>,
}

impl KeyPath {
    /// The root of the whole tree.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a slash-joined path such as `shellFS/__PASSWORDS__`.
    pub fn parse(path: &str) -> Self {
        Self {
            segments: path
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// A child location. The key is used verbatim; escape it first.
    pub fn child(&self, key: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(key.into());
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

/// Tree-shaped key-value store interface.
///
/// Values are JSON trees: strings and other scalars are leaves, objects are
/// branches. Like the hosted stores this models, a branch with no children
/// does not exist, and writing `null` or `{}` deletes.
#[async_trait]
pub trait TreeStore: Send + Sync {
    /// Fetch the value at `path`, `None` if absent.
    async fn get(&self, path: &KeyPath) -> StoreResult<Option<Value>>;

    /// Replace the value at `path`, creating intermediate branches.
    async fn set(&self, path: &KeyPath, value: Value) -> StoreResult<()>;

    /// Merge `children` into the branch at `path`, leaving other children alone.
    async fn update(&self, path: &KeyPath, children: Map<String, Value>) -> StoreResult<()>;

    /// Delete the value at `path`. Deleting something absent is not an error.
    async fn remove(&self, path: &KeyPath) -> StoreResult<()>;

    /// Watch the value at `path`.
    ///
    /// The receiver starts with the current value and is marked changed
    /// whenever a later write alters it.
    async fn subscribe(&self, path: &KeyPath) -> StoreResult<watch::Receiver<Option<Value>>>;

    /// Check whether anything is stored at `path`.
    async fn exists(&self, path: &KeyPath) -> StoreResult<bool> {
        Ok(self.get(path).await?.is_some())
    }
}
