//! In-memory tree store.
//!
//! Used for tests and the REPL. It follows the hosted-store rules the shell
//! was written against: empty branches vanish, `null` deletes, and keys may not
//! contain `.`, `$`, `#`, `[`, `]` or `/`.

use super::traits::{KeyPath, StoreError, StoreResult, TreeStore};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::{watch, Mutex, RwLock};

const RESERVED: [char; 6] = ['.', '$', '#', '[', ']', '/'];

struct Watcher {
    path: KeyPath,
    tx: watch::Sender<Option<Value>>,
}

/// In-memory tree store.
///
/// Thread-safe via internal locks. All data is lost when dropped unless
/// exported with [`MemoryStore::snapshot`].
pub struct MemoryStore {
    root: RwLock<Value>,
    watchers: Mutex<Vec<Watcher>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore").finish_non_exhaustive()
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            root: RwLock::new(Value::Object(Map::new())),
            watchers: Mutex::new(Vec::new()),
        }
    }

    /// Create a store preloaded with a previously exported tree.
    pub fn from_snapshot(tree: Value) -> Self {
        let root = normalize(tree).unwrap_or_else(|| Value::Object(Map::new()));
        Self {
            root: RwLock::new(root),
            watchers: Mutex::new(Vec::new()),
        }
    }

    /// Export the whole tree.
    pub async fn snapshot(&self) -> Value {
        self.root.read().await.clone()
    }

    fn validate(path: &KeyPath) -> StoreResult<()> {
        for key in path.segments() {
            if key.is_empty() || key.chars().any(|c| RESERVED.contains(&c) || c.is_control()) {
                return Err(StoreError::InvalidKey {
                    path: path.to_string(),
                    key: key.clone(),
                });
            }
        }
        Ok(())
    }

    /// Push the current value to every live watcher whose value changed.
    async fn notify(&self) {
        let root = self.root.read().await;
        let mut watchers = self.watchers.lock().await;
        watchers.retain(|w| !w.tx.is_closed());
        for watcher in watchers.iter() {
            let current = lookup(&root, watcher.path.segments()).cloned();
            watcher.tx.send_if_modified(|seen| {
                if *seen == current {
                    false
                } else {
                    *seen = current;
                    true
                }
            });
        }
    }
}

#[async_trait]
impl TreeStore for MemoryStore {
    async fn get(&self, path: &KeyPath) -> StoreResult<Option<Value>> {
        Self::validate(path)?;
        let root = self.root.read().await;
        Ok(lookup(&root, path.segments()).cloned())
    }

    async fn set(&self, path: &KeyPath, value: Value) -> StoreResult<()> {
        Self::validate(path)?;
        {
            let mut root = self.root.write().await;
            match normalize(value) {
                Some(value) => insert(&mut root, path.segments(), value),
                None => delete(&mut root, path.segments()),
            }
        }
        self.notify().await;
        Ok(())
    }

    async fn update(&self, path: &KeyPath, children: Map<String, Value>) -> StoreResult<()> {
        Self::validate(path)?;
        for key in children.keys() {
            Self::validate(&path.child(key.clone()))?;
        }
        {
            let mut root = self.root.write().await;
            for (key, value) in children {
                let child = path.child(key);
                match normalize(value) {
                    Some(value) => insert(&mut root, child.segments(), value),
                    None => delete(&mut root, child.segments()),
                }
            }
        }
        self.notify().await;
        Ok(())
    }

    async fn remove(&self, path: &KeyPath) -> StoreResult<()> {
        Self::validate(path)?;
        {
            let mut root = self.root.write().await;
            delete(&mut root, path.segments());
        }
        self.notify().await;
        Ok(())
    }

    async fn subscribe(&self, path: &KeyPath) -> StoreResult<watch::Receiver<Option<Value>>> {
        Self::validate(path)?;
        let current = {
            let root = self.root.read().await;
            lookup(&root, path.segments()).cloned()
        };
        let (tx, rx) = watch::channel(current);
        self.watchers.lock().await.push(Watcher {
            path: path.clone(),
            tx,
        });
        Ok(rx)
    }
}

/// Drop nulls and empty branches, bottom-up.
fn normalize(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Object(map) => {
            let pruned: Map<String, Value> = map
                .into_iter()
                .filter_map(|(k, v)| normalize(v).map(|v| (k, v)))
                .collect();
            if pruned.is_empty() {
                None
            } else {
                Some(Value::Object(pruned))
            }
        }
        other => Some(other),
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn lookup<'a>(node: &'a Value, segments: &[String]) -> Option<&'a Value> {
    let mut cursor = node;
    for key in segments {
        cursor = cursor.as_object()?.get(key)?;
    }
    if is_empty(cursor) { None } else { Some(cursor) }
}

/// Place `value` at `segments`, turning leaves on the way into branches.
fn insert(node: &mut Value, segments: &[String], value: Value) {
    match segments.split_first() {
        None => *node = value,
        Some((head, rest)) => {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            if let Value::Object(map) = node {
                let child = map.entry(head.clone()).or_insert(Value::Null);
                insert(child, rest, value);
            }
        }
    }
}

/// Remove whatever is at `segments`, then prune branches left empty.
fn delete(node: &mut Value, segments: &[String]) {
    match segments.split_first() {
        None => *node = Value::Object(Map::new()),
        Some((head, rest)) => {
            if let Value::Object(map) = node {
                if rest.is_empty() {
                    map.remove(head);
                } else if let Some(child) = map.get_mut(head) {
                    delete(child, rest);
                    if is_empty(child) {
                        map.remove(head);
                    }
                }
            }
        }
    }
}
