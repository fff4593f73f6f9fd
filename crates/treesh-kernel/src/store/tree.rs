//! Shell paths mapped onto store locations.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use super::node::Node;
use super::traits::{KeyPath, StoreResult, TreeStore};
use crate::paths::{self, escape_segment, METADATA_DIR};

/// Password table key used for the root directory.
///
/// Never produced by [`escape_segment`], which always follows a `\` with a
/// known token.
pub const ROOT_PASSWORD_KEY: &str = "\\root";

/// Filesystem view over a [`TreeStore`].
///
/// Every shell path lives under a fixed prefix, one escaped key per segment.
/// The password table sits at `<prefix>/__PASSWORDS__`, which is also how the
/// metadata directory shows up to the shell.
pub struct NodeStore {
    store: Arc<dyn TreeStore>,
    fs_root: KeyPath,
}

impl NodeStore {
    pub fn new(store: Arc<dyn TreeStore>, prefix: &str) -> Self {
        Self {
            store,
            fs_root: KeyPath::parse(prefix),
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn TreeStore> {
        &self.store
    }

    /// Store location of an absolute shell path.
    ///
    /// Beneath the metadata directory the rest of the path names one flat
    /// password entry, so `/__PASSWORDS__/a/b` reads the entry for `/a/b`.
    pub fn node_ref(&self, path: &str) -> KeyPath {
        let segments = paths::segments(path);
        if let [METADATA_DIR, rest @ ..] = segments.as_slice() {
            if !rest.is_empty() {
                let entry = rest.join("/");
                if entry == ROOT_PASSWORD_KEY {
                    return self.password_table().child(entry);
                }
                return self.password_ref(&format!("/{entry}"));
            }
        }
        segments
            .into_iter()
            .fold(self.fs_root.clone(), |acc, seg| acc.child(escape_segment(seg)))
    }

    /// Location of the flat password table.
    pub fn password_table(&self) -> KeyPath {
        self.fs_root.child(METADATA_DIR)
    }

    /// Key of `path` inside the password table.
    ///
    /// The whole path is escaped as one key, so `/a/b` and `/a` never share
    /// a branch and a protected directory can hold protected children.
    pub fn password_key(path: &str) -> String {
        if path == "/" {
            ROOT_PASSWORD_KEY.to_string()
        } else {
            escape_segment(path.trim_start_matches('/'))
        }
    }

    /// Location of the password entry for `path`.
    pub fn password_ref(&self, path: &str) -> KeyPath {
        self.password_table().child(Self::password_key(path))
    }

    /// Read the node at `path`. The root always exists.
    pub async fn load(&self, path: &str) -> StoreResult<Option<Node>> {
        let key = self.node_ref(path);
        debug!(%key, "load");
        match self.store.get(&key).await? {
            Some(value) => Ok(Some(Node::from_value(value))),
            None if path == "/" => Ok(Some(Node::Directory {
                children: Default::default(),
            })),
            None => Ok(None),
        }
    }

    /// Replace whatever is at `path` with `node`.
    pub async fn save(&self, path: &str, node: &Node) -> StoreResult<()> {
        let key = self.node_ref(path);
        debug!(%key, "save");
        self.store.set(&key, node.to_value()).await
    }

    /// Create or overwrite a file.
    pub async fn write_file(&self, path: &str, content: &str) -> StoreResult<()> {
        self.save(path, &Node::file(content)).await
    }

    /// Add `node` as child `name` of the directory at `parent`, leaving
    /// siblings untouched.
    pub async fn insert_child(&self, parent: &str, name: &str, node: &Node) -> StoreResult<()> {
        let mut children = Map::new();
        children.insert(escape_segment(name), node.to_value());
        self.store.update(&self.node_ref(parent), children).await
    }

    /// Remove the node at `path` and everything under it.
    pub async fn delete(&self, path: &str) -> StoreResult<()> {
        let key = self.node_ref(path);
        debug!(%key, "delete");
        self.store.remove(&key).await
    }

    /// Nearest ancestor of `path` that is a file.
    ///
    /// Writing beneath a file would silently turn it into a directory.
    pub async fn file_ancestor(&self, path: &str) -> StoreResult<Option<String>> {
        let mut ancestor = paths::split_parent(path).0.to_string();
        loop {
            match self.load(&ancestor).await? {
                Some(Node::File { .. }) => return Ok(Some(ancestor)),
                Some(Node::Directory { .. }) => return Ok(None),
                None if ancestor == "/" => return Ok(None),
                None => ancestor = paths::split_parent(&ancestor).0.to_string(),
            }
        }
    }

    /// Raw password table contents.
    pub(crate) async fn password_entries(&self) -> StoreResult<Map<String, Value>> {
        match self.store.get(&self.password_table()).await? {
            Some(Value::Object(map)) => Ok(map),
            _ => Ok(Map::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn nodes() -> NodeStore {
        NodeStore::new(Arc::new(MemoryStore::new()), "shellFS")
    }

    #[test]
    fn test_node_ref_escapes_each_segment() {
        let nodes = nodes();
        assert_eq!(nodes.node_ref("/").to_string(), "shellFS");
        assert_eq!(
            nodes.node_ref("/docs/a.txt").to_string(),
            "shellFS/docs/a\\periodtxt"
        );
    }

    #[test]
    fn test_password_ref() {
        let nodes = nodes();
        assert_eq!(nodes.password_ref("/").to_string(), "shellFS/__PASSWORDS__/\\root");
        assert_eq!(
            nodes.password_ref("/a/b").to_string(),
            "shellFS/__PASSWORDS__/a\\slashb"
        );
        assert_ne!(NodeStore::password_key("/root"), NodeStore::password_key("/"));
    }

    #[test]
    fn test_metadata_dir_is_password_table() {
        let nodes = nodes();
        assert_eq!(nodes.node_ref("/__PASSWORDS__"), nodes.password_table());
    }

    #[test]
    fn test_metadata_paths_name_flat_entries() {
        let nodes = nodes();
        assert_eq!(nodes.node_ref("/__PASSWORDS__/a/b"), nodes.password_ref("/a/b"));
        assert_eq!(nodes.node_ref("/__PASSWORDS__/a.txt"), nodes.password_ref("/a.txt"));
        assert_eq!(nodes.node_ref("/__PASSWORDS__/\\root"), nodes.password_ref("/"));
        assert_eq!(
            nodes.node_ref("/docs/__PASSWORDS__/x").to_string(),
            "shellFS/docs/__PASSWORDS__/x"
        );
    }

    #[tokio::test]
    async fn test_file_ancestor() {
        let nodes = nodes();
        nodes.write_file("/f", "x").await.unwrap();
        nodes.save("/d", &Node::directory_with_sentinel()).await.unwrap();

        assert_eq!(nodes.file_ancestor("/f/child").await.unwrap(), Some("/f".to_string()));
        assert_eq!(nodes.file_ancestor("/f/a/b").await.unwrap(), Some("/f".to_string()));
        assert_eq!(nodes.file_ancestor("/d/new").await.unwrap(), None);
        assert_eq!(nodes.file_ancestor("/missing/new").await.unwrap(), None);
        assert_eq!(nodes.file_ancestor("/top").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_root_always_exists() {
        let nodes = nodes();
        let root = nodes.load("/").await.unwrap();
        assert!(matches!(root, Some(Node::Directory { .. })));
        assert_eq!(nodes.load("/missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let nodes = nodes();
        nodes.save("/d", &Node::directory_with_sentinel()).await.unwrap();
        nodes.insert_child("/d", "a.txt", &Node::file("hi")).await.unwrap();

        assert_eq!(nodes.load("/d/a.txt").await.unwrap(), Some(Node::file("hi")));
        let raw = nodes.store().get(&nodes.node_ref("/d")).await.unwrap();
        assert_eq!(raw, Some(json!({"DONOTDELETE": "NODELETE", "a\\periodtxt": "hi"})));
    }

    #[tokio::test]
    async fn test_delete_subtree() {
        let nodes = nodes();
        nodes.write_file("/d/e/f", "x").await.unwrap();
        nodes.delete("/d").await.unwrap();
        assert_eq!(nodes.load("/d/e/f").await.unwrap(), None);
    }
}
