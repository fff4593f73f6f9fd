//! Typed view of stored filesystem values.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::paths::{escape_segment, unescape_segment};

/// Name of the placeholder child every new directory starts with.
pub const SENTINEL_NAME: &str = "DONOTDELETE";

/// Content of the placeholder child.
pub const SENTINEL_VALUE: &str = "NODELETE";

/// A node of the virtual filesystem.
///
/// Stored values carry no type tag: a string is a file, a mapping is a
/// directory. Conversion happens once, at the store boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    File { content: String },
    Directory { children: BTreeMap<String, Node> },
}

impl Node {
    pub fn file(content: impl Into<String>) -> Self {
        Node::File {
            content: content.into(),
        }
    }

    /// A fresh directory holding only the sentinel child.
    pub fn directory_with_sentinel() -> Self {
        let mut children = BTreeMap::new();
        children.insert(SENTINEL_NAME.to_string(), Node::file(SENTINEL_VALUE));
        Node::Directory { children }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Node::Directory { .. })
    }

    /// Decode a stored value.
    ///
    /// Scalars other than strings are read as files holding their JSON text.
    /// Keys that fail to unescape are kept verbatim so foreign data stays
    /// visible.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(content) => Node::File { content },
            Value::Object(map) => Node::Directory {
                children: map
                    .into_iter()
                    .map(|(key, child)| {
                        let name = unescape_segment(&key).unwrap_or(key);
                        (name, Node::from_value(child))
                    })
                    .collect(),
            },
            other => Node::File {
                content: other.to_string(),
            },
        }
    }

    /// Encode for storage, escaping child names.
    pub fn to_value(&self) -> Value {
        match self {
            Node::File { content } => Value::String(content.clone()),
            Node::Directory { children } => Value::Object(
                children
                    .iter()
                    .map(|(name, child)| (escape_segment(name), child.to_value()))
                    .collect::<Map<String, Value>>(),
            ),
        }
    }
}
