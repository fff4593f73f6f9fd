//! Shell path resolution and storage-key escaping.
//!
//! Shell paths are always absolute once resolved (`/a/b`). The remote store
//! forbids some characters inside keys, so every path segment goes through
//! [`escape_segment`] before it becomes a key, and [`unescape_segment`] on the
//! way back. Identity strings (emails) use a separate, simpler substitution
//! because they live in flat mappings with their own reserved characters.

use thiserror::Error;

/// Name of the metadata directory at the filesystem root.
pub const METADATA_DIR: &str = "__PASSWORDS__";

/// Errors from key escaping and identity validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// An escaped key contains a `\` that doesn't start a known escape token.
    #[error("invalid escape sequence in key: {0}")]
    BadEscape(String),

    /// An identity contains a character that can't be stored as a key.
    #[error("invalid identity: {0}")]
    BadIdentity(String),
}

/// Characters the store refuses inside keys, plus the escape introducer.
const ESCAPES: &[(char, &str)] = &[
    ('\\', "backslash"),
    ('.', "period"),
    ('$', "dollar"),
    ('#', "hash"),
    ('[', "lbracket"),
    (']', "rbracket"),
    ('/', "slash"),
];

/// Resolve `input` against `cwd` into an absolute path.
///
/// Absolute input only loses its trailing slashes. Relative input is joined
/// onto `cwd` and normalized: empty and `.` segments vanish, `..` pops (and
/// stops at the root). The result starts with `/` and never ends with one,
/// except for the root itself.
pub fn resolve(input: &str, cwd: &str) -> String {
    if input.starts_with('/') {
        let trimmed = input.trim_end_matches('/');
        return if trimmed.is_empty() {
            "/".to_string()
        } else {
            trimmed.to_string()
        };
    }

    let mut stack: Vec<&str> = Vec::new();
    for part in cwd.split('/').chain(input.split('/')) {
        match part {
            "" | "." => {}
            ".." => {
                stack.pop();
            }
            other => stack.push(other),
        }
    }

    format!("/{}", stack.join("/"))
}

/// Join a child name onto an absolute parent path.
pub fn join(parent: &str, name: &str) -> String {
    if parent == "/" {
        format!("/{name}")
    } else {
        format!("{parent}/{name}")
    }
}

/// Split an absolute path into its parent path and final segment.
///
/// The root splits into `("/", "")`.
pub fn split_parent(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(0) => ("/", &path[1..]),
        Some(idx) => (&path[..idx], &path[idx + 1..]),
        None => ("/", path),
    }
}

/// Final segment of an absolute path (empty for the root).
pub fn base_name(path: &str) -> &str {
    split_parent(path).1
}

/// Segments of an absolute path, root yielding none.
pub fn segments(path: &str) -> Vec<&str> {
    if path == "/" {
        Vec::new()
    } else {
        path.trim_start_matches('/').split('/').collect()
    }
}

/// True if `path` is the metadata directory or anything beneath it.
pub fn is_metadata(path: &str) -> bool {
    let dir = path.trim_start_matches('/');
    dir == METADATA_DIR
        || dir
            .strip_prefix(METADATA_DIR)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// True if `path` is `ancestor` or lies beneath it.
pub fn is_within(path: &str, ancestor: &str) -> bool {
    if ancestor == "/" {
        return true;
    }
    path == ancestor
        || path
            .strip_prefix(ancestor)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Escape one path segment into a storage key.
pub fn escape_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for c in segment.chars() {
        match ESCAPES.iter().find(|(raw, _)| *raw == c) {
            Some((_, token)) => {
                out.push('\\');
                out.push_str(token);
            }
            None => out.push(c),
        }
    }
    out
}

/// Reverse [`escape_segment`].
pub fn unescape_segment(key: &str) -> Result<String, KeyError> {
    let mut out = String::with_capacity(key.len());
    let mut rest = key;
    while let Some(idx) = rest.find('\\') {
        out.push_str(&rest[..idx]);
        let after = &rest[idx + 1..];
        let (raw, token) = ESCAPES
            .iter()
            .find(|(_, token)| after.starts_with(token))
            .ok_or_else(|| KeyError::BadEscape(key.to_string()))?;
        out.push(*raw);
        rest = &after[token.len()..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Convert an identity (email) into its flat-mapping key: `.` becomes `*`.
///
/// Identities containing `*` or other store-reserved characters are refused,
/// which keeps the substitution reversible.
pub fn identity_key(identity: &str) -> Result<String, KeyError> {
    let reserved = ['*', '$', '#', '[', ']', '/'];
    if identity.is_empty() || identity.chars().any(|c| reserved.contains(&c) || c.is_control()) {
        return Err(KeyError::BadIdentity(identity.to_string()));
    }
    Ok(identity.replace('.', "*"))
}

/// Reverse [`identity_key`].
pub fn identity_from_key(key: &str) -> String {
    key.replace('*', ".")
}
