//! XDG Base Directory paths for treesh state.
//!
//! | Purpose | XDG Variable | Default | treesh Path |
//! |---------|--------------|---------|-------------|
//! | Config | `$XDG_CONFIG_HOME` | `~/.config` | `$XDG_CONFIG_HOME/treesh/config.toml` |
//! | Store snapshot | `$XDG_DATA_HOME` | `~/.local/share` | `$XDG_DATA_HOME/treesh/store.json` |

use std::path::PathBuf;

use directories::BaseDirs;

/// Get the data directory for persistent state.
///
/// Uses `$XDG_DATA_HOME/treesh` or falls back to `~/.local/share/treesh`.
pub fn data_dir() -> PathBuf {
    BaseDirs::new()
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| home_fallback().join(".local").join("share"))
        .join("treesh")
}

/// Get the config directory.
///
/// Uses `$XDG_CONFIG_HOME/treesh` or falls back to `~/.config/treesh`.
pub fn config_dir() -> PathBuf {
    BaseDirs::new()
        .map(|d| d.config_dir().to_path_buf())
        .unwrap_or_else(|| home_fallback().join(".config"))
        .join("treesh")
}

/// Where the REPL keeps its in-memory store between runs.
pub fn snapshot_path() -> PathBuf {
    data_dir().join("store.json")
}

/// Line editor history for the REPL.
pub fn history_path() -> PathBuf {
    data_dir().join("history.txt")
}

/// Fallback home directory when BaseDirs fails.
fn home_fallback() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}
