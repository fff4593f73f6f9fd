//! Session state for treesh.
//!
//! A session belongs to one identity and carries:
//! - Current working directory
//! - A parked pipeline waiting on a prompt, if any
//! - A pending elevation challenge from the gateway, if any
//!
//! The working directory is also persisted remotely at
//! `<session_prefix>/<identity key>/cwd`, so it follows the identity across
//! clients. Each identity has its own key; concurrent sessions of different
//! users never share a directory.

pub mod paths;

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::auth::Identity;
use crate::interpreter::Suspended;
use crate::kernel::ShellError;
use crate::paths::identity_key;
use crate::store::{KeyPath, StoreResult, TreeStore};

/// One user's shell session.
pub struct Session {
    identity: Identity,
    pub(crate) cwd: String,
    pub(crate) attached: bool,
    pub(crate) cwd_watch: Option<watch::Receiver<Option<Value>>>,
    pub(crate) suspended: Option<Suspended>,
    pub(crate) challenge: Option<String>,
}

impl Session {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            cwd: "/".to_string(),
            attached: false,
            cwd_watch: None,
            suspended: None,
            challenge: None,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn cwd(&self) -> &str {
        &self.cwd
    }

    /// True while a prompt is outstanding.
    pub fn is_waiting(&self) -> bool {
        self.suspended.is_some() || self.challenge.is_some()
    }

    /// Take any working directory written by another client since the last call.
    pub(crate) fn adopt_remote_cwd(&mut self) {
        let Some(rx) = self.cwd_watch.as_mut() else {
            return;
        };
        if !rx.has_changed().unwrap_or(false) {
            return;
        }
        let latest = rx.borrow_and_update().clone();
        if let Some(Value::String(remote)) = latest {
            if remote != self.cwd {
                debug!(from = %self.cwd, to = %remote, "adopting remote cwd");
                self.cwd = remote;
            }
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("identity", &self.identity)
            .field("cwd", &self.cwd)
            .field("waiting", &self.is_waiting())
            .finish()
    }
}

/// Remote persistence for session state.
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn TreeStore>,
    prefix: KeyPath,
}

impl SessionStore {
    pub fn new(store: Arc<dyn TreeStore>, prefix: &str) -> Self {
        Self {
            store,
            prefix: KeyPath::parse(prefix),
        }
    }

    fn cwd_ref(&self, identity: &Identity) -> Result<KeyPath, ShellError> {
        Ok(self.prefix.child(identity_key(&identity.email)?).child("cwd"))
    }

    /// Load the persisted cwd into `session` and start watching it.
    ///
    /// A missing or malformed value starts the session at `/` and writes that back.
    pub async fn attach(&self, session: &mut Session) -> Result<(), ShellError> {
        let key = self.cwd_ref(&session.identity)?;
        let cwd = match self.store.get(&key).await? {
            Some(Value::String(cwd)) if cwd.starts_with('/') => cwd,
            _ => {
                self.store.set(&key, Value::String("/".to_string())).await?;
                "/".to_string()
            }
        };
        let rx = self.store.subscribe(&key).await?;

        info!(identity = %session.identity.email, %cwd, "session attached");
        session.cwd = cwd;
        session.cwd_watch = Some(rx);
        session.attached = true;
        Ok(())
    }

    pub async fn save_cwd(&self, identity: &Identity, cwd: &str) -> Result<(), ShellError> {
        let key = self.cwd_ref(identity)?;
        self.write(&key, cwd).await?;
        Ok(())
    }

    async fn write(&self, key: &KeyPath, cwd: &str) -> StoreResult<()> {
        self.store.set(key, Value::String(cwd.to_string())).await
    }
}
