//! Identities and the elevation capability.
//!
//! Elevation bypasses password prompts and unlocks the metadata directory.
//! It is a token, not a flag: the only public way to get one is
//! [`SudoGuard::verify`] with the right password.

use sha2::{Digest, Sha256};
use tracing::warn;

/// Who is issuing commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
    pub verified: bool,
}

impl Identity {
    /// An identity the embedding application has authenticated.
    pub fn verified(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            verified: true,
        }
    }

    /// An identity nobody vouched for. The kernel refuses to run commands for it.
    pub fn unverified(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            verified: false,
        }
    }
}

/// Proof that the caller passed the elevation challenge.
#[derive(Debug, Clone)]
pub struct Elevation {
    _private: (),
}

impl Elevation {
    /// Minted by [`SudoGuard::verify`] and by tests.
    pub(crate) fn internal() -> Self {
        Self { _private: () }
    }
}

/// Checks elevation passwords against a configured SHA-256 digest.
#[derive(Debug, Clone, Default)]
pub struct SudoGuard {
    hash: Option<String>,
}

impl SudoGuard {
    /// `hash` is the lowercase hex SHA-256 of the password. With `None`,
    /// elevation is never granted.
    pub fn new(hash: Option<String>) -> Self {
        Self {
            hash: hash.map(|h| h.trim().to_ascii_lowercase()),
        }
    }

    pub fn verify(&self, password: &str) -> Option<Elevation> {
        let expected = self.hash.as_deref()?;
        if hash_password(password) == expected {
            Some(Elevation::internal())
        } else {
            warn!("elevation refused");
            None
        }
    }
}

/// Lowercase hex SHA-256 of `password`.
pub fn hash_password(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}
