//! Shared-passphrase gate in front of the interview session.
//!
//! One static passphrase, no accounts, no expiry. It keeps casual visitors out
//! and nothing more. Unlocking yields a [`SessionGrant`], and the session
//! controller cannot be built without one.

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("incorrect passphrase")]
    WrongPassphrase,
}

impl AccessError {
    pub fn user_message(&self) -> &'static str {
        match self {
            AccessError::WrongPassphrase => "Incorrect password. Try again.",
        }
    }
}

/// Proof that the gate was passed for this session.
#[derive(Debug)]
pub struct SessionGrant {
    _private: (),
}

#[derive(Debug)]
pub struct AccessGate {
    passphrase: Option<SecretString>,
}

impl AccessGate {
    /// Deployment without a gate: every unlock succeeds.
    pub fn open() -> Self {
        Self { passphrase: None }
    }

    pub fn with_passphrase(passphrase: SecretString) -> Self {
        Self {
            passphrase: Some(passphrase),
        }
    }

    pub fn is_guarded(&self) -> bool {
        self.passphrase.is_some()
    }

    /// Grants access for an ungated deployment without asking.
    pub fn grant_if_open(&self) -> Option<SessionGrant> {
        if self.is_guarded() {
            None
        } else {
            Some(SessionGrant { _private: () })
        }
    }

    pub fn unlock(&self, attempt: &str) -> Result<SessionGrant, AccessError> {
        match &self.passphrase {
            None => Ok(SessionGrant { _private: () }),
            Some(expected) if expected.expose_secret() == attempt.trim() => {
                tracing::info!("Access granted");
                Ok(SessionGrant { _private: () })
            }
            Some(_) => {
                tracing::warn!("Rejected access attempt");
                Err(AccessError::WrongPassphrase)
            }
        }
    }
}
