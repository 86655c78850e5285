//! Bearer credential storage and the session context that owns it.
//!
//! At most one credential is active per client. Absence of a credential means
//! the user is unauthenticated; there is no expiry or refresh.

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::session::SessionState;

/// Opaque bearer token issued by the authentication service.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a token. Blank tokens are not credentials and yield `None`.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("credential storage I/O failed at {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("credential storage at {path} is corrupt: {reason}")]
    Corrupt { path: String, reason: String },
    #[error("credential storage lock poisoned")]
    Poisoned,
}

/// Client-persistent key-value slot holding the current credential.
///
/// Writers are not coordinated across processes: last write wins.
pub trait CredentialStore: Send + Sync {
    fn get(&self) -> Result<Option<Credential>, StoreError>;
    fn set(&self, credential: &Credential) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}

/// Process-local store, used by tests and short-lived embedders.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    slot: Mutex<Option<Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: Credential) -> Self {
        Self {
            slot: Mutex::new(Some(credential)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Result<Option<Credential>, StoreError> {
        let slot = self.slot.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(slot.clone())
    }

    fn set(&self, credential: &Credential) -> Result<(), StoreError> {
        let mut slot = self.slot.lock().map_err(|_| StoreError::Poisoned)?;
        *slot = Some(credential.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut slot = self.slot.lock().map_err(|_| StoreError::Poisoned)?;
        *slot = None;
        Ok(())
    }
}

/// Session handle injected into every component that needs the credential.
#[derive(Clone)]
pub struct SessionContext {
    store: Arc<dyn CredentialStore>,
}

impl SessionContext {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryCredentialStore::new()))
    }

    pub fn get(&self) -> Result<Option<Credential>, StoreError> {
        self.store.get()
    }

    pub fn set(&self, credential: &Credential) -> Result<(), StoreError> {
        self.store.set(credential)?;
        tracing::debug!("session credential stored");
        Ok(())
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.clear()?;
        tracing::debug!("session credential cleared");
        Ok(())
    }

    /// Derived on demand; never cached. Unparseable contents count as no credential.
    pub fn state(&self) -> Result<SessionState, StoreError> {
        match self.get() {
            Ok(Some(_)) => Ok(SessionState::Authenticated),
            Ok(None) | Err(StoreError::Corrupt { .. }) => Ok(SessionState::Unauthenticated),
            Err(e) => Err(e),
        }
    }

    /// Drop the credential. Returns whether one was present.
    ///
    /// The slot is always cleared, even when it cannot be read; unreadable
    /// contents count as present. Calling this while logged out is a no-op.
    pub fn logout(&self) -> Result<bool, StoreError> {
        let present = match self.get() {
            Ok(credential) => credential.is_some(),
            Err(e) => {
                tracing::warn!(error = %e, "unreadable credential discarded on logout");
                true
            }
        };
        self.clear()?;
        Ok(present)
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext").finish_non_exhaustive()
    }
}
