//! Session store for the active disposable account.
//!
//! The [`SessionStore`] is the single owner of "which account is active". It
//! mirrors the account to a [`SnapshotStore`] so a restart can pick the session
//! back up. It does not own the inbox poller: whoever calls
//! [`commit`](SessionStore::commit) or [`clear`](SessionStore::clear) must stop
//! any poller still running on the old token.

use std::sync::Arc;

use crate::domain::Account;
use crate::storage::{SnapshotStore, StorageError};

/// Storage key for the session snapshot.
pub const DEFAULT_SESSION_KEY: &str = "edugen_session";

/// Holder of the active account and its persisted snapshot.
pub struct SessionStore {
    storage: Arc<dyn SnapshotStore>,
    key: String,
    active: Option<Account>,
}

impl SessionStore {
    /// Creates a store using the default snapshot key.
    pub fn new(storage: Arc<dyn SnapshotStore>) -> Self {
        Self::with_key(storage, DEFAULT_SESSION_KEY)
    }

    /// Creates a store persisting under a custom key.
    pub fn with_key(storage: Arc<dyn SnapshotStore>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
            active: None,
        }
    }

    /// Loads the persisted snapshot into memory.
    ///
    /// A malformed snapshot is treated as absent and deleted. Storage read
    /// failures are logged and also treated as absent.
    pub async fn restore(&mut self) -> Option<Account> {
        let raw = match self.storage.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                self.active = None;
                return None;
            }
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "could not read session snapshot");
                self.active = None;
                return None;
            }
        };

        match serde_json::from_str::<Account>(&raw) {
            Ok(account) => {
                tracing::info!(address = %account.address, "session restored");
                self.active = Some(account.clone());
                Some(account)
            }
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "discarding corrupt session snapshot");
                if let Err(e) = self.storage.remove(&self.key).await {
                    tracing::warn!(key = %self.key, error = %e, "could not delete corrupt snapshot");
                }
                self.active = None;
                None
            }
        }
    }

    /// Makes `account` the active session and persists it.
    ///
    /// The snapshot is written first; if that fails the previous session stays
    /// active.
    pub async fn commit(&mut self, account: Account) -> Result<(), StorageError> {
        let snapshot = serde_json::to_string(&account)?;
        self.storage.set(&self.key, &snapshot).await?;

        tracing::info!(address = %account.address, "session committed");
        self.active = Some(account);
        Ok(())
    }

    /// Ends the active session and deletes its snapshot.
    ///
    /// This is irreversible; callers confirm with the user first. The snapshot
    /// is deleted first; if that fails the session stays active.
    pub async fn clear(&mut self) -> Result<(), StorageError> {
        self.storage.remove(&self.key).await?;

        if let Some(account) = self.active.take() {
            tracing::info!(address = %account.address, "session cleared");
        }
        Ok(())
    }

    /// The active account, if any.
    pub fn current(&self) -> Option<&Account> {
        self.active.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}
