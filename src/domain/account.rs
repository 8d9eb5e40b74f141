//! Disposable account (session) type.

use serde::{Deserialize, Serialize};

use super::AccountId;

/// A generated identity: address, the password it was created with and the
/// bearer token used for inbox calls.
///
/// This is also the snapshot format persisted by the session store, so the
/// field names follow the provider's JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Provider identifier, empty until assigned.
    #[serde(default)]
    pub id: AccountId,
    /// Full email address.
    pub address: String,
    /// Password chosen at creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Bearer token for authenticated endpoints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Account {
    /// Creates a fully credentialed session with an unassigned id.
    pub fn new(
        address: impl Into<String>,
        password: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            id: AccountId::default(),
            address: address.into(),
            password: Some(password.into()),
            token: Some(token.into()),
        }
    }

    /// Returns the bearer token, if one was obtained.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }
}
