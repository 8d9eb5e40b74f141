//! Mail provider trait definition.
//!
//! [`MailProvider`] is the typed surface over a disposable-mail REST service.
//! Implementations map each call onto exactly one HTTP request: no retries, no
//! caching, no idempotence checks.

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::{Account, Domain, Message, MessageDetail, MessageId};

/// Result type alias for mail provider operations.
pub type Result<T> = std::result::Result<T, MailError>;

/// Errors that can occur during mail provider operations.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// Transport failure or a non-success status on a read endpoint.
    ///
    /// Authorization failures on inbox endpoints land here as well.
    #[error("network error: {0}")]
    Network(String),

    /// Account creation was rejected.
    ///
    /// The provider does not tell "address taken" apart from "service down".
    #[error("account creation failed with status {status}")]
    ConflictOrUnavailable {
        /// HTTP status returned by the provider.
        status: u16,
    },

    /// Token request was rejected.
    #[error("authentication failed with status {status}")]
    Authentication {
        /// HTTP status returned by the provider.
        status: u16,
    },
}

/// Collection envelope used by list endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct Collection<T> {
    #[serde(rename = "hydra:member", default = "Vec::new")]
    pub member: Vec<T>,
}

/// Trait for disposable-mail providers.
///
/// All inbox calls take the bearer token explicitly so the provider holds no
/// session state; the session store owns the token.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailProvider: Send + Sync {
    /// Lists the domains accounts can be created under, in provider order.
    ///
    /// An empty list is a valid result.
    async fn list_domains(&self) -> Result<Vec<Domain>>;

    /// Creates an account.
    ///
    /// # Errors
    ///
    /// Returns [`MailError::ConflictOrUnavailable`] on any non-success status.
    async fn create_account(&self, address: &str, password: &str) -> Result<Account>;

    /// Exchanges credentials for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`MailError::Authentication`] on any non-success status.
    async fn obtain_token(&self, address: &str, password: &str) -> Result<String>;

    /// Lists message summaries in provider order.
    async fn list_messages(&self, token: &str) -> Result<Vec<Message>>;

    /// Fetches a single message with its bodies.
    async fn get_message_detail(&self, id: &MessageId, token: &str) -> Result<MessageDetail>;

    /// Deletes a message, returning whether the provider accepted it.
    async fn delete_message(&self, id: &MessageId, token: &str) -> Result<bool>;
}
