//! Address generator flow.
//!
//! [`AddressGenerator`] collects a prefix and a domain, composes the address
//! and creates the account at the mail provider:
//!
//! ```text
//! Idle -> Submitting -> Committed
//!                    -> Failed
//! ```
//!
//! The generator never commits the session itself. On success it hands the
//! new [`Account`] back and the caller passes it to the session store.

use std::sync::Arc;

use rand::Rng;
use thiserror::Error;

use crate::domain::{preferred_domain, Account, Domain};
use crate::providers::mail::{MailError, MailProvider};

/// Words a random prefix is built from.
pub const PREFIX_WORDS: [&str; 6] = [
    "student",
    "learner",
    "scholar",
    "researcher",
    "dev",
    "academic",
];

/// Errors surfaced by the generator. `Display` is the inline message.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("Please provide a username and select a domain.")]
    Validation,

    #[error("Failed to fetch mail domains.")]
    DomainsUnavailable(#[source] MailError),

    #[error("Address taken or service unavailable. Try a different username.")]
    Provider(#[source] MailError),
}

/// Result type for generator operations.
pub type Result<T> = std::result::Result<T, GeneratorError>;

/// Where the generator is in its submit cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeneratorState {
    #[default]
    Idle,
    Submitting,
    Committed,
    Failed,
}

/// Lowercases the prefix and strips all whitespace from it.
pub fn normalize_prefix(prefix: &str) -> String {
    prefix
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Builds `normalized-prefix@domain`.
pub fn compose_address(prefix: &str, domain: &str) -> String {
    format!("{}@{}", normalize_prefix(prefix), domain)
}

/// A prefix word followed by a number below 10000.
pub fn random_prefix<R: Rng>(rng: &mut R) -> String {
    let word = PREFIX_WORDS[rng.random_range(0..PREFIX_WORDS.len())];
    format!("{}{}", word, rng.random_range(0..10_000))
}

/// Password used for a generated account.
pub fn random_password<R: Rng>(rng: &mut R) -> String {
    format!("pass{}", rng.random_range(0..10_000))
}

/// Drives address generation against a [`MailProvider`].
pub struct AddressGenerator {
    provider: Arc<dyn MailProvider>,
    domains: Vec<Domain>,
    selected: Option<String>,
    prefix: String,
    password: String,
    state: GeneratorState,
    error: Option<String>,
}

impl AddressGenerator {
    /// Creates a generator with a freshly drawn password.
    pub fn new(provider: Arc<dyn MailProvider>) -> Self {
        let password = random_password(&mut rand::rng());
        Self {
            provider,
            domains: Vec::new(),
            selected: None,
            prefix: String::new(),
            password,
            state: GeneratorState::Idle,
            error: None,
        }
    }

    /// Uses a fixed password instead of a random one.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Fetches the domain list and pre-selects the preferred entry.
    ///
    /// On failure the list is emptied, nothing is selected and the inline
    /// error is set.
    pub async fn load_domains(&mut self) -> Result<&[Domain]> {
        match self.provider.list_domains().await {
            Ok(domains) => {
                self.selected = preferred_domain(&domains).map(|d| d.domain.clone());
                tracing::debug!(
                    count = domains.len(),
                    selected = ?self.selected,
                    "mail domains loaded"
                );
                self.domains = domains;
                self.error = None;
                Ok(&self.domains)
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to fetch mail domains");
                self.domains.clear();
                self.selected = None;
                let err = GeneratorError::DomainsUnavailable(e);
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Selects a loaded domain by name. Unknown names are ignored.
    pub fn select_domain(&mut self, name: &str) -> bool {
        if self.domains.iter().any(|d| d.domain == name) {
            self.selected = Some(name.to_string());
            true
        } else {
            false
        }
    }

    pub fn set_prefix(&mut self, prefix: impl Into<String>) {
        self.prefix = prefix.into();
    }

    /// Replaces the prefix with a random one and returns it.
    pub fn randomize_prefix(&mut self) -> &str {
        self.prefix = random_prefix(&mut rand::rng());
        &self.prefix
    }

    pub fn domains(&self) -> &[Domain] {
        &self.domains
    }

    pub fn selected_domain(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn state(&self) -> GeneratorState {
        self.state
    }

    /// Inline error message from the last operation.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The address a submit would create, if inputs are complete.
    pub fn preview_address(&self) -> Option<String> {
        let domain = self.selected.as_deref()?;
        let prefix = normalize_prefix(&self.prefix);
        if prefix.is_empty() {
            return None;
        }
        Some(format!("{}@{}", prefix, domain))
    }

    /// Creates the account and fetches its token.
    ///
    /// The token is requested only after creation succeeded. Either failure
    /// moves the generator to [`GeneratorState::Failed`].
    pub async fn submit(&mut self) -> Result<Account> {
        let Some(address) = self.preview_address() else {
            self.error = Some(GeneratorError::Validation.to_string());
            return Err(GeneratorError::Validation);
        };

        self.state = GeneratorState::Submitting;
        self.error = None;
        tracing::debug!(address = %address, "creating account");

        match self.create(&address).await {
            Ok(account) => {
                tracing::info!(address = %account.address, "address generated");
                self.state = GeneratorState::Committed;
                Ok(account)
            }
            Err(e) => {
                tracing::warn!(address = %address, error = %e, "address generation failed");
                self.state = GeneratorState::Failed;
                let err = GeneratorError::Provider(e);
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    async fn create(&self, address: &str) -> std::result::Result<Account, MailError> {
        let created = self
            .provider
            .create_account(address, &self.password)
            .await?;
        let token = self.provider.obtain_token(address, &self.password).await?;

        Ok(Account {
            id: Default::default(),
            address: created.address,
            password: Some(self.password.clone()),
            token: Some(token),
        })
    }
}
