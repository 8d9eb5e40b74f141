//! Disposable mail provider implementations.
//!
//! [`MailProvider`] covers the six calls the generator and inbox need: list
//! domains, create an account, obtain a token, list messages, fetch a message,
//! delete a message. [`MailTmProvider`] implements it over the mail.tm REST API.
//!
//! # Example
//!
//! ```rust,no_run
//! use edugen::providers::mail::{MailProvider, MailTmProvider};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = MailTmProvider::new();
//! let domains = provider.list_domains().await?;
//!
//! let address = format!("student42@{}", domains[0].domain);
//! provider.create_account(&address, "pass1234").await?;
//! let token = provider.obtain_token(&address, "pass1234").await?;
//!
//! for message in provider.list_messages(&token).await? {
//!     println!("{}: {}", message.from.display(), message.display_subject());
//! }
//! # Ok(())
//! # }
//! ```

mod mailtm;
mod traits;

pub use mailtm::{MailTmProvider, MAILTM_BASE_URL};
#[cfg(test)]
pub use traits::MockMailProvider;
pub use traits::{MailError, MailProvider, Result};
