//! Domain types for edugen.
//!
//! Plain data shared by the providers and services: the disposable account,
//! the mail domains it can live under, received messages and generated tips.

mod account;
mod mail_domain;
mod message;
mod tip;
mod types;

pub use account::Account;
pub use mail_domain::{preferred_domain, Domain};
pub use message::{Body, Message, MessageDetail, Sender, NO_SUBJECT};
pub use tip::Tip;
pub use types::{AccountId, DomainId, MessageId};
