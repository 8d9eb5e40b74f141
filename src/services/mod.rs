//! Business services layer.
//!
//! Services orchestrate the providers and storage around one disposable
//! session.
//!
//! # Architecture
//!
//! ```text
//!   App (headless driver)
//!          |
//!          v
//!    Services Layer  <-- You are here
//!          |
//!          v
//! Infrastructure (Providers, Storage)
//! ```
//!
//! # Services Overview
//!
//! - [`AddressGenerator`]: Composes an address and creates the account
//! - [`SessionStore`]: Owns the active account and its persisted snapshot
//! - [`InboxPoller`]: Keeps the message list fresh and opens messages
//! - [`TipService`]: Generated advisory tips with a fixed fallback

mod generator_service;
mod inbox_service;
mod session_service;
mod tip_service;

pub use generator_service::{
    compose_address, normalize_prefix, random_password, random_prefix, AddressGenerator,
    GeneratorError, GeneratorState, PREFIX_WORDS,
};
pub use inbox_service::{
    InboxError, InboxEvent, InboxPoller, PollerHandle, RefreshOutcome, DEFAULT_POLL_INTERVAL,
};
pub use session_service::{SessionStore, DEFAULT_SESSION_KEY};
pub use tip_service::{
    fallback_tips, parse_tips, tip_prompt, TipService, DEFAULT_TIP_CATEGORY, TIP_COUNT,
};
