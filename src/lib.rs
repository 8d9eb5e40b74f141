//! edugen - Disposable academic-looking email addresses
//!
//! This crate provides the core of a disposable-address mail tool: account
//! creation against the mail.tm API, session persistence, inbox polling and
//! AI-generated tips.

pub mod app;
pub mod config;
pub mod domain;
pub mod providers;
pub mod services;
pub mod storage;

#[cfg(test)]
mod test_support;

pub use app::App;
