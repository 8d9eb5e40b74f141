//! Mail and AI provider implementations.
//!
//! This module contains provider traits and implementations for external services:
//!
//! - [`mail`] - Disposable mail providers (mail.tm)
//! - [`ai`] - AI/LLM providers (Gemini, OpenAI-compatible)

pub mod ai;
pub mod mail;
