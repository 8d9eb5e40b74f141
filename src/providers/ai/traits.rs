//! LLM provider trait and the request/response types shared by providers.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from a completion call.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("unexpected LLM response: {0}")]
    InvalidResponse(String),

    #[error("rate limited (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("LLM credential rejected: {0}")]
    Authentication(String),
}

/// Result type for LLM operations.
pub type LlmResult<T> = Result<T, LlmError>;

/// Speaker of a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One turn of a chat conversation.
///
/// Named apart from [`crate::domain::Message`], which is a received email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Instructions kept apart from the conversation.
    pub system_prompt: Option<String>,
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature, 0.0 to 2.0.
    pub temperature: f32,
    pub max_tokens: Option<usize>,
    /// Ask for a JSON body instead of free text, where the API supports it.
    pub json_response: bool,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            system_prompt: None,
            messages,
            temperature: 0.7,
            max_tokens: None,
            json_response: false,
        }
    }

    /// A request holding a single user turn.
    pub fn prompt(text: impl Into<String>) -> Self {
        Self::new(vec![ChatMessage::user(text)])
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_json_response(mut self) -> Self {
        self.json_response = true;
        self
    }
}

/// Token accounting reported by the API, zero when absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

/// Why generation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    /// Ran into the token limit.
    Length,
    /// Blocked by a safety filter.
    ContentFilter,
    Other,
}

/// A finished completion.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    pub text: String,
    pub tokens_used: TokenUsage,
    pub finish_reason: FinishReason,
}

/// Trait for LLM providers (Gemini, OpenAI-compatible).
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Short provider name for logs, e.g. `gemini`.
    fn name(&self) -> &str;

    /// Model identifier sent with each request.
    fn model(&self) -> &str;

    /// Runs one completion. Implementations never retry.
    async fn complete(&self, request: &CompletionRequest) -> LlmResult<CompletionResponse>;
}
