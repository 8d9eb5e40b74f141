//! AI/LLM provider implementations.
//!
//! A unified completion interface used by the tip generator.
//!
//! # Supported Providers
//!
//! - **Gemini**: Google's Generative Language API (default)
//! - **OpenAI-compatible**: OpenAI, vLLM, LM Studio, Ollama's `/v1` endpoint
//!
//! # Example
//!
//! ```rust,no_run
//! use edugen::providers::ai::{CompletionRequest, GeminiProvider, LlmProvider};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let gemini = GeminiProvider::flash("api-key");
//!
//! let request = CompletionRequest::prompt("Three study tips as JSON").with_json_response();
//!
//! let response = gemini.complete(&request).await?;
//! println!("{}", response.text);
//! # Ok(())
//! # }
//! ```

mod gemini;
mod http;
mod openai;
mod traits;

pub use gemini::{GeminiProvider, GEMINI_BASE_URL, GEMINI_DEFAULT_MODEL};
pub use openai::{OpenAiCompatibleProvider, OPENAI_BASE_URL};
pub use traits::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, LlmError, LlmProvider,
    LlmResult, Role, TokenUsage,
};
