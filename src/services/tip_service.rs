//! Advisory tips from an LLM, with a fixed fallback.
//!
//! Tips are decoration. [`TipService::get_tips`] never fails: any problem with
//! the generation call or its output yields [`fallback_tips`].

use std::sync::Arc;

use crate::domain::Tip;
use crate::providers::ai::{CompletionRequest, LlmProvider};

/// Category used when none is configured.
pub const DEFAULT_TIP_CATEGORY: &str = "student software discounts";

/// Number of tips returned by every call.
pub const TIP_COUNT: usize = 3;

/// The tips shown when generation is unavailable or fails.
pub fn fallback_tips() -> Vec<Tip> {
    vec![
        Tip::new(
            "Developer Tools",
            "Unlock free developer tools and cloud credits with an academic identity.",
        ),
        Tip::new(
            "Software Discounts",
            "Get significant discounts on creative suites and productivity software.",
        ),
        Tip::new(
            "Research Access",
            "Access scholarly journals and library resources typically restricted to students.",
        ),
    ]
}

/// Prompt sent for a category.
pub fn tip_prompt(category: &str) -> String {
    format!(
        "Provide 3 concise, professional tips about using educational email addresses for \
         {category}. Focus on student benefits like GitHub Student Pack, Notion Pro, or \
         academic research software. Format as a JSON array of objects with 'title' and \
         'description'."
    )
}

/// Removes a surrounding Markdown code fence, if any.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    // Drop the info string (e.g. `json`) on the opening line.
    let body = match rest.split_once('\n') {
        Some((_, body)) => body,
        None => rest.strip_prefix("json").unwrap_or(rest),
    };
    body.trim()
}

/// Parses model output into exactly [`TIP_COUNT`] tips.
///
/// Extra tips are dropped; fewer tips, or anything that is not a JSON array
/// of `{title, description}` objects, gives `None`.
pub fn parse_tips(text: &str) -> Option<Vec<Tip>> {
    let mut tips: Vec<Tip> = serde_json::from_str(strip_code_fence(text)).ok()?;
    if tips.len() < TIP_COUNT {
        return None;
    }
    tips.truncate(TIP_COUNT);
    Some(tips)
}

/// Generates tips through an optional LLM provider.
#[derive(Clone, Default)]
pub struct TipService {
    provider: Option<Arc<dyn LlmProvider>>,
}

impl TipService {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    /// A service that always returns the fallback.
    pub fn offline() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    /// Returns three tips for `category`. Makes at most one request.
    pub async fn get_tips(&self, category: &str) -> Vec<Tip> {
        let Some(provider) = &self.provider else {
            tracing::debug!("no tip provider configured, using fallback");
            return fallback_tips();
        };

        let request = CompletionRequest::prompt(tip_prompt(category)).with_json_response();

        let response = match provider.complete(&request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(provider = provider.name(), error = %e, "tip generation failed");
                return fallback_tips();
            }
        };

        match parse_tips(&response.text) {
            Some(tips) => {
                tracing::debug!(provider = provider.name(), model = provider.model(), "tips generated");
                tips
            }
            None => {
                tracing::warn!(provider = provider.name(), "unusable tip response, using fallback");
                fallback_tips()
            }
        }
    }
}
