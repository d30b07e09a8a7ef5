//! The generative-service boundary.
//!
//! Every pipeline component talks to the external completion service
//! through the [`TextGen`] trait: one blocking round trip per call, no
//! retries. The JSON variant tolerates responses wrapped in a fenced
//! code block, which some models emit even when told not to.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from a generation round trip.
#[derive(Debug, Error)]
pub enum GenError {
    #[error("completion API error: {0}")]
    Api(#[from] openai::Error),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// A text-completion backend.
///
/// Implementations make exactly one attempt per call; a failed round
/// trip is fatal to the enclosing operation.
#[async_trait]
pub trait TextGen: Send + Sync {
    /// Send one system + user prompt pair and return the raw text.
    async fn complete_text(&self, system: &str, user: &str) -> Result<String, GenError>;

    /// Send one prompt pair and parse the response as JSON.
    ///
    /// Strips a surrounding fenced code block (with an optional `json`
    /// language tag) before parsing. Anything that is not valid JSON
    /// after stripping is a [`GenError::Schema`].
    async fn complete_json(
        &self,
        system: &str,
        user: &str,
    ) -> Result<serde_json::Value, GenError> {
        let raw = self.complete_text(system, user).await?;
        let body = strip_code_fence(&raw);
        serde_json::from_str(body)
            .map_err(|e| GenError::Schema(format!("response is not valid JSON: {e}")))
    }
}

#[async_trait]
impl TextGen for openai::OpenAi {
    async fn complete_text(&self, system: &str, user: &str) -> Result<String, GenError> {
        let request = openai::Request::new(vec![openai::Message::user(user)]).with_system(system);
        let response = self.complete(request).await?;
        Ok(response.text().to_string())
    }
}

/// Remove a surrounding ``` fence and an optional leading `json` tag.
///
/// Text without a fence is returned trimmed and otherwise untouched, so
/// a fenced response parses identically to its unfenced equivalent.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}
