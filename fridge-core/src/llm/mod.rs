//! Text-generation provider abstraction.
//!
//! The recipe source talks to a hosted model through [`LlmProvider`], so the
//! model vendor can be swapped and tests can run against [`FakeProvider`]
//! without network access.

mod fake;
mod gemini;

pub use fake::FakeProvider;
pub use gemini::GeminiProvider;

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Default text model for the hosted provider.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Error type for LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("API returned error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Rate limited, retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

/// A single completion call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub temperature: Option<f32>,
    /// Ask the provider for a JSON-only response.
    pub json_response: bool,
}

impl CompletionRequest {
    pub fn json(prompt: impl Into<String>, temperature: f32) -> Self {
        Self {
            prompt: prompt.into(),
            temperature: Some(temperature),
            json_response: true,
        }
    }
}

/// Trait for LLM providers.
///
/// Implementations should be stateless and thread-safe. Each call is atomic:
/// it either returns the model's text or an error. Timeouts and transport
/// retries are the provider's own business.
#[async_trait]
pub trait LlmProvider: Send + Sync + fmt::Debug {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;

    /// Get the provider name (e.g., "gemini", "fake").
    fn provider_name(&self) -> &'static str;

    fn model_name(&self) -> &str;
}

#[async_trait]
impl<P: LlmProvider + ?Sized> LlmProvider for Arc<P> {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        (**self).complete(request).await
    }

    fn provider_name(&self) -> &'static str {
        (**self).provider_name()
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

/// Build the provider selected by the environment.
///
/// - `FRIDGE_LLM_PROVIDER`: "fake" (default) | "gemini"
/// - `FRIDGE_LLM_MODEL`: model name (default: gemini-2.5-flash)
/// - `GEMINI_API_KEY` or `GOOGLE_API_KEY`: required for gemini
pub fn create_provider_from_env() -> Result<Box<dyn LlmProvider>, LlmError> {
    let provider = std::env::var("FRIDGE_LLM_PROVIDER").unwrap_or_else(|_| "fake".to_string());

    match provider.as_str() {
        "fake" => Ok(Box::new(FakeProvider::default())),
        "gemini" => {
            let api_key = std::env::var("GEMINI_API_KEY")
                .or_else(|_| std::env::var("GOOGLE_API_KEY"))
                .map(|k| k.trim().to_string())
                .ok()
                .filter(|k| !k.is_empty())
                .ok_or_else(|| {
                    LlmError::NotConfigured("GEMINI_API_KEY or GOOGLE_API_KEY not set".to_string())
                })?;
            let model = std::env::var("FRIDGE_LLM_MODEL")
                .map(|m| m.trim().to_string())
                .unwrap_or_else(|_| DEFAULT_MODEL.to_string());
            Ok(Box::new(GeminiProvider::new(api_key, model)))
        }
        other => Err(LlmError::NotConfigured(format!(
            "Unknown provider: {}",
            other
        ))),
    }
}
