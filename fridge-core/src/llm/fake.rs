//! Fake LLM provider for testing.
//!
//! Returns queued responses in order, then falls back to substring-matched
//! responses, then to an optional default. Every request is recorded so tests
//! can inspect the prompts that were sent.

use super::{CompletionRequest, LlmError, LlmProvider};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

#[derive(Debug)]
pub struct FakeProvider {
    /// Responses handed out once each, in order, before any matching
    queued: Mutex<VecDeque<Result<String, String>>>,
    /// (prompt substring, response), checked in registration order
    responses: Vec<(String, String)>,
    default_response: Option<String>,
    received: Mutex<Vec<CompletionRequest>>,
}

impl Default for FakeProvider {
    fn default() -> Self {
        Self {
            queued: Mutex::new(VecDeque::new()),
            responses: Vec::new(),
            default_response: Some(r#"{"ingredients": [], "recipes": []}"#.to_string()),
            received: Mutex::new(Vec::new()),
        }
    }
}

impl FakeProvider {
    /// Create a FakeProvider with no responses at all.
    pub fn new() -> Self {
        Self {
            default_response: None,
            ..Self::default()
        }
    }

    /// Create a FakeProvider that returns a specific response for prompts containing a substring.
    pub fn with_response(prompt_contains: &str, response: &str) -> Self {
        let mut provider = Self::new();
        provider.add_response(prompt_contains, response);
        provider
    }

    /// Add a response for prompts containing a specific substring.
    pub fn add_response(&mut self, prompt_contains: &str, response: &str) {
        self.responses
            .push((prompt_contains.to_string(), response.to_string()));
    }

    /// Set the default response when nothing is queued and no pattern matches.
    pub fn with_default_response(mut self, response: &str) -> Self {
        self.default_response = Some(response.to_string());
        self
    }

    /// Queue a response for the next unanswered call.
    pub fn push_response(&self, response: impl Into<String>) {
        self.queue().push_back(Ok(response.into()));
    }

    /// Queue a transport failure for the next unanswered call.
    pub fn push_failure(&self, message: impl Into<String>) {
        self.queue().push_back(Err(message.into()));
    }

    /// Every request received so far.
    pub fn received(&self) -> Vec<CompletionRequest> {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn queue(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<String, String>>> {
        self.queued.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl LlmProvider for FakeProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        if let Some(next) = self.queue().pop_front() {
            return next.map_err(LlmError::RequestFailed);
        }

        // Find first matching pattern (case-insensitive)
        let prompt_lower = request.prompt.to_lowercase();
        for (pattern, response) in &self.responses {
            if prompt_lower.contains(&pattern.to_lowercase()) {
                return Ok(response.clone());
            }
        }

        match &self.default_response {
            Some(response) => Ok(response.clone()),
            None => Err(LlmError::RequestFailed(format!(
                "FakeProvider: No response configured for prompt (first 100 chars): {}",
                request.prompt.chars().take(100).collect::<String>()
            ))),
        }
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }

    fn model_name(&self) -> &str {
        "fake-model"
    }
}
