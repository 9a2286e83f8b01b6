// Summarizer module
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{prompts, LlmProvider, LlmRequest};
use crate::error::{DispatchError, Result};
use crate::template;

/// Turns trimmed article text into a short, punctuation-terminated summary.
#[derive(Clone)]
pub struct Summarizer {
    provider: Arc<dyn LlmProvider>,
    max_words: usize,
    max_tokens: Option<usize>,
}

impl Summarizer {
    pub fn new(provider: Arc<dyn LlmProvider>, max_words: usize, max_tokens: Option<usize>) -> Self {
        Self {
            provider,
            max_words,
            max_tokens,
        }
    }

    /// Summarize `text`, repairing an unterminated first answer once.
    pub async fn summarize(&self, text: &str) -> Result<String> {
        let max_length = self.max_words.to_string();
        let prompt = template::fill(prompts::SUMMARY, &[("max_length", &max_length), ("text", text)]);

        let summary = self.complete(prompt).await?;
        if is_complete(&summary) {
            info!(chars = summary.len(), "summary generated");
            return Ok(summary);
        }

        warn!(summary = %summary, "summary looks cut off, asking for a revision");
        let repaired = self.repair(&summary).await?;
        if is_complete(&repaired) {
            info!(chars = repaired.len(), "summary repaired");
            Ok(repaired)
        } else {
            Err(DispatchError::IncompleteSummary(repaired))
        }
    }

    async fn repair(&self, summary: &str) -> Result<String> {
        let prompt = template::fill(prompts::REPAIR, &[("summary", summary)]);
        self.complete(prompt).await
    }

    async fn complete(&self, prompt: String) -> Result<String> {
        let request = LlmRequest {
            system: Some(prompts::ASSISTANT_PERSONA.to_string()),
            prompt,
            max_tokens: self.max_tokens,
            temperature: Some(prompts::SUMMARY_TEMPERATURE),
            timeout_seconds: None,
        };

        let response = self.provider.generate(request).await?;
        debug!(
            model = %response.model,
            total_tokens = response.usage.total_tokens,
            "completion received"
        );
        Ok(response.content.trim().to_string())
    }
}

/// A summary is complete when it is non-empty and ends in `.`, `!` or `?`.
pub fn is_complete(summary: &str) -> bool {
    matches!(summary.chars().last(), Some('.' | '!' | '?'))
}
