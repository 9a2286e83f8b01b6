use std::sync::Arc;
use tracing::info;

use super::{prompts, LlmProvider, LlmRequest};
use crate::error::{DispatchError, Result};
use crate::template;

/// Writes the introductory paragraph of the newsletter from the day's summaries.
#[derive(Clone)]
pub struct IntroComposer {
    provider: Arc<dyn LlmProvider>,
}

impl IntroComposer {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    pub async fn compose(&self, summaries: &[String]) -> Result<String> {
        if summaries.is_empty() {
            return Err(DispatchError::EmptyDigest);
        }

        let headlines = bullet_list(summaries);
        let prompt = template::fill(prompts::INTRO, &[("headlines", &headlines)]);

        let response = self
            .provider
            .generate(LlmRequest {
                system: Some(prompts::EDITOR_PERSONA.to_string()),
                prompt,
                max_tokens: None,
                temperature: Some(prompts::INTRO_TEMPERATURE),
                timeout_seconds: None,
            })
            .await?;

        let intro = response.content.trim().to_string();
        info!(chars = intro.len(), stories = summaries.len(), "intro paragraph composed");
        Ok(intro)
    }
}

fn bullet_list(summaries: &[String]) -> String {
    summaries
        .iter()
        .map(|s| format!("- {}", s))
        .collect::<Vec<_>>()
        .join("\n")
}
