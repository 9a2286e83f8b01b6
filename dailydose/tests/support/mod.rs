#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use dailydose::campaign::{CampaignDispatcher, CampaignProvider, CampaignSettings};
use dailydose::ingestion::{Article, NewsSource};
use dailydose::llm::intro::IntroComposer;
use dailydose::llm::summarizer::Summarizer;
use dailydose::llm::{LlmProvider, LlmRequest, LlmResponse, UsageMetadata};
use dailydose::newsletter::NewsletterRenderer;
use dailydose::workflow::DailyDispatchWorkflow;
use dailydose::DispatchError;

pub fn article(title: &str, content: &str, image_url: Option<&str>) -> Article {
    Article {
        title: title.to_string(),
        content: content.to_string(),
        image_url: image_url.map(str::to_string),
    }
}

/// News source returning a fixed batch, or a fixed failure.
pub struct StubNews {
    pub articles: Vec<Article>,
    pub fail_with_status: Option<u16>,
}

#[async_trait::async_trait]
impl NewsSource for StubNews {
    async fn fetch(&self) -> dailydose::Result<Vec<Article>> {
        match self.fail_with_status {
            Some(status) => Err(DispatchError::fetch(Some(status), "stub failure")),
            None => Ok(self.articles.clone()),
        }
    }
}

/// Replays canned completions in order; an `Err` entry fails that call.
pub struct ScriptedLlm {
    answers: Mutex<VecDeque<Result<String, String>>>,
    pub requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedLlm {
    pub fn new(answers: Vec<Result<&str, &str>>) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(
                answers
                    .into_iter()
                    .map(|a| a.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn ok(answers: &[&str]) -> Arc<Self> {
        Self::new(answers.iter().map(|a| Ok(*a)).collect())
    }
}

#[async_trait::async_trait]
impl LlmProvider for ScriptedLlm {
    async fn generate(&self, request: LlmRequest) -> anyhow::Result<LlmResponse> {
        self.requests.lock().unwrap().push(request);
        let next = self
            .answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err("script exhausted".to_string()));
        match next {
            Ok(content) => Ok(LlmResponse {
                content,
                usage: UsageMetadata::default(),
                model: "scripted".to_string(),
            }),
            Err(message) => Err(anyhow::anyhow!(message)),
        }
    }
}

/// Campaign provider that records every call.
#[derive(Default)]
pub struct RecordingCampaign {
    pub calls: Mutex<Vec<String>>,
    pub html: Mutex<Option<String>>,
    pub fail_send: bool,
}

impl RecordingCampaign {
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl CampaignProvider for RecordingCampaign {
    async fn create_campaign(&self, _settings: &CampaignSettings) -> anyhow::Result<String> {
        self.calls.lock().unwrap().push("create".to_string());
        Ok("cmp-1".to_string())
    }

    async fn set_content(&self, campaign_id: &str, html: &str) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(format!("content:{}", campaign_id));
        *self.html.lock().unwrap() = Some(html.to_string());
        Ok(())
    }

    async fn send(&self, campaign_id: &str) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(format!("send:{}", campaign_id));
        if self.fail_send {
            anyhow::bail!("provider rejected send");
        }
        Ok(())
    }
}

pub fn settings() -> CampaignSettings {
    CampaignSettings {
        list_id: "list-1".to_string(),
        subject: "Your Daily Dose".to_string(),
        title: "Daily Dose Campaign".to_string(),
        from_name: "The Daily Dose".to_string(),
        reply_to: "editor@example.com".to_string(),
    }
}

pub const FLAT_TEMPLATE: &str = "{date}{intro_paragraph}{image_url}{content}";

pub fn workflow(
    news: Arc<dyn NewsSource>,
    llm: Arc<dyn LlmProvider>,
    campaign: Arc<dyn CampaignProvider>,
) -> DailyDispatchWorkflow {
    DailyDispatchWorkflow::new(
        news,
        Summarizer::new(llm.clone(), 100, Some(100)),
        IntroComposer::new(llm),
        NewsletterRenderer::new(FLAT_TEMPLATE, "%Y-%m-%d").unwrap(),
        CampaignDispatcher::new(campaign, settings()),
        chrono_tz::US::Central,
    )
}
