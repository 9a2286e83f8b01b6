//! The daily dispatch pipeline.
//!
//! FETCH -> TRIM_AND_SUMMARIZE (per article) -> COMPOSE_INTRO -> RENDER -> DISPATCH.
//!
//! Every run owns its state (articles, summaries, image pool); nothing is
//! cached between runs, so the scheduler and the inspection endpoints can
//! invoke the workflow independently.

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::campaign::CampaignDispatcher;
use crate::error::{DispatchError, Result};
use crate::ingestion::{Article, NewsSource};
use crate::llm::intro::IntroComposer;
use crate::llm::summarizer::Summarizer;
use crate::newsletter::{ImagePool, NewsletterContent, NewsletterRenderer};
use crate::trimming::trim_article;

/// Per-article summaries of one run, in article order.
#[derive(Debug, Clone, Default)]
pub struct Digest {
    pub summaries: Vec<String>,
    /// Articles dropped because their summary could not be produced
    pub skipped: usize,
}

/// A rendered newsletter that has not been sent.
#[derive(Debug, Clone)]
pub struct Preview {
    pub content: NewsletterContent,
    pub html: String,
    pub articles: usize,
    pub skipped: usize,
}

/// Outcome of a successful dispatch run.
#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub run_id: Uuid,
    pub campaign_id: String,
    pub articles: usize,
    pub summaries: usize,
    pub skipped: usize,
    pub html: String,
}

pub struct DailyDispatchWorkflow {
    news: Arc<dyn NewsSource>,
    summarizer: Summarizer,
    intro: IntroComposer,
    renderer: NewsletterRenderer,
    dispatcher: CampaignDispatcher,
    fallback_image_url: Option<String>,
    timezone: Tz,
}

impl DailyDispatchWorkflow {
    pub fn new(
        news: Arc<dyn NewsSource>,
        summarizer: Summarizer,
        intro: IntroComposer,
        renderer: NewsletterRenderer,
        dispatcher: CampaignDispatcher,
        timezone: Tz,
    ) -> Self {
        Self {
            news,
            summarizer,
            intro,
            renderer,
            dispatcher,
            fallback_image_url: None,
            timezone,
        }
    }

    /// Image used when no fetched article carries one.
    pub fn with_fallback_image(mut self, url: Option<String>) -> Self {
        self.fallback_image_url = url;
        self
    }

    /// Today's calendar date in the newsletter's time zone.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.timezone).date_naive()
    }

    pub async fn fetch_news(&self) -> Result<Vec<Article>> {
        self.news.fetch().await
    }

    /// Trim and summarize each article. Failures are logged and skipped.
    pub async fn summarize_articles(&self, articles: &[Article]) -> Digest {
        let mut digest = Digest {
            summaries: Vec::with_capacity(articles.len()),
            skipped: 0,
        };

        for (i, article) in articles.iter().enumerate() {
            let text = trim_article(&article.text());
            match self.summarizer.summarize(&text).await {
                Ok(summary) => digest.summaries.push(summary),
                Err(e) => {
                    warn!(article = i, title = %article.title, error = %e, "skipping article");
                    digest.skipped += 1;
                }
            }
        }

        info!(
            summaries = digest.summaries.len(),
            skipped = digest.skipped,
            "articles summarized"
        );
        digest
    }

    /// Fetch and summarize today's news.
    pub async fn build_digest(&self) -> Result<(Vec<Article>, Digest)> {
        let articles = self.fetch_news().await?;
        let digest = self.summarize_articles(&articles).await;
        Ok((articles, digest))
    }

    /// Run every stage except the campaign dispatch.
    pub async fn preview_for_date(&self, date: NaiveDate) -> Result<Preview> {
        let (articles, digest) = self.build_digest().await?;
        if digest.summaries.is_empty() {
            return Err(DispatchError::EmptyDigest);
        }

        let mut pool = ImagePool::from_articles(&articles);
        if pool.is_empty() {
            if let Some(url) = &self.fallback_image_url {
                warn!("no article images in this batch, using fallback image");
                pool.push(url.clone());
            }
        }
        let image_url = pool.choose(&mut rand::thread_rng())?.to_string();

        let intro = self.intro.compose(&digest.summaries).await?;

        let content = NewsletterContent {
            date: self.renderer.format_date(date),
            intro,
            image_url,
            summaries: digest.summaries,
        };
        let html = self.renderer.render(&content);

        Ok(Preview {
            content,
            html,
            articles: articles.len(),
            skipped: digest.skipped,
        })
    }

    /// Full pipeline for `date`, ending with the campaign send.
    pub async fn run_for_date(&self, date: NaiveDate) -> Result<DispatchReport> {
        let run_id = Uuid::new_v4();
        let span = info_span!("dispatch", run_id = %run_id, date = %date);

        async move {
            info!("dispatch run started");
            let result = self.dispatch(run_id, date).await;
            match &result {
                Ok(report) => info!(
                    campaign_id = %report.campaign_id,
                    summaries = report.summaries,
                    skipped = report.skipped,
                    "dispatch run finished"
                ),
                Err(e) => error!(error = %e, "dispatch run failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    /// Full pipeline for today's date.
    pub async fn run(&self) -> Result<DispatchReport> {
        self.run_for_date(self.today()).await
    }

    async fn dispatch(&self, run_id: Uuid, date: NaiveDate) -> Result<DispatchReport> {
        let preview = self.preview_for_date(date).await?;
        let campaign_id = self.dispatcher.dispatch(&preview.html).await?;

        Ok(DispatchReport {
            run_id,
            campaign_id,
            articles: preview.articles,
            summaries: preview.content.summaries.len(),
            skipped: preview.skipped,
            html: preview.html,
        })
    }
}
