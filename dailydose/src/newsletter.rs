use anyhow::Context;
use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDate;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::path::Path;

use crate::error::{DispatchError, Result};
use crate::ingestion::Article;
use crate::template;

/// Everything the template needs for one dispatch.
#[derive(Debug, Clone, Serialize)]
pub struct NewsletterContent {
    pub date: String,
    pub intro: String,
    pub image_url: String,
    pub summaries: Vec<String>,
}

/// Image URLs collected from the current batch of articles.
#[derive(Debug, Clone, Default)]
pub struct ImagePool {
    urls: Vec<String>,
}

impl ImagePool {
    pub fn from_articles(articles: &[Article]) -> Self {
        let urls = articles
            .iter()
            .filter_map(|a| a.image_url.as_deref())
            .filter(|u| !u.trim().is_empty())
            .map(str::to_string)
            .collect();
        Self { urls }
    }

    pub fn push(&mut self, url: impl Into<String>) {
        self.urls.push(url.into());
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Pick one URL uniformly at random.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<&str> {
        self.urls
            .choose(rng)
            .map(String::as_str)
            .ok_or(DispatchError::EmptyImagePool)
    }
}

/// Fills the HTML newsletter template.
///
/// Recognised slots: `{date}`, `{intro_paragraph}`, `{image_url}` and `{content}`.
#[derive(Debug, Clone)]
pub struct NewsletterRenderer {
    template: String,
    date_format: String,
}

impl NewsletterRenderer {
    pub fn new(template: impl Into<String>, date_format: impl Into<String>) -> Result<Self> {
        let date_format = date_format.into();
        if StrftimeItems::new(&date_format).any(|item| matches!(item, Item::Error)) {
            return Err(DispatchError::Template(format!(
                "invalid date format '{}'",
                date_format
            )));
        }

        Ok(Self {
            template: template.into(),
            date_format,
        })
    }

    /// Read the template from disk.
    pub async fn load(path: impl AsRef<Path>, date_format: &str) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let template = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read newsletter template: {}", path.display()))?;
        Ok(Self::new(template, date_format)?)
    }

    pub fn format_date(&self, date: NaiveDate) -> String {
        date.format(&self.date_format).to_string()
    }

    pub fn render(&self, content: &NewsletterContent) -> String {
        let list = summary_list(&content.summaries);
        // feed-supplied, lands inside a quoted attribute
        let image_url = escape_html(&content.image_url);
        template::fill(
            &self.template,
            &[
                ("date", &content.date),
                ("intro_paragraph", &content.intro),
                ("image_url", &image_url),
                ("content", &list),
            ],
        )
    }
}

/// `<ul>` with one `<li>` per summary, in order.
pub fn summary_list(summaries: &[String]) -> String {
    let items: String = summaries
        .iter()
        .map(|s| format!("<li>{}</li>", escape_html(s)))
        .collect();
    format!("<ul>{}</ul>", items)
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
