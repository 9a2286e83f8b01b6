use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

use crate::error::{DispatchError, Result};

/// A news article as returned by the search API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Article {
    /// Title and body joined the way they are fed to the trimmer.
    pub fn text(&self) -> String {
        format!("{}\n{}", self.title, self.content)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Article>,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Source of the day's raw articles.
#[async_trait::async_trait]
pub trait NewsSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Article>>;
}

/// Query parameters for the news search endpoint.
#[derive(Debug, Clone)]
pub struct NewsQuery {
    pub language: String,
    pub query: String,
    pub country: Option<String>,
}

impl Default for NewsQuery {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            query: "top".to_string(),
            country: None,
        }
    }
}

/// Client for a newsdata.io-style search API.
pub struct NewsDataClient {
    api_url: String,
    api_key: String,
    query: NewsQuery,
    client: Client,
}

impl NewsDataClient {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        query: NewsQuery,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("DailyDose/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build reqwest client: {}", e))?;

        Ok(Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            query,
            client,
        })
    }

    fn request_url(&self) -> Result<Url> {
        let mut params = vec![
            ("language", self.query.language.as_str()),
            ("q", self.query.query.as_str()),
            ("apikey", self.api_key.as_str()),
        ];
        if let Some(country) = &self.query.country {
            params.push(("country", country.as_str()));
        }

        Url::parse_with_params(&self.api_url, &params)
            .map_err(|e| DispatchError::fetch(None, format!("invalid news API URL: {}", e)))
    }
}

#[async_trait::async_trait]
impl NewsSource for NewsDataClient {
    /// Single attempt: any failure is reported to the caller, nothing is retried.
    async fn fetch(&self) -> Result<Vec<Article>> {
        let url = self.request_url()?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DispatchError::fetch(None, format!("network error: {}", e)))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "news API returned an error");
            return Err(DispatchError::fetch(Some(status.as_u16()), body));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| DispatchError::fetch(Some(status.as_u16()), format!("invalid response body: {}", e)))?;

        info!(count = body.results.len(), "fetched news articles");
        Ok(body.results)
    }
}
