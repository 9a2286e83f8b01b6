use anyhow::{Context, Result as AnyResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::error::{CampaignStage, DispatchError, Result};

/// Fixed metadata of every campaign this service sends.
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignSettings {
    pub list_id: String,
    pub subject: String,
    pub title: String,
    pub from_name: String,
    pub reply_to: String,
}

/// The three calls of an email-campaign provider.
#[async_trait::async_trait]
pub trait CampaignProvider: Send + Sync {
    /// Create a campaign and return its provider id.
    async fn create_campaign(&self, settings: &CampaignSettings) -> AnyResult<String>;
    async fn set_content(&self, campaign_id: &str, html: &str) -> AnyResult<()>;
    async fn send(&self, campaign_id: &str) -> AnyResult<()>;
}

/// Creates, fills and sends one campaign per dispatch.
#[derive(Clone)]
pub struct CampaignDispatcher {
    provider: Arc<dyn CampaignProvider>,
    settings: CampaignSettings,
}

impl CampaignDispatcher {
    pub fn new(provider: Arc<dyn CampaignProvider>, settings: CampaignSettings) -> Self {
        Self { provider, settings }
    }

    /// Returns the id of the sent campaign.
    ///
    /// There is no rollback: a campaign created before a later step fails is
    /// left at the provider and its id is logged.
    pub async fn dispatch(&self, html: &str) -> Result<String> {
        let campaign_id = self
            .provider
            .create_campaign(&self.settings)
            .await
            .map_err(|e| DispatchError::campaign(CampaignStage::Create, None, format!("{:#}", e)))?;
        info!(campaign_id = %campaign_id, "campaign created");

        if let Err(e) = self.provider.set_content(&campaign_id, html).await {
            error!(campaign_id = %campaign_id, "campaign left without content");
            return Err(DispatchError::campaign(
                CampaignStage::SetContent,
                Some(&campaign_id),
                format!("{:#}", e),
            ));
        }

        if let Err(e) = self.provider.send(&campaign_id).await {
            error!(campaign_id = %campaign_id, "campaign filled but not sent");
            return Err(DispatchError::campaign(
                CampaignStage::Send,
                Some(&campaign_id),
                format!("{:#}", e),
            ));
        }

        info!(campaign_id = %campaign_id, bytes = html.len(), "campaign send triggered");
        Ok(campaign_id)
    }
}

/// Mailchimp Marketing API v3 client.
pub struct MailchimpClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl MailchimpClient {
    /// `base_url` overrides the URL derived from the key's data-center suffix (`...-us21`).
    pub fn new(api_key: impl Into<String>, base_url: Option<String>, timeout: Duration) -> AnyResult<Self> {
        let api_key = api_key.into();
        let base_url = match base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => {
                let dc = api_key
                    .rsplit_once('-')
                    .map(|(_, dc)| dc)
                    .filter(|dc| !dc.is_empty())
                    .context("Mailchimp API key has no data-center suffix and no api_url is configured")?;
                format!("https://{}.api.mailchimp.com/3.0", dc)
            }
        };

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            base_url,
            api_key,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn check(response: reqwest::Response, what: &str) -> AnyResult<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("Mailchimp {} error {}: {}", what, status, body)
    }
}

#[async_trait::async_trait]
impl CampaignProvider for MailchimpClient {
    async fn create_campaign(&self, settings: &CampaignSettings) -> AnyResult<String> {
        let body = CreateCampaign {
            kind: "regular",
            recipients: Recipients {
                list_id: &settings.list_id,
            },
            settings: Settings {
                subject_line: &settings.subject,
                title: &settings.title,
                from_name: &settings.from_name,
                reply_to: &settings.reply_to,
            },
        };

        let response = self
            .client
            .post(format!("{}/campaigns", self.base_url))
            .basic_auth("dailydose", Some(&self.api_key))
            .json(&body)
            .send()
            .await
            .context("Mailchimp create request failed")?;

        let created: CreatedCampaign = Self::check(response, "create")
            .await?
            .json()
            .await
            .context("Failed to parse Mailchimp create response")?;
        Ok(created.id)
    }

    async fn set_content(&self, campaign_id: &str, html: &str) -> AnyResult<()> {
        let response = self
            .client
            .put(format!("{}/campaigns/{}/content", self.base_url, campaign_id))
            .basic_auth("dailydose", Some(&self.api_key))
            .json(&CampaignContent { html })
            .send()
            .await
            .context("Mailchimp content request failed")?;
        Self::check(response, "set-content").await?;
        Ok(())
    }

    async fn send(&self, campaign_id: &str) -> AnyResult<()> {
        let response = self
            .client
            .post(format!("{}/campaigns/{}/actions/send", self.base_url, campaign_id))
            .basic_auth("dailydose", Some(&self.api_key))
            .send()
            .await
            .context("Mailchimp send request failed")?;
        Self::check(response, "send").await?;
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct CreateCampaign<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    recipients: Recipients<'a>,
    settings: Settings<'a>,
}

#[derive(Debug, Serialize)]
struct Recipients<'a> {
    list_id: &'a str,
}

#[derive(Debug, Serialize)]
struct Settings<'a> {
    subject_line: &'a str,
    title: &'a str,
    from_name: &'a str,
    reply_to: &'a str,
}

#[derive(Debug, Serialize)]
struct CampaignContent<'a> {
    html: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreatedCampaign {
    id: String,
}
