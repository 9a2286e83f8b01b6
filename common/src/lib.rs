/*!
common/src/lib.rs

Shared configuration types and helpers for The Daily Dose.

This file provides:
- Config data structures (deserialized from TOML)
- An async loader for a TOML config file, with default/override merging
- Resolution of provider secrets from environment variables
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// News search provider section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsConfig {
    #[serde(default = "default_news_url")]
    pub api_url: String,
    /// Name of the env var holding the news API key
    #[serde(default = "default_news_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_query")]
    pub query: String,
    pub country: Option<String>,
    pub timeout_seconds: Option<u64>,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            api_url: default_news_url(),
            api_key_env: default_news_key_env(),
            language: default_language(),
            query: default_query(),
            country: None,
            timeout_seconds: None,
        }
    }
}

/// Completion provider section (OpenAI-compatible chat API)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_url")]
    pub api_url: String,
    #[serde(default = "default_llm_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub timeout_seconds: Option<u64>,
    /// Target summary length in words
    #[serde(default = "default_summary_words")]
    pub summary_words: usize,
    pub summary_max_tokens: Option<usize>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: default_llm_url(),
            api_key_env: default_llm_key_env(),
            model: default_model(),
            timeout_seconds: None,
            summary_words: default_summary_words(),
            summary_max_tokens: None,
        }
    }
}

/// Email campaign provider section (Mailchimp)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignConfig {
    #[serde(default = "default_campaign_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_list_id_env")]
    pub list_id_env: String,
    /// Overrides the URL derived from the API key's data center suffix
    pub api_url: Option<String>,
    #[serde(default = "default_subject")]
    pub subject: String,
    #[serde(default = "default_campaign_title")]
    pub title: String,
    #[serde(default = "default_from_name")]
    pub from_name: String,
    pub reply_to: String,
    pub timeout_seconds: Option<u64>,
}

/// Newsletter rendering section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsletterConfig {
    #[serde(default = "default_template_path")]
    pub template_path: String,
    /// chrono strftime pattern used for the `{date}` slot
    #[serde(default = "default_date_format")]
    pub date_format: String,
    /// Used only when no fetched article carried an image
    pub fallback_image_url: Option<String>,
}

impl Default for NewsletterConfig {
    fn default() -> Self {
        Self {
            template_path: default_template_path(),
            date_format: default_date_format(),
            fallback_image_url: None,
        }
    }
}

/// Daily trigger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Wall-clock time in "HH:MM" 24h format
    #[serde(default = "default_time")]
    pub time: String,
    /// IANA zone name, e.g. "US/Central"
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            time: default_time(),
            timezone: default_timezone(),
        }
    }
}

/// HTTP inspection server section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: Option<String>,
    pub port: Option<u16>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: Some("0.0.0.0".to_string()),
            port: Some(3000),
        }
    }
}

/// Top-level application configuration (deserialized from config.toml)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub news: NewsConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    pub campaign: CampaignConfig,
    #[serde(default)]
    pub newsletter: NewsletterConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Config {
    /// Load configuration from a TOML file asynchronously.
    ///
    /// Example:
    ///   let cfg = Config::from_file("config.toml").await?;
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = tokio::fs::read_to_string(path.as_ref())
            .await
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let cfg: Config = toml::from_str(&data).context("Failed to parse TOML configuration")?;
        Ok(cfg)
    }

    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence).
    pub async fn load_with_defaults(default_path: Option<&Path>, override_path: Option<&Path>) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());

        for path in [default_path, override_path].into_iter().flatten() {
            if path.exists() {
                let data = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read config: {}", path.display()))?;
                let val: toml::Value = toml::from_str(&data)
                    .with_context(|| format!("Failed to parse configuration: {}", path.display()))?;
                merge_toml(&mut config_value, val);
            }
        }

        let cfg: Config = config_value.try_into().context("Failed to parse merged configuration")?;
        Ok(cfg)
    }

    /// Timeout applied to news API calls.
    pub fn news_timeout(&self) -> Duration {
        Duration::from_secs(self.news.timeout_seconds.unwrap_or(30))
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm.timeout_seconds.unwrap_or(60))
    }

    pub fn campaign_timeout(&self) -> Duration {
        Duration::from_secs(self.campaign.timeout_seconds.unwrap_or(30))
    }
}

/// Read a secret from the named environment variable.
pub fn resolve_env(var: &str) -> Result<String> {
    let value = std::env::var(var).with_context(|| format!("env var '{}' not set", var))?;
    if value.trim().is_empty() {
        anyhow::bail!("env var '{}' is empty", var);
    }
    Ok(value)
}

fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}

fn default_news_url() -> String {
    "https://newsdata.io/api/1/news".to_string()
}

fn default_news_key_env() -> String {
    "NEWS_API_KEY".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_query() -> String {
    "top".to_string()
}

fn default_llm_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_llm_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_summary_words() -> usize {
    100
}

fn default_campaign_key_env() -> String {
    "MAILCHIMP_API_KEY".to_string()
}

fn default_list_id_env() -> String {
    "MAILCHIMP_LIST_ID".to_string()
}

fn default_subject() -> String {
    "Your Daily Dose".to_string()
}

fn default_campaign_title() -> String {
    "Daily Dose Campaign".to_string()
}

fn default_from_name() -> String {
    "The Daily Dose".to_string()
}

fn default_template_path() -> String {
    "email_template/index.html".to_string()
}

fn default_date_format() -> String {
    "%A, %B %-d, %Y".to_string()
}

fn default_time() -> String {
    "07:00".to_string()
}

fn default_timezone() -> String {
    "US/Central".to_string()
}
