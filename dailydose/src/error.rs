use std::fmt;

use thiserror::Error;

/// Provider call that failed while dispatching a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampaignStage {
    Create,
    SetContent,
    Send,
}

impl fmt::Display for CampaignStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CampaignStage::Create => "create",
            CampaignStage::SetContent => "set-content",
            CampaignStage::Send => "send",
        };
        f.write_str(name)
    }
}

/// Failure of one stage of the daily dispatch pipeline.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("news fetch failed{}: {message}", .status.map(|s| format!(" with status {}", s)).unwrap_or_default())]
    UpstreamFetch { status: Option<u16>, message: String },

    #[error("completion request failed: {0}")]
    UpstreamGeneration(#[from] anyhow::Error),

    #[error("summary still incomplete after repair: {0:?}")]
    IncompleteSummary(String),

    #[error("no image URLs collected for this batch")]
    EmptyImagePool,

    #[error("no article produced a usable summary")]
    EmptyDigest,

    #[error("campaign {stage} failed{}: {message}", .campaign_id.as_ref().map(|id| format!(" (campaign {})", id)).unwrap_or_default())]
    CampaignDispatch {
        stage: CampaignStage,
        campaign_id: Option<String>,
        message: String,
    },

    #[error("template error: {0}")]
    Template(String),
}

impl DispatchError {
    pub fn fetch(status: Option<u16>, message: impl Into<String>) -> Self {
        DispatchError::UpstreamFetch {
            status,
            message: message.into(),
        }
    }

    pub fn campaign(stage: CampaignStage, campaign_id: Option<&str>, message: impl fmt::Display) -> Self {
        DispatchError::CampaignDispatch {
            stage,
            campaign_id: campaign_id.map(str::to_string),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DispatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_mentions_status() {
        let err = DispatchError::fetch(Some(500), "internal error");
        assert_eq!(err.to_string(), "news fetch failed with status 500: internal error");

        let err = DispatchError::fetch(None, "connection refused");
        assert_eq!(err.to_string(), "news fetch failed: connection refused");
    }

    #[test]
    fn campaign_error_names_stage_and_orphan() {
        let err = DispatchError::campaign(CampaignStage::SetContent, Some("abc123"), "bad gateway");
        assert_eq!(
            err.to_string(),
            "campaign set-content failed (campaign abc123): bad gateway"
        );
    }
}
