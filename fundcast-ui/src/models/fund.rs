//! Fund, podcast and report viewpoint models
//!
//! Mirrors the JSON shapes the fund-research backend serves. The backend
//! wraps every payload in a `{"data": ...}` envelope; the client unwraps
//! it before these types are handed around.

use serde::{Deserialize, Serialize};

/// A fund on the device's watch-list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundWatchItem {
    /// Fund code (unique identifier, e.g. "008272")
    pub code: String,
    /// Fund display name
    pub name: String,
    /// Extended registered name
    pub full_name: Option<String>,
    /// Fund manager name
    pub manager: Option<String>,
    /// Fund category (equity, bond, mixed, ...)
    pub fund_type: Option<String>,
    /// Managing company
    pub fund_company: Option<String>,
    /// Podcasts generated for this fund
    #[serde(default)]
    pub podcasts: Vec<PodcastItem>,
}

/// A generated (or generating) podcast for one fund and report period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodcastItem {
    pub id: i64,
    pub fund_code: String,
    pub report_period: String,
    pub title: Option<String>,
    pub audio_url: Option<String>,
    /// Audio duration in seconds
    pub duration: Option<f64>,
    #[serde(default)]
    pub transcript: Option<Vec<TranscriptItem>>,
    /// Generation job status: pending | generating | completed | failed
    pub status: String,
    pub error_msg: Option<String>,
}

/// One timed line of a podcast transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptItem {
    /// Offset into the audio in seconds
    pub time: f64,
    pub speaker: String,
    pub text: String,
}

/// Fund metadata attached to a report viewpoint response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundInfo {
    pub name: Option<String>,
    pub manager: Option<String>,
}

/// One quarter's report viewpoint for one fund
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportViewpoint {
    pub fund_code: String,
    pub report_period: String,
    pub viewpoint: Option<String>,
    pub fund_info: Option<FundInfo>,
}

/// Outcome of a bulk fund import by code list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchImportOutcome {
    #[serde(default)]
    pub success: Vec<ImportedFund>,
    #[serde(default)]
    pub failed: Vec<RejectedFund>,
}

/// A fund code the bulk import accepted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportedFund {
    pub code: String,
    pub name: Option<String>,
    pub reason: Option<String>,
}

/// A fund code the bulk import rejected
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectedFund {
    pub code: String,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fund_watch_item_deserializes_without_podcasts() {
        let json = r#"{"code":"008272","name":"Growth Fund","full_name":null,
                       "manager":"A. Chen","fund_type":"equity","fund_company":null}"#;

        let fund: FundWatchItem = serde_json::from_str(json).unwrap();

        assert_eq!(fund.code, "008272");
        assert!(fund.podcasts.is_empty());
    }

    #[test]
    fn test_report_viewpoint_unwraps_optional_fund_info() {
        let json = r#"{"fund_code":"008272","report_period":"2024Q4",
                       "viewpoint":"Positioned for rate cuts.",
                       "fund_info":{"name":"Growth Fund","manager":"A. Chen"}}"#;

        let vp: ReportViewpoint = serde_json::from_str(json).unwrap();

        assert_eq!(vp.viewpoint.as_deref(), Some("Positioned for rate cuts."));
        assert_eq!(
            vp.fund_info.and_then(|i| i.manager).as_deref(),
            Some("A. Chen")
        );
    }
}
