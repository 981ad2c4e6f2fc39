//! NLP client — the single point of entry for all scoring-service calls.
//!
//! ARCHITECTURAL RULE: No other module may call the NLP service directly.
//! All extraction, matching and recommendation requests MUST go through
//! the `NlpService` trait, carried in `AppState` as `Arc<dyn NlpService>`
//! so tests can inject a mock collaborator.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Text extraction can take a while for large PDFs.
const EXTRACT_TIMEOUT_SECS: u64 = 45;
/// Matching and recommendations operate on already-extracted text.
const SCORING_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum NlpError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("NLP service error (status {status}): {message}")]
    Api { status: u16, message: String },
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types (FastAPI contract)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractedText {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractedSkills {
    #[serde(default)]
    pub technical_skills: Vec<String>,
    #[serde(default)]
    pub soft_skills: Vec<String>,
    #[serde(default)]
    pub experience_keywords: Vec<String>,
    #[serde(default)]
    pub education: Vec<String>,
}

/// Result of `POST /match`: three 0–100 scores plus skill breakdowns.
/// `skill_categories` keys include `matched_technical`, `missing_technical`,
/// `matched_soft`, `missing_soft`, `job_technical`, `job_soft`.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchReport {
    pub overall_score: f64,
    #[serde(default)]
    pub skill_match_score: Option<f64>,
    #[serde(default)]
    pub experience_match_score: Option<f64>,
    #[serde(default)]
    pub matched_skills: Vec<String>,
    #[serde(default)]
    pub missing_skills: Vec<String>,
    #[serde(default)]
    pub skill_categories: HashMap<String, Vec<String>>,
}

impl MatchReport {
    pub fn category(&self, key: &str) -> Vec<String> {
        self.skill_categories.get(key).cloned().unwrap_or_default()
    }
}

/// One improvement suggestion from `POST /recommend`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    #[serde(default)]
    pub skill: String,
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub suggestion: String,
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecommendationReport {
    #[serde(default)]
    pub suggestions: Vec<Recommendation>,
    #[serde(default)]
    pub priority_skills: Vec<String>,
    #[serde(default)]
    pub resume_improvements: Vec<String>,
    #[serde(default)]
    pub overall_assessment: String,
}

#[derive(Debug, Deserialize)]
struct NlpApiError {
    detail: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// The scoring collaborator. Upstream failures are surfaced as-is; nothing
/// is retried — a timed-out call fails the whole request.
#[async_trait]
pub trait NlpService: Send + Sync {
    /// `POST /extract-text` — multipart file upload, returns free text.
    async fn extract_text(
        &self,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<ExtractedText, NlpError>;

    /// `POST /extract-skills` — categorized skill lists from free text.
    async fn extract_skills(&self, text: &str) -> Result<ExtractedSkills, NlpError>;

    /// `POST /match` — scores a resume against a job description.
    async fn match_resume(
        &self,
        resume_text: &str,
        job_description: &str,
    ) -> Result<MatchReport, NlpError>;

    /// `POST /recommend` — improvement suggestions for the same pair.
    async fn recommend(
        &self,
        resume_text: &str,
        job_description: &str,
    ) -> Result<RecommendationReport, NlpError>;
}

// ────────────────────────────────────────────────────────────────────────────
// HTTP implementation
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct MatchRequestBody<'a> {
    resume_text: &'a str,
    job_description: &'a str,
}

#[derive(Debug, Serialize)]
struct TextInputBody<'a> {
    text: &'a str,
}

/// reqwest-backed client for the NLP microservice.
#[derive(Clone)]
pub struct HttpNlpClient {
    client: Client,
    base_url: String,
}

impl HttpNlpClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(EXTRACT_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, NlpError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        // FastAPI reports errors as {"detail": "..."}
        let message = serde_json::from_str::<NlpApiError>(&body)
            .map(|e| e.detail)
            .unwrap_or(body);
        Err(NlpError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl NlpService for HttpNlpClient {
    async fn extract_text(
        &self,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<ExtractedText, NlpError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(content_type)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.url("/extract-text"))
            .multipart(form)
            .send()
            .await?;

        let extracted: ExtractedText = Self::check(response).await?.json().await?;
        debug!("extract-text returned {} chars", extracted.text.len());
        Ok(extracted)
    }

    async fn extract_skills(&self, text: &str) -> Result<ExtractedSkills, NlpError> {
        let response = self
            .client
            .post(self.url("/extract-skills"))
            .timeout(std::time::Duration::from_secs(SCORING_TIMEOUT_SECS))
            .json(&TextInputBody { text })
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }

    async fn match_resume(
        &self,
        resume_text: &str,
        job_description: &str,
    ) -> Result<MatchReport, NlpError> {
        let response = self
            .client
            .post(self.url("/match"))
            .timeout(std::time::Duration::from_secs(SCORING_TIMEOUT_SECS))
            .json(&MatchRequestBody {
                resume_text,
                job_description,
            })
            .send()
            .await?;

        let report: MatchReport = Self::check(response).await?.json().await?;
        debug!("match returned overall_score={}", report.overall_score);
        Ok(report)
    }

    async fn recommend(
        &self,
        resume_text: &str,
        job_description: &str,
    ) -> Result<RecommendationReport, NlpError> {
        let response = self
            .client
            .post(self.url("/recommend"))
            .timeout(std::time::Duration::from_secs(SCORING_TIMEOUT_SECS))
            .json(&MatchRequestBody {
                resume_text,
                job_description,
            })
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_report_parses_full_payload() {
        let json = r#"{
            "overall_score": 72.5,
            "skill_match_score": 80.0,
            "experience_match_score": 65.0,
            "matched_skills": ["rust", "sql"],
            "missing_skills": ["kubernetes"],
            "skill_categories": {
                "matched_technical": ["rust"],
                "missing_technical": ["kubernetes"],
                "job_technical": ["rust", "kubernetes"]
            }
        }"#;
        let report: MatchReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.overall_score, 72.5);
        assert_eq!(report.matched_skills, vec!["rust", "sql"]);
        assert_eq!(report.category("job_technical"), vec!["rust", "kubernetes"]);
        assert!(report.category("job_soft").is_empty());
    }

    #[test]
    fn test_match_report_tolerates_missing_optional_fields() {
        let report: MatchReport = serde_json::from_str(r#"{"overall_score": 50.0}"#).unwrap();
        assert_eq!(report.skill_match_score, None);
        assert!(report.missing_skills.is_empty());
    }

    #[test]
    fn test_recommendation_report_defaults() {
        let report: RecommendationReport = serde_json::from_str("{}").unwrap();
        assert!(report.suggestions.is_empty());
        assert_eq!(report.overall_assessment, "");
    }

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let client = HttpNlpClient::new("http://localhost:8000/".to_string());
        assert_eq!(client.url("/match"), "http://localhost:8000/match");
    }
}
