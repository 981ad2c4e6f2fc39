use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::nlp_client::Recommendation;

/// Matched/missing skills split by category, snapshotted from the match
/// report at analysis time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SkillCategories {
    #[serde(default)]
    pub matched_technical: Vec<String>,
    #[serde(default)]
    pub missing_technical: Vec<String>,
    #[serde(default)]
    pub matched_soft: Vec<String>,
    #[serde(default)]
    pub missing_soft: Vec<String>,
}

/// One analysis record. Immutable once created: the job title and
/// description are denormalized snapshots so the analysis stays meaningful
/// if the Job is edited or soft-deleted later.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AnalysisRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub resume_id: Uuid,
    pub job_id: Option<Uuid>,
    pub job_title: String,
    pub job_description: String,
    pub match_score: f64,
    pub skill_match_score: Option<f64>,
    pub experience_match_score: Option<f64>,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub skill_categories: Json<SkillCategories>,
    pub recommendations: Json<Vec<Recommendation>>,
    pub resume_improvements: Vec<String>,
    pub overall_assessment: String,
    pub created_at: DateTime<Utc>,
}

/// Denormalized copy of an analysis kept in `resumes.analyses`.
/// A derived cache, not a second source of truth: it must always equal
/// `AnalysisSummary::project` of the corresponding `AnalysisRow`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisSummary {
    pub analysis_id: Uuid,
    pub job_id: Option<Uuid>,
    pub job_title: String,
    pub match_score: f64,
    pub skill_match_score: Option<f64>,
    pub experience_match_score: Option<f64>,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub recommendations: Vec<Recommendation>,
    pub resume_improvements: Vec<String>,
    pub overall_assessment: String,
    pub analyzed_at: DateTime<Utc>,
}

impl AnalysisSummary {
    /// The single projection used both when appending to a resume's history
    /// and when verifying the denormalization invariant.
    pub fn project(row: &AnalysisRow) -> Self {
        Self {
            analysis_id: row.id,
            job_id: row.job_id,
            job_title: row.job_title.clone(),
            match_score: row.match_score,
            skill_match_score: row.skill_match_score,
            experience_match_score: row.experience_match_score,
            matched_skills: row.matched_skills.clone(),
            missing_skills: row.missing_skills.clone(),
            recommendations: row.recommendations.0.clone(),
            resume_improvements: row.resume_improvements.clone(),
            overall_assessment: row.overall_assessment.clone(),
            analyzed_at: row.created_at,
        }
    }
}

/// Slim projection for the paginated history endpoint.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AnalysisHistoryItem {
    pub id: Uuid,
    pub resume_id: Uuid,
    pub job_title: String,
    pub match_score: f64,
    pub created_at: DateTime<Utc>,
}
