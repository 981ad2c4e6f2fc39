//! Axum route handler for the analyze operation.

use axum::{extract::State, Json};
use serde::Serialize;
use uuid::Uuid;

use crate::analysis::orchestrator::{run_analysis, AnalyzeRequest};
use crate::auth::extractor::AuthUser;
use crate::errors::AppError;
use crate::models::analysis::SkillCategories;
use crate::nlp_client::Recommendation;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub analysis_id: Uuid,
    pub job_id: Option<Uuid>,
    pub match_score: f64,
    pub skill_match_score: Option<f64>,
    pub experience_match_score: Option<f64>,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub skill_categories: SkillCategories,
    pub recommendations: Vec<Recommendation>,
    pub priority_skills: Vec<String>,
    pub resume_improvements: Vec<String>,
    pub overall_assessment: String,
}

/// POST /api/v1/resumes/analyze
pub async fn handle_analyze(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let outcome = run_analysis(&state.db, state.nlp.as_ref(), user.id, &req).await?;
    let analysis = outcome.analysis;

    Ok(Json(AnalyzeResponse {
        analysis_id: analysis.id,
        job_id: analysis.job_id,
        match_score: analysis.match_score,
        skill_match_score: analysis.skill_match_score,
        experience_match_score: analysis.experience_match_score,
        matched_skills: analysis.matched_skills,
        missing_skills: analysis.missing_skills,
        skill_categories: analysis.skill_categories.0,
        recommendations: analysis.recommendations.0,
        priority_skills: outcome.priority_skills,
        resume_improvements: analysis.resume_improvements,
        overall_assessment: analysis.overall_assessment,
    }))
}
