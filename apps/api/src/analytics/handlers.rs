//! Axum route handlers for the analytics dashboards.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::analytics::rollups::{
    analysis_trends, dashboard_stats, score_distribution, top_job_titles, top_missing_skills,
    user_growth, DashboardStats, GrowthPoint, JobTitleStat, ScoreBucket, SkillCount, TrendPoint,
    DEFAULT_TOP_LIMIT, DEFAULT_WINDOW_DAYS,
};
use crate::auth::extractor::{AdminUser, AuthUser};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    pub days: Option<i64>,
    pub limit: Option<i64>,
}

impl WindowQuery {
    fn days(&self) -> i64 {
        self.days.unwrap_or(DEFAULT_WINDOW_DAYS).clamp(1, 365)
    }

    fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_TOP_LIMIT).clamp(1, 100)
    }

    fn period(&self) -> String {
        format!("Last {} days", self.days())
    }
}

#[derive(Debug, Serialize)]
pub struct TopSkillsResponse {
    pub top_missing_skills: Vec<SkillCount>,
    pub period: String,
}

#[derive(Debug, Serialize)]
pub struct TrendsResponse {
    pub trends: Vec<TrendPoint>,
    pub period: String,
}

#[derive(Debug, Serialize)]
pub struct DistributionResponse {
    pub distribution: Vec<ScoreBucket>,
    pub period: String,
}

#[derive(Debug, Serialize)]
pub struct TopJobsResponse {
    pub top_job_titles: Vec<JobTitleStat>,
    pub period: String,
}

#[derive(Debug, Serialize)]
pub struct UserGrowthResponse {
    pub user_growth: Vec<GrowthPoint>,
    pub period: String,
}

#[derive(Debug, Serialize)]
pub struct FullAnalyticsResponse {
    pub stats: DashboardStats,
    pub top_missing_skills: Vec<SkillCount>,
    pub trends: Vec<TrendPoint>,
    pub top_job_titles: Vec<JobTitleStat>,
    pub period: String,
}

/// GET /api/v1/analytics/dashboard
pub async fn handle_dashboard(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Query(params): Query<WindowQuery>,
) -> Result<Json<DashboardStats>, AppError> {
    Ok(Json(dashboard_stats(&state.db, params.days()).await?))
}

/// GET /api/v1/analytics/top-skills
pub async fn handle_top_skills(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Query(params): Query<WindowQuery>,
) -> Result<Json<TopSkillsResponse>, AppError> {
    let top = top_missing_skills(&state.db, params.limit(), params.days()).await?;
    Ok(Json(TopSkillsResponse {
        top_missing_skills: top,
        period: params.period(),
    }))
}

/// GET /api/v1/analytics/trends
pub async fn handle_trends(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Query(params): Query<WindowQuery>,
) -> Result<Json<TrendsResponse>, AppError> {
    let trends = analysis_trends(&state.db, params.days()).await?;
    Ok(Json(TrendsResponse {
        trends,
        period: params.period(),
    }))
}

/// GET /api/v1/analytics/distribution
pub async fn handle_distribution(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Query(params): Query<WindowQuery>,
) -> Result<Json<DistributionResponse>, AppError> {
    let distribution = score_distribution(&state.db, params.days()).await?;
    Ok(Json(DistributionResponse {
        distribution,
        period: params.period(),
    }))
}

/// GET /api/v1/analytics/top-jobs
pub async fn handle_top_jobs(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Query(params): Query<WindowQuery>,
) -> Result<Json<TopJobsResponse>, AppError> {
    let top = top_job_titles(&state.db, params.limit(), params.days()).await?;
    Ok(Json(TopJobsResponse {
        top_job_titles: top,
        period: params.period(),
    }))
}

/// GET /api/v1/analytics/user-growth — admin only.
pub async fn handle_user_growth(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(params): Query<WindowQuery>,
) -> Result<Json<UserGrowthResponse>, AppError> {
    let growth = user_growth(&state.db, params.days()).await?;
    Ok(Json(UserGrowthResponse {
        user_growth: growth,
        period: params.period(),
    }))
}

/// GET /api/v1/analytics/full
pub async fn handle_full(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Query(params): Query<WindowQuery>,
) -> Result<Json<FullAnalyticsResponse>, AppError> {
    let days = params.days();
    let (stats, top_skills, trends, top_jobs) = tokio::try_join!(
        dashboard_stats(&state.db, days),
        top_missing_skills(&state.db, params.limit(), days),
        analysis_trends(&state.db, days),
        top_job_titles(&state.db, params.limit(), days),
    )?;

    Ok(Json(FullAnalyticsResponse {
        stats,
        top_missing_skills: top_skills,
        trends,
        top_job_titles: top_jobs,
        period: params.period(),
    }))
}
