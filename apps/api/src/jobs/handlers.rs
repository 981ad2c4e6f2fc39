//! Axum route handlers for the Job library.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::errors::AppError;
use crate::models::job::{is_valid_job_type, JobListItem, JobRow};
use crate::models::Pagination;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SalaryInput {
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub currency: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub title: String,
    pub description: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub salary: Option<SalaryInput>,
    pub experience_required: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateJobRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub salary: Option<SalaryInput>,
    pub experience_required: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct JobListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<JobListItem>,
    pub pagination: Pagination,
}

/// POST /api/v1/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<JobRow>), AppError> {
    if req.title.trim().is_empty() || req.description.trim().is_empty() {
        return Err(AppError::Validation(
            "Job title and description are required.".to_string(),
        ));
    }
    let job_type = req.job_type.unwrap_or_default();
    if !is_valid_job_type(&job_type) {
        return Err(AppError::Validation(format!(
            "Unknown job type '{job_type}'."
        )));
    }

    let salary = req.salary.unwrap_or(SalaryInput {
        min: None,
        max: None,
        currency: None,
    });

    let job: JobRow = sqlx::query_as(
        r#"
        INSERT INTO jobs
            (user_id, title, company, description, location, job_type,
             salary_min, salary_max, salary_currency, experience_required)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
        "#,
    )
    .bind(user.id)
    .bind(req.title.trim())
    .bind(req.company.unwrap_or_default().trim())
    .bind(&req.description)
    .bind(req.location.unwrap_or_default().trim())
    .bind(&job_type)
    .bind(salary.min)
    .bind(salary.max)
    .bind(salary.currency.unwrap_or_else(|| "USD".to_string()))
    .bind(req.experience_required.unwrap_or_default())
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/v1/jobs
///
/// Active jobs for the caller, newest first. Descriptions are omitted from
/// the list projection.
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(params): Query<JobListQuery>,
) -> Result<Json<JobListResponse>, AppError> {
    let limit = params.limit.unwrap_or(20).clamp(1, 100);
    let offset = params.offset.unwrap_or(0).max(0);

    let jobs: Vec<JobRow> = sqlx::query_as(
        r#"
        SELECT * FROM jobs
        WHERE user_id = $1 AND is_active
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user.id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.db)
    .await?;

    let total: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM jobs WHERE user_id = $1 AND is_active")
            .bind(user.id)
            .fetch_one(&state.db)
            .await?;

    let pagination = Pagination::new(total, limit, offset, jobs.len());
    Ok(Json(JobListResponse {
        jobs: jobs.into_iter().map(JobListItem::from).collect(),
        pagination,
    }))
}

/// GET /api/v1/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<JobRow>, AppError> {
    let job = fetch_owned_job(&state, user.id, id).await?;
    Ok(Json(job))
}

/// PUT /api/v1/jobs/:id
///
/// Partial update. Prior analyses keep their own title/description
/// snapshots, so editing a job never rewrites history.
pub async fn handle_update_job(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateJobRequest>,
) -> Result<Json<JobRow>, AppError> {
    let job = fetch_owned_job(&state, user.id, id).await?;

    let job_type = req.job_type.unwrap_or(job.job_type);
    if !is_valid_job_type(&job_type) {
        return Err(AppError::Validation(format!(
            "Unknown job type '{job_type}'."
        )));
    }

    let title = match req.title {
        Some(t) if !t.trim().is_empty() => t.trim().to_string(),
        _ => job.title,
    };
    let description = match req.description {
        Some(d) if !d.trim().is_empty() => d,
        _ => job.description,
    };
    let (salary_min, salary_max, salary_currency) = match req.salary {
        Some(s) => (
            s.min,
            s.max,
            s.currency.unwrap_or_else(|| job.salary_currency.clone()),
        ),
        None => (job.salary_min, job.salary_max, job.salary_currency.clone()),
    };

    let updated: JobRow = sqlx::query_as(
        r#"
        UPDATE jobs SET
            title = $1, company = $2, description = $3, location = $4,
            job_type = $5, salary_min = $6, salary_max = $7,
            salary_currency = $8, experience_required = $9, updated_at = now()
        WHERE id = $10 AND user_id = $11
        RETURNING *
        "#,
    )
    .bind(&title)
    .bind(req.company.unwrap_or(job.company))
    .bind(&description)
    .bind(req.location.unwrap_or(job.location))
    .bind(&job_type)
    .bind(salary_min)
    .bind(salary_max)
    .bind(&salary_currency)
    .bind(req.experience_required.unwrap_or(job.experience_required))
    .bind(id)
    .bind(user.id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(updated))
}

/// DELETE /api/v1/jobs/:id
///
/// Soft delete. Analyses referencing this job are untouched.
pub async fn handle_delete_job(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let job = fetch_owned_job(&state, user.id, id).await?;

    sqlx::query("UPDATE jobs SET is_active = FALSE, updated_at = now() WHERE id = $1")
        .bind(job.id)
        .execute(&state.db)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_owned_job(state: &AppState, user_id: Uuid, id: Uuid) -> Result<JobRow, AppError> {
    let job: Option<JobRow> = sqlx::query_as("SELECT * FROM jobs WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(&state.db)
        .await?;
    job.ok_or_else(|| AppError::NotFound("Job not found.".to_string()))
}
