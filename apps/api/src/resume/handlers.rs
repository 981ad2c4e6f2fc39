//! Axum route handlers for the Resume API.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::analysis::history::verify_resume_history;
use crate::auth::extractor::AuthUser;
use crate::errors::AppError;
use crate::models::analysis::{AnalysisHistoryItem, AnalysisRow};
use crate::models::resume::{file_type_from_name, ResumeDetail, ResumeListItem, ResumeRow};
use crate::models::{Pagination, SkillSet};
use crate::resume::upload::{
    check_file_size, extract_best_effort, persist_resume, storage_filename, store_file,
    UploadedFile,
};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub id: Uuid,
    pub filename: String,
    pub file_type: String,
    pub file_size: i64,
    pub skills: SkillSet,
    pub has_text: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ResumeListResponse {
    pub resumes: Vec<ResumeListItem>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub analyses: Vec<AnalysisHistoryItem>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct HistoryCheckResponse {
    pub resume_id: Uuid,
    pub consistent: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/resumes/upload
///
/// Multipart upload (field `resume`, pdf or docx). Text and skill extraction
/// are best-effort: an unreachable NLP service still lets the upload succeed
/// with empty text, and `/analyze` will refuse the resume until re-upload.
pub async fn handle_upload(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let file = read_resume_field(&mut multipart).await?;

    let extraction = extract_best_effort(state.nlp.as_ref(), &file).await;

    let resume_id = Uuid::new_v4();
    let filename = storage_filename(resume_id, file.file_type);

    // Storage mechanics stay minimal: a local directory, best-effort.
    let storage_path = match store_file(&state.config.upload_dir, &filename, &file.bytes).await {
        Ok(path) => Some(path),
        Err(e) => {
            warn!("Failed to store uploaded file {filename}: {e}");
            None
        }
    };

    let resume = persist_resume(
        &state.db,
        resume_id,
        user.id,
        &file,
        &filename,
        storage_path,
        &extraction,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            id: resume.id,
            filename: resume.original_name,
            file_type: resume.file_type,
            file_size: resume.file_size,
            skills: resume.skills.0,
            has_text: !resume.extracted_text.is_empty(),
            created_at: resume.created_at,
        }),
    ))
}

/// GET /api/v1/resumes
///
/// Active resumes for the caller, newest first, without extracted text.
pub async fn handle_list_resumes(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<ResumeListResponse>, AppError> {
    let rows: Vec<ResumeRow> = sqlx::query_as(
        "SELECT * FROM resumes WHERE user_id = $1 AND is_active ORDER BY created_at DESC",
    )
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(ResumeListResponse {
        resumes: rows.into_iter().map(ResumeListItem::from).collect(),
    }))
}

/// GET /api/v1/resumes/:id
///
/// Full record with embedded analysis history. Soft-deleted resumes stay
/// addressable by id so past analyses keep resolving.
pub async fn handle_get_resume(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ResumeDetail>, AppError> {
    let resume: Option<ResumeRow> =
        sqlx::query_as("SELECT * FROM resumes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user.id)
            .fetch_optional(&state.db)
            .await?;

    let resume = resume.ok_or_else(|| AppError::NotFound("Resume not found.".to_string()))?;
    Ok(Json(resume.into()))
}

/// DELETE /api/v1/resumes/:id
///
/// Soft delete: flips `is_active`, never removes the row. The stored file
/// is removed from disk best-effort.
pub async fn handle_delete_resume(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let resume: Option<ResumeRow> =
        sqlx::query_as("SELECT * FROM resumes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user.id)
            .fetch_optional(&state.db)
            .await?;

    let resume = resume.ok_or_else(|| AppError::NotFound("Resume not found.".to_string()))?;

    if let Some(path) = &resume.storage_path {
        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!("Failed to remove stored file {path}: {e}");
        }
    }

    sqlx::query("UPDATE resumes SET is_active = FALSE, updated_at = now() WHERE id = $1")
        .bind(resume.id)
        .execute(&state.db)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/resumes/:id/history-check
///
/// Verifies the denormalization invariant: the embedded history must equal
/// the projection of this resume's rows in the analyses table.
pub async fn handle_history_check(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<HistoryCheckResponse>, AppError> {
    let owned: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM resumes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user.id)
            .fetch_optional(&state.db)
            .await?;
    if owned.is_none() {
        return Err(AppError::NotFound("Resume not found.".to_string()));
    }

    let consistent = verify_resume_history(&state.db, id).await?;
    Ok(Json(HistoryCheckResponse {
        resume_id: id,
        consistent,
    }))
}

/// GET /api/v1/analyses/:id
///
/// One analysis record, ownership enforced. Works for analyses whose resume
/// or job has since been soft-deleted — snapshots are immutable.
pub async fn handle_get_analysis(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<AnalysisRow>, AppError> {
    let analysis: Option<AnalysisRow> =
        sqlx::query_as("SELECT * FROM analyses WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user.id)
            .fetch_optional(&state.db)
            .await?;

    let analysis = analysis.ok_or_else(|| AppError::NotFound("Analysis not found.".to_string()))?;
    Ok(Json(analysis))
}

/// GET /api/v1/resumes/history
///
/// The caller's analyses, newest first, paginated.
pub async fn handle_history(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, AppError> {
    let limit = params.limit.unwrap_or(10).clamp(1, 100);
    let offset = params.offset.unwrap_or(0).max(0);

    let analyses: Vec<AnalysisHistoryItem> = sqlx::query_as(
        r#"
        SELECT id, resume_id, job_title, match_score, created_at
        FROM analyses
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user.id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.db)
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM analyses WHERE user_id = $1")
        .bind(user.id)
        .fetch_one(&state.db)
        .await?;

    let pagination = Pagination::new(total, limit, offset, analyses.len());
    Ok(Json(HistoryResponse {
        analyses,
        pagination,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Multipart helpers
// ────────────────────────────────────────────────────────────────────────────

async fn read_resume_field(multipart: &mut Multipart) -> Result<UploadedFile, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("resume") {
            continue;
        }

        let original_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation("Uploaded file has no filename.".to_string()))?;

        let file_type = file_type_from_name(&original_name).ok_or_else(|| {
            AppError::Validation("Unsupported file format. Please upload PDF or DOCX.".to_string())
        })?;

        let content_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read uploaded file: {e}")))?
            .to_vec();

        if bytes.is_empty() {
            return Err(AppError::Validation("Uploaded file is empty.".to_string()));
        }
        check_file_size(bytes.len())?;

        return Ok(UploadedFile {
            original_name,
            content_type,
            file_type,
            bytes,
        });
    }

    Err(AppError::Validation("No file uploaded.".to_string()))
}
