//! Analysis orchestration: given a stored resume and a job description,
//! produce and persist one Analysis and append its summary to the resume.
//!
//! Failure semantics are all-or-nothing: any upstream scoring failure aborts
//! before anything is written, and the Analysis insert plus the history
//! append share one transaction.

use serde::Deserialize;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::analysis::history::append_summary;
use crate::errors::AppError;
use crate::models::analysis::{AnalysisRow, AnalysisSummary, SkillCategories};
use crate::models::resume::ResumeRow;
use crate::models::SkillSet;
use crate::nlp_client::{MatchReport, NlpService, RecommendationReport};

pub const UNTITLED_POSITION: &str = "Untitled Position";

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub resume_id: Uuid,
    pub job_description: String,
    pub job_title: Option<String>,
    pub job_id: Option<Uuid>,
}

pub struct AnalysisOutcome {
    pub analysis: AnalysisRow,
    pub priority_skills: Vec<String>,
}

/// Runs the full orchestration for one analysis request.
pub async fn run_analysis(
    db: &PgPool,
    nlp: &dyn NlpService,
    user_id: Uuid,
    req: &AnalyzeRequest,
) -> Result<AnalysisOutcome, AppError> {
    if req.job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "Resume ID and job description are required.".to_string(),
        ));
    }

    let resume: Option<ResumeRow> =
        sqlx::query_as("SELECT * FROM resumes WHERE id = $1 AND user_id = $2")
            .bind(req.resume_id)
            .bind(user_id)
            .fetch_optional(db)
            .await?;
    let resume = resume.ok_or_else(|| AppError::NotFound("Resume not found.".to_string()))?;

    ensure_analyzable(&resume)?;

    // Scoring collaborator. Either call failing aborts the whole operation;
    // nothing has been written yet.
    let match_report = nlp
        .match_resume(&resume.extracted_text, &req.job_description)
        .await?;
    let recommend_report = nlp
        .recommend(&resume.extracted_text, &req.job_description)
        .await?;

    // Job bookkeeping is its own step, not a side effect buried in the
    // persistence path.
    let job_id = record_job_usage(db, user_id, req, &match_report).await?;

    let job_title = req
        .job_title
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(UNTITLED_POSITION);

    let analysis = persist_analysis(
        db,
        user_id,
        &resume,
        job_id,
        job_title,
        &req.job_description,
        &match_report,
        &recommend_report,
    )
    .await?;

    info!(
        "Analysis {} created for resume {} (score {})",
        analysis.id, resume.id, analysis.match_score
    );

    Ok(AnalysisOutcome {
        analysis,
        priority_skills: recommend_report.priority_skills,
    })
}

/// Rejects resumes whose text extraction failed at upload time.
pub fn ensure_analyzable(resume: &ResumeRow) -> Result<(), AppError> {
    if resume.extracted_text.trim().is_empty() {
        return Err(AppError::Validation(
            "Resume has no extracted text. Please re-upload.".to_string(),
        ));
    }
    Ok(())
}

/// Resolves the job reference for an analysis.
///
/// A supplied `job_title` creates exactly one new Job seeded with the
/// job-side skills from the match report, starting at `analysis_count = 1`.
/// A supplied `job_id` increments that job's counter instead. Neither is
/// required — ad-hoc analyses carry only the snapshot.
pub async fn record_job_usage(
    db: &PgPool,
    user_id: Uuid,
    req: &AnalyzeRequest,
    report: &MatchReport,
) -> Result<Option<Uuid>, AppError> {
    if let Some((title, skills)) = job_seed(req, report) {
        let (job_id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO jobs (user_id, title, description, skills, analysis_count)
            VALUES ($1, $2, $3, $4, 1)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(title)
        .bind(&req.job_description)
        .bind(Json(&skills))
        .fetch_one(db)
        .await?;
        return Ok(Some(job_id));
    }

    if let Some(job_id) = req.job_id {
        let updated = sqlx::query(
            "UPDATE jobs SET analysis_count = analysis_count + 1, updated_at = now()
             WHERE id = $1 AND user_id = $2",
        )
        .bind(job_id)
        .bind(user_id)
        .execute(db)
        .await?;
        require_job_updated(updated.rows_affected())?;
        return Ok(Some(job_id));
    }

    Ok(None)
}

/// The seed for a new Job: the trimmed title plus the job-side skills from
/// the match report. `None` when no usable title was supplied, including
/// when only a `job_id` reference is present.
pub fn job_seed<'a>(req: &'a AnalyzeRequest, report: &MatchReport) -> Option<(&'a str, SkillSet)> {
    let title = req
        .job_title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())?;
    Some((
        title,
        SkillSet {
            technical: report.category("job_technical"),
            soft: report.category("job_soft"),
            ..SkillSet::default()
        },
    ))
}

/// A `job_id` that matches no job owned by the caller is a client error,
/// caught here rather than as a foreign-key violation at insert time.
pub fn require_job_updated(rows_affected: u64) -> Result<(), AppError> {
    if rows_affected == 0 {
        return Err(AppError::NotFound("Job not found.".to_string()));
    }
    Ok(())
}

/// Inserts the Analysis row and appends the denormalized summary to the
/// resume's history in one transaction.
#[allow(clippy::too_many_arguments)]
async fn persist_analysis(
    db: &PgPool,
    user_id: Uuid,
    resume: &ResumeRow,
    job_id: Option<Uuid>,
    job_title: &str,
    job_description: &str,
    match_report: &MatchReport,
    recommend_report: &RecommendationReport,
) -> Result<AnalysisRow, AppError> {
    let categories = categories_from_report(match_report);

    let mut tx = db.begin().await?;

    let analysis: AnalysisRow = sqlx::query_as(
        r#"
        INSERT INTO analyses
            (user_id, resume_id, job_id, job_title, job_description,
             match_score, skill_match_score, experience_match_score,
             matched_skills, missing_skills, skill_categories,
             recommendations, resume_improvements, overall_assessment)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(resume.id)
    .bind(job_id)
    .bind(job_title)
    .bind(job_description)
    .bind(clamp_score(match_report.overall_score))
    .bind(match_report.skill_match_score.map(clamp_score))
    .bind(match_report.experience_match_score.map(clamp_score))
    .bind(&match_report.matched_skills)
    .bind(&match_report.missing_skills)
    .bind(Json(&categories))
    .bind(Json(&recommend_report.suggestions))
    .bind(&recommend_report.resume_improvements)
    .bind(&recommend_report.overall_assessment)
    .fetch_one(&mut *tx)
    .await?;

    append_summary(&mut tx, resume.id, &AnalysisSummary::project(&analysis)).await?;

    tx.commit().await?;
    Ok(analysis)
}

/// Scores arrive from an external service; the [0,100] invariant is ours.
pub fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, 100.0)
}

pub fn categories_from_report(report: &MatchReport) -> SkillCategories {
    SkillCategories {
        matched_technical: report.category("matched_technical"),
        missing_technical: report.category("missing_technical"),
        matched_soft: report.category("matched_soft"),
        missing_soft: report.category("missing_soft"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;

    fn resume_with_text(text: &str) -> ResumeRow {
        ResumeRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            filename: "resume-x.pdf".to_string(),
            original_name: "cv.pdf".to_string(),
            file_type: "pdf".to_string(),
            file_size: 1024,
            storage_path: None,
            extracted_text: text.to_string(),
            skills: Json(SkillSet::default()),
            analyses: Json(vec![]),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_text_is_not_analyzable() {
        let err = ensure_analyzable(&resume_with_text("")).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("re-upload")));
        assert!(ensure_analyzable(&resume_with_text("   \n")).is_err());
    }

    #[test]
    fn test_nonempty_text_is_analyzable() {
        assert!(ensure_analyzable(&resume_with_text("Rust engineer")).is_ok());
    }

    #[test]
    fn test_clamp_score_bounds() {
        assert_eq!(clamp_score(-3.0), 0.0);
        assert_eq!(clamp_score(105.0), 100.0);
        assert_eq!(clamp_score(77.7), 77.7);
    }

    fn report_with(categories: &[(&str, &[&str])]) -> MatchReport {
        let mut skill_categories = HashMap::new();
        for (key, skills) in categories {
            skill_categories.insert(
                key.to_string(),
                skills.iter().map(|s| s.to_string()).collect(),
            );
        }
        MatchReport {
            overall_score: 50.0,
            skill_match_score: None,
            experience_match_score: None,
            matched_skills: vec![],
            missing_skills: vec![],
            skill_categories,
        }
    }

    fn request(job_title: Option<&str>, job_id: Option<Uuid>) -> AnalyzeRequest {
        AnalyzeRequest {
            resume_id: Uuid::new_v4(),
            job_description: "Build APIs in Rust".to_string(),
            job_title: job_title.map(str::to_string),
            job_id,
        }
    }

    #[test]
    fn test_categories_from_report() {
        let report = report_with(&[
            ("matched_technical", &["rust"][..]),
            ("missing_soft", &["mentoring"][..]),
        ]);
        let categories = categories_from_report(&report);
        assert_eq!(categories.matched_technical, vec!["rust"]);
        assert_eq!(categories.missing_soft, vec!["mentoring"]);
        assert!(categories.missing_technical.is_empty());
    }

    #[test]
    fn test_job_seed_requires_a_usable_title() {
        let report = report_with(&[]);
        assert!(job_seed(&request(None, None), &report).is_none());
        assert!(job_seed(&request(Some("   "), None), &report).is_none());
        // An existing-job reference alone never seeds a new job.
        assert!(job_seed(&request(None, Some(Uuid::new_v4())), &report).is_none());
    }

    #[test]
    fn test_job_seed_trims_title_and_seeds_skills() {
        let report = report_with(&[
            ("job_technical", &["rust", "postgres"][..]),
            ("job_soft", &["communication"][..]),
        ]);
        let req = request(Some("  Backend Engineer  "), None);
        let (title, skills) = job_seed(&req, &report).unwrap();
        assert_eq!(title, "Backend Engineer");
        assert_eq!(skills.technical, vec!["rust", "postgres"]);
        assert_eq!(skills.soft, vec!["communication"]);
        assert!(skills.experience.is_empty());
        assert!(skills.education.is_empty());
    }

    #[test]
    fn test_job_seed_prefers_new_title_over_job_id() {
        let report = report_with(&[]);
        let req = request(Some("Platform Engineer"), Some(Uuid::new_v4()));
        let (title, _) = job_seed(&req, &report).unwrap();
        assert_eq!(title, "Platform Engineer");
    }

    #[test]
    fn test_unknown_job_reference_is_not_found() {
        let err = require_job_updated(0).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(require_job_updated(1).is_ok());
    }
}
