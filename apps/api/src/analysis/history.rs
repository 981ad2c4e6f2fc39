//! The denormalized analysis history on each resume.
//!
//! `resumes.analyses` is a read-optimized cache of the `analyses` table:
//! append-only, and required to equal the projection of that resume's rows.
//! The invariant is checked explicitly instead of trusting dual writes.

use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::analysis::{AnalysisRow, AnalysisSummary};

/// Appends one summary to a resume's embedded history.
/// Runs inside the caller's transaction alongside the Analysis insert.
pub async fn append_summary(
    tx: &mut Transaction<'_, Postgres>,
    resume_id: Uuid,
    summary: &AnalysisSummary,
) -> Result<(), AppError> {
    sqlx::query(
        "UPDATE resumes SET analyses = analyses || $1::jsonb, updated_at = now() WHERE id = $2",
    )
    .bind(Json(summary))
    .bind(resume_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Compares an embedded history against the authoritative rows.
/// Both sides are expected in creation order.
pub fn history_is_consistent(embedded: &[AnalysisSummary], rows: &[AnalysisRow]) -> bool {
    embedded.len() == rows.len()
        && embedded
            .iter()
            .zip(rows)
            .all(|(summary, row)| *summary == AnalysisSummary::project(row))
}

/// Loads both sides of the invariant for one resume and checks them.
pub async fn verify_resume_history(db: &PgPool, resume_id: Uuid) -> Result<bool, AppError> {
    let row: Option<(Json<Vec<AnalysisSummary>>,)> =
        sqlx::query_as("SELECT analyses FROM resumes WHERE id = $1")
            .bind(resume_id)
            .fetch_optional(db)
            .await?;
    let (Json(embedded),) =
        row.ok_or_else(|| AppError::NotFound("Resume not found.".to_string()))?;

    let rows: Vec<AnalysisRow> =
        sqlx::query_as("SELECT * FROM analyses WHERE resume_id = $1 ORDER BY created_at ASC")
            .bind(resume_id)
            .fetch_all(db)
            .await?;

    Ok(history_is_consistent(&embedded, &rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::analysis::SkillCategories;
    use crate::nlp_client::Recommendation;
    use chrono::Utc;

    fn sample_row() -> AnalysisRow {
        AnalysisRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            resume_id: Uuid::new_v4(),
            job_id: None,
            job_title: "Backend Engineer".to_string(),
            job_description: "Build services".to_string(),
            match_score: 81.5,
            skill_match_score: Some(90.0),
            experience_match_score: Some(70.0),
            matched_skills: vec!["rust".to_string()],
            missing_skills: vec!["kubernetes".to_string()],
            skill_categories: Json(SkillCategories::default()),
            recommendations: Json(vec![Recommendation {
                skill: "kubernetes".to_string(),
                priority: "high".to_string(),
                suggestion: "Deploy a side project to a cluster".to_string(),
                category: "technical".to_string(),
            }]),
            resume_improvements: vec!["Quantify impact".to_string()],
            overall_assessment: "Strong fit".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_projection_matches_row() {
        let row = sample_row();
        let summary = AnalysisSummary::project(&row);
        assert_eq!(summary.analysis_id, row.id);
        assert_eq!(summary.match_score, row.match_score);
        assert_eq!(summary.recommendations, row.recommendations.0);
        assert_eq!(summary.analyzed_at, row.created_at);
    }

    #[test]
    fn test_consistent_history_accepted() {
        let rows = vec![sample_row(), sample_row()];
        let embedded: Vec<_> = rows.iter().map(AnalysisSummary::project).collect();
        assert!(history_is_consistent(&embedded, &rows));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let rows = vec![sample_row(), sample_row()];
        let embedded = vec![AnalysisSummary::project(&rows[0])];
        assert!(!history_is_consistent(&embedded, &rows));
    }

    #[test]
    fn test_drifted_summary_rejected() {
        let rows = vec![sample_row()];
        let mut embedded = vec![AnalysisSummary::project(&rows[0])];
        embedded[0].match_score = 12.0;
        assert!(!history_is_consistent(&embedded, &rows));
    }

    #[test]
    fn test_empty_history_is_consistent() {
        assert!(history_is_consistent(&[], &[]));
    }
}
