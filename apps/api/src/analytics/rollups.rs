//! Read-only analytics rollups over a trailing window.
//!
//! Everything here is recomputed per request; there is no cache to
//! invalidate. Day-grouped series come straight from SQL; skill tallies and
//! score histograms are folded in Rust so their ordering and bucketing stay
//! deterministic and unit-testable.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;

use crate::errors::AppError;

pub const DEFAULT_WINDOW_DAYS: i64 = 30;
pub const DEFAULT_TOP_LIMIT: i64 = 10;

/// Histogram bucket boundaries; the last bucket is inclusive of 100.
const SCORE_BUCKETS: &[(f64, f64, &str)] = &[
    (0.0, 25.0, "0-24%"),
    (25.0, 50.0, "25-49%"),
    (50.0, 75.0, "50-74%"),
    (75.0, 90.0, "75-89%"),
    (90.0, 101.0, "90-100%"),
];

pub fn window_start(days: i64) -> DateTime<Utc> {
    Utc::now() - Duration::days(days.clamp(1, 365))
}

// ────────────────────────────────────────────────────────────────────────────
// Rollup types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub total_users: i64,
    pub total_resumes: i64,
    pub total_analyses: i64,
    pub average_match_score: f64,
    pub analyses_in_window: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SkillCount {
    pub skill: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TrendPoint {
    pub date: String,
    pub count: i64,
    pub avg_score: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScoreBucket {
    pub range: &'static str,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct JobTitleStat {
    pub title: String,
    pub count: i64,
    pub avg_score: f64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct GrowthPoint {
    pub date: String,
    pub count: i64,
}

// ────────────────────────────────────────────────────────────────────────────
// Queries
// ────────────────────────────────────────────────────────────────────────────

/// Total users / active resumes / analyses, plus the window average score.
pub async fn dashboard_stats(db: &PgPool, days: i64) -> Result<DashboardStats, AppError> {
    let total_users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(db)
        .await?;
    let total_resumes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM resumes WHERE is_active")
        .fetch_one(db)
        .await?;
    let total_analyses: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM analyses")
        .fetch_one(db)
        .await?;

    let (avg, window_count): (Option<f64>, i64) = sqlx::query_as(
        "SELECT AVG(match_score), COUNT(*) FROM analyses WHERE created_at >= $1",
    )
    .bind(window_start(days))
    .fetch_one(db)
    .await?;

    Ok(DashboardStats {
        total_users,
        total_resumes,
        total_analyses,
        average_match_score: round1(avg.unwrap_or(0.0)),
        analyses_in_window: window_count,
    })
}

/// Top-K missing skills in the window. Ordering: count descending, then
/// skill ascending so equal counts come out in a stable order.
pub async fn top_missing_skills(
    db: &PgPool,
    limit: i64,
    days: i64,
) -> Result<Vec<SkillCount>, AppError> {
    let rows: Vec<(Vec<String>,)> =
        sqlx::query_as("SELECT missing_skills FROM analyses WHERE created_at >= $1")
            .bind(window_start(days))
            .fetch_all(db)
            .await?;

    Ok(tally_missing_skills(
        rows.into_iter().map(|(skills,)| skills),
        limit as usize,
    ))
}

/// Per-day analysis count and average score, oldest day first.
pub async fn analysis_trends(db: &PgPool, days: i64) -> Result<Vec<TrendPoint>, AppError> {
    Ok(sqlx::query_as(
        r#"
        SELECT to_char(created_at, 'YYYY-MM-DD') AS date,
               COUNT(*) AS count,
               ROUND(AVG(match_score)::numeric, 1)::float8 AS avg_score
        FROM analyses
        WHERE created_at >= $1
        GROUP BY 1
        ORDER BY 1
        "#,
    )
    .bind(window_start(days))
    .fetch_all(db)
    .await?)
}

/// Match-score histogram over fixed buckets.
pub async fn score_distribution(db: &PgPool, days: i64) -> Result<Vec<ScoreBucket>, AppError> {
    let scores: Vec<(f64,)> =
        sqlx::query_as("SELECT match_score FROM analyses WHERE created_at >= $1")
            .bind(window_start(days))
            .fetch_all(db)
            .await?;

    Ok(bucket_scores(scores.iter().map(|(s,)| *s)))
}

/// Most-analyzed job titles in the window with their average score.
pub async fn top_job_titles(
    db: &PgPool,
    limit: i64,
    days: i64,
) -> Result<Vec<JobTitleStat>, AppError> {
    Ok(sqlx::query_as(
        r#"
        SELECT job_title AS title,
               COUNT(*) AS count,
               ROUND(AVG(match_score)::numeric, 1)::float8 AS avg_score
        FROM analyses
        WHERE created_at >= $1
        GROUP BY job_title
        ORDER BY count DESC, title ASC
        LIMIT $2
        "#,
    )
    .bind(window_start(days))
    .bind(limit)
    .fetch_all(db)
    .await?)
}

/// User signups per day, oldest day first.
pub async fn user_growth(db: &PgPool, days: i64) -> Result<Vec<GrowthPoint>, AppError> {
    Ok(sqlx::query_as(
        r#"
        SELECT to_char(created_at, 'YYYY-MM-DD') AS date,
               COUNT(*) AS count
        FROM users
        WHERE created_at >= $1
        GROUP BY 1
        ORDER BY 1
        "#,
    )
    .bind(window_start(days))
    .fetch_all(db)
    .await?)
}

// ────────────────────────────────────────────────────────────────────────────
// Pure folds
// ────────────────────────────────────────────────────────────────────────────

/// Counts skill occurrences and returns the top `limit`, count descending
/// with ties broken by skill name ascending.
pub fn tally_missing_skills(
    per_analysis: impl IntoIterator<Item = Vec<String>>,
    limit: usize,
) -> Vec<SkillCount> {
    let mut counts: HashMap<String, u64> = HashMap::new();
    for skills in per_analysis {
        for skill in skills {
            *counts.entry(skill).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<SkillCount> = counts
        .into_iter()
        .map(|(skill, count)| SkillCount { skill, count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.skill.cmp(&b.skill)));
    ranked.truncate(limit);
    ranked
}

/// Buckets scores into the fixed histogram. Every bucket is present in the
/// output even when empty.
pub fn bucket_scores(scores: impl IntoIterator<Item = f64>) -> Vec<ScoreBucket> {
    let mut buckets: Vec<ScoreBucket> = SCORE_BUCKETS
        .iter()
        .map(|(_, _, range)| ScoreBucket { range, count: 0 })
        .collect();

    for score in scores {
        for (i, (low, high, _)) in SCORE_BUCKETS.iter().enumerate() {
            if score >= *low && score < *high {
                buckets[i].count += 1;
                break;
            }
        }
    }
    buckets
}

/// Round to one decimal, matching the dashboard presentation.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_orders_by_frequency() {
        let fixture = vec![
            vec!["kubernetes".to_string(), "go".to_string()],
            vec!["kubernetes".to_string()],
            vec!["kubernetes".to_string(), "terraform".to_string()],
            vec!["go".to_string()],
        ];
        let ranked = tally_missing_skills(fixture, 10);
        assert_eq!(ranked[0].skill, "kubernetes");
        assert_eq!(ranked[0].count, 3);
        assert_eq!(ranked[1].skill, "go");
        assert_eq!(ranked[1].count, 2);
        assert_eq!(ranked[2].skill, "terraform");
    }

    #[test]
    fn test_tally_tie_break_is_alphabetical() {
        let fixture = vec![
            vec!["zig".to_string(), "ada".to_string()],
            vec!["zig".to_string(), "ada".to_string()],
        ];
        let ranked = tally_missing_skills(fixture, 10);
        assert_eq!(ranked[0].skill, "ada");
        assert_eq!(ranked[1].skill, "zig");
    }

    #[test]
    fn test_tally_respects_limit() {
        let fixture = vec![vec!["a".to_string(), "b".to_string(), "c".to_string()]];
        assert_eq!(tally_missing_skills(fixture, 2).len(), 2);
    }

    #[test]
    fn test_bucket_edges() {
        let buckets = bucket_scores([0.0, 24.9, 25.0, 74.9, 89.9, 90.0, 100.0]);
        let counts: Vec<u64> = buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![2, 1, 1, 1, 2]);
    }

    #[test]
    fn test_empty_scores_keep_all_buckets() {
        let buckets = bucket_scores([]);
        assert_eq!(buckets.len(), 5);
        assert!(buckets.iter().all(|b| b.count == 0));
        assert_eq!(buckets[0].range, "0-24%");
        assert_eq!(buckets[4].range, "90-100%");
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(72.4499), 72.4);
        assert_eq!(round1(72.45), 72.5);
        assert_eq!(round1(0.0), 0.0);
    }

    #[test]
    fn test_window_start_clamped() {
        let a = window_start(0);
        let b = window_start(1);
        // days below 1 behave as 1
        assert!((a - b).num_seconds().abs() < 2);
    }
}
