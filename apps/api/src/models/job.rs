use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::SkillSet;

/// Accepted values for `jobs.job_type`. Empty string means unspecified.
pub const JOB_TYPES: &[&str] = &[
    "full-time",
    "part-time",
    "contract",
    "internship",
    "remote",
    "hybrid",
    "",
];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub company: String,
    pub description: String,
    pub location: String,
    pub job_type: String,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub salary_currency: String,
    pub skills: Json<SkillSet>,
    pub experience_required: String,
    pub analysis_count: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// List projection: description omitted to keep the payload small.
#[derive(Debug, Clone, Serialize)]
pub struct JobListItem {
    pub id: Uuid,
    pub title: String,
    pub company: String,
    pub location: String,
    pub job_type: String,
    pub skills: SkillSet,
    pub analysis_count: i32,
    pub created_at: DateTime<Utc>,
}

impl From<JobRow> for JobListItem {
    fn from(row: JobRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            company: row.company,
            location: row.location,
            job_type: row.job_type,
            skills: row.skills.0,
            analysis_count: row.analysis_count,
            created_at: row.created_at,
        }
    }
}

pub fn is_valid_job_type(job_type: &str) -> bool {
    JOB_TYPES.contains(&job_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_type_validation() {
        assert!(is_valid_job_type("full-time"));
        assert!(is_valid_job_type(""));
        assert!(!is_valid_job_type("freelance"));
    }
}
