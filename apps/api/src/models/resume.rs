use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::analysis::AnalysisSummary;
use crate::models::SkillSet;

pub const FILE_TYPE_PDF: &str = "pdf";
pub const FILE_TYPE_DOCX: &str = "docx";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub filename: String,
    pub original_name: String,
    pub file_type: String,
    pub file_size: i64,
    pub storage_path: Option<String>,
    pub extracted_text: String,
    pub skills: Json<SkillSet>,
    /// Denormalized append-only history. Derived cache of the `analyses`
    /// table rows for this resume; see `analysis::history`.
    pub analyses: Json<Vec<AnalysisSummary>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// List projection: everything except the extracted text and storage path.
#[derive(Debug, Clone, Serialize)]
pub struct ResumeListItem {
    pub id: Uuid,
    pub filename: String,
    pub file_type: String,
    pub file_size: i64,
    pub skills: SkillSet,
    pub analysis_count: usize,
    pub last_analysis: Option<AnalysisSummary>,
    pub created_at: DateTime<Utc>,
}

impl From<ResumeRow> for ResumeListItem {
    fn from(row: ResumeRow) -> Self {
        let history = row.analyses.0;
        Self {
            id: row.id,
            filename: row.original_name,
            file_type: row.file_type,
            file_size: row.file_size,
            skills: row.skills.0,
            analysis_count: history.len(),
            last_analysis: history.last().cloned(),
            created_at: row.created_at,
        }
    }
}

/// Detail projection: includes the full embedded history, hides the
/// storage path.
#[derive(Debug, Clone, Serialize)]
pub struct ResumeDetail {
    pub id: Uuid,
    pub filename: String,
    pub file_type: String,
    pub file_size: i64,
    pub skills: SkillSet,
    pub has_text: bool,
    pub analyses: Vec<AnalysisSummary>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ResumeRow> for ResumeDetail {
    fn from(row: ResumeRow) -> Self {
        Self {
            id: row.id,
            filename: row.original_name,
            file_type: row.file_type,
            file_size: row.file_size,
            skills: row.skills.0,
            has_text: !row.extracted_text.is_empty(),
            analyses: row.analyses.0,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Maps an original filename to a supported file type.
pub fn file_type_from_name(filename: &str) -> Option<&'static str> {
    let ext = filename.rsplit('.').next()?.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some(FILE_TYPE_PDF),
        "docx" => Some(FILE_TYPE_DOCX),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_pdf_and_docx() {
        assert_eq!(file_type_from_name("cv.pdf"), Some("pdf"));
        assert_eq!(file_type_from_name("My Resume.DOCX"), Some("docx"));
    }

    #[test]
    fn test_file_type_rejects_others() {
        assert_eq!(file_type_from_name("resume.txt"), None);
        assert_eq!(file_type_from_name("noextension"), None);
    }
}
