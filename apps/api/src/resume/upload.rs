//! Resume upload pipeline: store the file, best-effort NLP extraction,
//! persist the row, bump the owner's resume count.

use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::ResumeRow;
use crate::models::SkillSet;
use crate::nlp_client::NlpService;

/// Per-file upload cap.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Rejects files over [`MAX_UPLOAD_BYTES`] with a client-facing message.
pub fn check_file_size(len: usize) -> Result<(), AppError> {
    if len > MAX_UPLOAD_BYTES {
        return Err(AppError::Validation(
            "File too large. Maximum size is 10MB.".to_string(),
        ));
    }
    Ok(())
}

/// A file pulled out of the multipart request.
pub struct UploadedFile {
    pub original_name: String,
    pub content_type: String,
    pub file_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Extraction outcome. Failure is non-fatal: the resume is still saved with
/// empty text and skills, and analysis requests will later refuse it until
/// re-upload.
pub struct Extraction {
    pub text: String,
    pub skills: SkillSet,
    pub succeeded: bool,
}

/// Calls the NLP service for text, then skills. Any upstream error is
/// logged and swallowed.
pub async fn extract_best_effort(nlp: &dyn NlpService, file: &UploadedFile) -> Extraction {
    let text = match nlp
        .extract_text(&file.original_name, &file.content_type, file.bytes.clone())
        .await
    {
        Ok(extracted) => extracted.text,
        Err(e) => {
            warn!("Text extraction failed for {}: {e}", file.original_name);
            return Extraction {
                text: String::new(),
                skills: SkillSet::default(),
                succeeded: false,
            };
        }
    };

    if text.is_empty() {
        return Extraction {
            text,
            skills: SkillSet::default(),
            succeeded: false,
        };
    }

    match nlp.extract_skills(&text).await {
        Ok(extracted) => Extraction {
            text,
            skills: SkillSet {
                technical: extracted.technical_skills,
                soft: extracted.soft_skills,
                experience: extracted.experience_keywords,
                education: extracted.education,
            },
            succeeded: true,
        },
        Err(e) => {
            warn!("Skill extraction failed for {}: {e}", file.original_name);
            Extraction {
                text,
                skills: SkillSet::default(),
                succeeded: false,
            }
        }
    }
}

/// Writes the file under `upload_dir` and returns the storage path.
pub async fn store_file(upload_dir: &str, filename: &str, bytes: &[u8]) -> anyhow::Result<String> {
    tokio::fs::create_dir_all(upload_dir).await?;
    let path = std::path::Path::new(upload_dir).join(filename);
    tokio::fs::write(&path, bytes).await?;
    Ok(path.to_string_lossy().into_owned())
}

/// Unique on-disk name; the original name is kept separately on the row.
pub fn storage_filename(resume_id: Uuid, file_type: &str) -> String {
    format!("resume-{resume_id}.{file_type}")
}

/// Inserts the resume row and increments the owner's resume count.
/// The id is generated by the caller so the on-disk filename can carry it.
pub async fn persist_resume(
    db: &PgPool,
    resume_id: Uuid,
    user_id: Uuid,
    file: &UploadedFile,
    filename: &str,
    storage_path: Option<String>,
    extraction: &Extraction,
) -> Result<ResumeRow, AppError> {
    let mut tx = db.begin().await?;

    let resume: ResumeRow = sqlx::query_as(
        r#"
        INSERT INTO resumes
            (id, user_id, filename, original_name, file_type, file_size,
             storage_path, extracted_text, skills)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(resume_id)
    .bind(user_id)
    .bind(filename)
    .bind(&file.original_name)
    .bind(file.file_type)
    .bind(file.bytes.len() as i64)
    .bind(&storage_path)
    .bind(&extraction.text)
    .bind(Json(&extraction.skills))
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("UPDATE users SET resume_count = resume_count + 1, updated_at = now() WHERE id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!(
        "Stored resume {} for user {user_id} (text: {}, skills: {})",
        resume.id,
        !resume.extracted_text.is_empty(),
        extraction.succeeded
    );

    Ok(resume)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlp_client::{
        ExtractedSkills, ExtractedText, MatchReport, NlpError, RecommendationReport,
    };
    use async_trait::async_trait;

    /// Scoring collaborator stub: extraction succeeds or the whole service
    /// is "down", depending on the flag.
    struct StubNlp {
        healthy: bool,
    }

    fn down() -> NlpError {
        NlpError::Api {
            status: 503,
            message: "service unavailable".to_string(),
        }
    }

    #[async_trait]
    impl crate::nlp_client::NlpService for StubNlp {
        async fn extract_text(
            &self,
            _filename: &str,
            _content_type: &str,
            _bytes: Vec<u8>,
        ) -> Result<ExtractedText, NlpError> {
            if self.healthy {
                Ok(ExtractedText {
                    text: "Rust engineer, 5 years".to_string(),
                })
            } else {
                Err(down())
            }
        }

        async fn extract_skills(&self, _text: &str) -> Result<ExtractedSkills, NlpError> {
            if self.healthy {
                Ok(ExtractedSkills {
                    technical_skills: vec!["rust".to_string()],
                    ..ExtractedSkills::default()
                })
            } else {
                Err(down())
            }
        }

        async fn match_resume(
            &self,
            _resume_text: &str,
            _job_description: &str,
        ) -> Result<MatchReport, NlpError> {
            Err(down())
        }

        async fn recommend(
            &self,
            _resume_text: &str,
            _job_description: &str,
        ) -> Result<RecommendationReport, NlpError> {
            Err(down())
        }
    }

    fn sample_file() -> UploadedFile {
        UploadedFile {
            original_name: "cv.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            file_type: "pdf",
            bytes: b"%PDF-1.4".to_vec(),
        }
    }

    #[tokio::test]
    async fn test_extraction_happy_path() {
        let extraction = extract_best_effort(&StubNlp { healthy: true }, &sample_file()).await;
        assert!(extraction.succeeded);
        assert_eq!(extraction.text, "Rust engineer, 5 years");
        assert_eq!(extraction.skills.technical, vec!["rust"]);
    }

    #[tokio::test]
    async fn test_extraction_failure_is_non_fatal() {
        let extraction = extract_best_effort(&StubNlp { healthy: false }, &sample_file()).await;
        assert!(!extraction.succeeded);
        assert!(extraction.text.is_empty());
        assert!(extraction.skills.technical.is_empty());
    }

    #[test]
    fn test_file_size_cap() {
        assert!(check_file_size(0).is_ok());
        assert!(check_file_size(MAX_UPLOAD_BYTES).is_ok());
        let err = check_file_size(MAX_UPLOAD_BYTES + 1).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("10MB")));
    }

    #[test]
    fn test_storage_filename_carries_extension() {
        let id = Uuid::new_v4();
        let name = storage_filename(id, "pdf");
        assert!(name.starts_with("resume-"));
        assert!(name.ends_with(".pdf"));
    }

    #[tokio::test]
    async fn test_store_file_writes_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let dir_str = dir.path().to_str().unwrap();
        let path = store_file(dir_str, "cv.pdf", b"%PDF-1.4").await.unwrap();
        let written = tokio::fs::read(&path).await.unwrap();
        assert_eq!(written, b"%PDF-1.4");
    }
}
