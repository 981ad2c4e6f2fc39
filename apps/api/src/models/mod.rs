pub mod analysis;
pub mod job;
pub mod resume;
pub mod user;

use serde::{Deserialize, Serialize};

/// Categorized skill lists, stored as JSONB on both resumes and jobs.
/// Resumes fill all four lists; jobs leave `education` empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SkillSet {
    #[serde(default)]
    pub technical: Vec<String>,
    #[serde(default)]
    pub soft: Vec<String>,
    #[serde(default)]
    pub experience: Vec<String>,
    #[serde(default)]
    pub education: Vec<String>,
}

/// Offset pagination envelope for list endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub has_more: bool,
}

impl Pagination {
    pub fn new(total: i64, limit: i64, offset: i64, page_len: usize) -> Self {
        Self {
            total,
            limit,
            offset,
            has_more: offset + (page_len as i64) < total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_has_more() {
        let p = Pagination::new(25, 10, 0, 10);
        assert!(p.has_more);
        let p = Pagination::new(25, 10, 20, 5);
        assert!(!p.has_more);
    }

    #[test]
    fn test_skill_set_defaults_from_empty_json() {
        let skills: SkillSet = serde_json::from_str("{}").unwrap();
        assert!(skills.technical.is_empty());
        assert!(skills.education.is_empty());
    }
}
