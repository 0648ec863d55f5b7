use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::validators::{double_option, validate_not_blank};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    #[default]
    Fte,
    Internship,
    Research,
    Other,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::Fte => "fte",
            JobType::Internship => "internship",
            JobType::Research => "research",
            JobType::Other => "other",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "fte" => Some(JobType::Fte),
            "internship" => Some(JobType::Internship),
            "research" => Some(JobType::Research),
            "other" => Some(JobType::Other),
            _ => None,
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An interview or placement write-up shared by an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experience {
    pub id: Uuid,
    pub title: String,
    /// Role title the author interviewed for
    pub role: String,
    pub short_description: String,
    /// Structured long-form body (rich-text document or free text)
    pub content: Option<serde_json::Value>,
    pub tips: Option<String>,
    pub compensation: Option<String>,
    pub experience_date: NaiveDate,
    pub job_type: JobType,
    pub visibility: bool,
    pub verified: bool,
    pub author_id: Uuid,
    pub company_id: Uuid,
    pub tags: Vec<Uuid>,
    /// Set once at creation
    pub published_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Incremented on every write; guards concurrent policy-gated updates
    pub version: i64,
}

/// Create payload. Author and verification state are never read from the
/// client; unknown fields such as `author` or `verified` are ignored.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateExperience {
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub title: String,
    #[validate(length(min = 1, max = 100), custom(function = "validate_not_blank"))]
    pub role: String,
    #[validate(length(min = 1))]
    pub short_description: String,
    pub content: Option<serde_json::Value>,
    pub tips: Option<String>,
    pub compensation: Option<String>,
    pub experience_date: NaiveDate,
    pub job_type: JobType,
    pub company_id: Uuid,
    #[serde(default)]
    pub tags: Vec<Uuid>,
    #[serde(default = "default_visibility")]
    pub visibility: bool,
}

fn default_visibility() -> bool {
    true
}

/// Partial update. Field presence drives the authorization decision, so
/// unknown fields are rejected rather than silently dropped.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateExperience {
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 100), custom(function = "validate_not_blank"))]
    pub role: Option<String>,
    #[validate(length(min = 1))]
    pub short_description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub content: Option<Option<serde_json::Value>>,
    #[serde(default, deserialize_with = "double_option")]
    pub tips: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub compensation: Option<Option<String>>,
    pub experience_date: Option<NaiveDate>,
    pub job_type: Option<JobType>,
    pub company_id: Option<Uuid>,
    pub visibility: Option<bool>,
    pub verified: Option<bool>,
    pub tags: Option<Vec<Uuid>>,
}

impl UpdateExperience {
    /// Names of the fields present in the payload.
    pub fn present_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.title.is_some() {
            fields.push("title");
        }
        if self.role.is_some() {
            fields.push("role");
        }
        if self.short_description.is_some() {
            fields.push("short_description");
        }
        if self.content.is_some() {
            fields.push("content");
        }
        if self.tips.is_some() {
            fields.push("tips");
        }
        if self.compensation.is_some() {
            fields.push("compensation");
        }
        if self.experience_date.is_some() {
            fields.push("experience_date");
        }
        if self.job_type.is_some() {
            fields.push("job_type");
        }
        if self.company_id.is_some() {
            fields.push("company_id");
        }
        if self.visibility.is_some() {
            fields.push("visibility");
        }
        if self.verified.is_some() {
            fields.push("verified");
        }
        if self.tags.is_some() {
            fields.push("tags");
        }
        fields
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveState {
    Saved,
    Unsaved,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveToggleResponse {
    pub status: SaveState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_ignores_client_controlled_fields() {
        let input: CreateExperience = serde_json::from_value(serde_json::json!({
            "title": "SDE intern at Acme",
            "role": "SDE Intern",
            "short_description": "Two rounds",
            "experience_date": "2025-07-01",
            "job_type": "internship",
            "company_id": Uuid::new_v4(),
            "author": Uuid::new_v4(),
            "verified": true
        }))
        .unwrap();

        assert!(input.visibility);
        assert!(input.tags.is_empty());
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_create_requires_company() {
        let result = serde_json::from_value::<CreateExperience>(serde_json::json!({
            "title": "t",
            "role": "r",
            "short_description": "s",
            "experience_date": "2025-07-01",
            "job_type": "fte"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_update_present_fields() {
        let update: UpdateExperience = serde_json::from_value(serde_json::json!({
            "verified": true,
            "tags": [],
            "tips": null
        }))
        .unwrap();
        assert_eq!(update.present_fields(), vec!["tips", "verified", "tags"]);

        let empty = UpdateExperience::default();
        assert!(empty.present_fields().is_empty());
    }

    #[test]
    fn test_update_rejects_unknown_fields() {
        let result = serde_json::from_value::<UpdateExperience>(serde_json::json!({
            "author_id": Uuid::new_v4()
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_job_type_parse() {
        assert_eq!(JobType::from_str("research"), Some(JobType::Research));
        assert_eq!(JobType::from_str("contract"), None);
        assert_eq!(JobType::Fte.to_string(), "fte");
    }
}
