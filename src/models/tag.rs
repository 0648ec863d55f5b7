use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::validators::{double_option, validate_not_blank};

/// Category label grouping tags (e.g. "Domain", "Round").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagType {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTagType {
    #[validate(length(min = 1, max = 100), custom(function = "validate_not_blank"))]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateTagType {
    #[validate(length(min = 1, max = 100), custom(function = "validate_not_blank"))]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub title: String,
    /// Detached (null) when the tag type is deleted
    pub type_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTag {
    #[validate(length(min = 1, max = 100), custom(function = "validate_not_blank"))]
    pub title: String,
    pub type_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateTag {
    #[validate(length(min = 1, max = 100), custom(function = "validate_not_blank"))]
    pub title: Option<String>,
    /// Use null to detach the tag from its type
    #[serde(default, deserialize_with = "double_option")]
    pub type_id: Option<Option<Uuid>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_tag_title_rejected() {
        let tag = CreateTag {
            title: "   ".into(),
            type_id: None,
        };
        assert!(tag.validate().is_err());
    }

    #[test]
    fn test_update_tag_type_id_states() {
        let detach: UpdateTag =
            serde_json::from_value(serde_json::json!({ "type_id": null })).unwrap();
        assert_eq!(detach.type_id, Some(None));

        let keep: UpdateTag =
            serde_json::from_value(serde_json::json!({ "title": "DSA" })).unwrap();
        assert_eq!(keep.type_id, None);
    }
}
