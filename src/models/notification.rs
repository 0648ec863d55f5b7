use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::validators::validate_not_blank;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Opportunity,
    Experience,
    Mentorship,
    Verification,
    #[default]
    System,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Opportunity => "opportunity",
            NotificationType::Experience => "experience",
            NotificationType::Mentorship => "mentorship",
            NotificationType::Verification => "verification",
            NotificationType::System => "system",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "opportunity" => Some(NotificationType::Opportunity),
            "experience" => Some(NotificationType::Experience),
            "mentorship" => Some(NotificationType::Mentorship),
            "verification" => Some(NotificationType::Verification),
            "system" => Some(NotificationType::System),
            _ => None,
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    /// Owning account
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub notification_type: NotificationType,
    pub is_read: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_opportunity_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_experience_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_mentorship_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_single_relation"))]
pub struct CreateNotification {
    pub user_id: Uuid,
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub title: String,
    #[validate(length(min = 1))]
    pub message: String,
    #[serde(default)]
    pub notification_type: NotificationType,
    pub related_opportunity_id: Option<Uuid>,
    pub related_experience_id: Option<Uuid>,
    pub related_mentorship_id: Option<Uuid>,
}

fn validate_single_relation(input: &CreateNotification) -> Result<(), ValidationError> {
    let related = [
        input.related_opportunity_id,
        input.related_experience_id,
        input.related_mentorship_id,
    ]
    .iter()
    .filter(|id| id.is_some())
    .count();

    if related > 1 {
        let mut err = ValidationError::new("multiple_relations");
        err.message = Some("A notification may reference at most one related record".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MarkAllReadResponse {
    pub updated: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_type_is_system() {
        let input: CreateNotification = serde_json::from_value(serde_json::json!({
            "user_id": Uuid::new_v4(),
            "title": "Welcome",
            "message": "Your account is ready"
        }))
        .unwrap();
        assert_eq!(input.notification_type, NotificationType::System);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_at_most_one_relation() {
        let input: CreateNotification = serde_json::from_value(serde_json::json!({
            "user_id": Uuid::new_v4(),
            "title": "Heads up",
            "message": "Two links",
            "notification_type": "opportunity",
            "related_opportunity_id": Uuid::new_v4(),
            "related_experience_id": Uuid::new_v4()
        }))
        .unwrap();
        assert!(input.validate().is_err());
    }
}
