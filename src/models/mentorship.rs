use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::validators::{double_option, validate_not_blank};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MentorshipType {
    CareerGuidance,
    TechnicalMentoring,
    InterviewPrep,
    ResumeReview,
    ProjectGuidance,
    General,
}

impl MentorshipType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MentorshipType::CareerGuidance => "career_guidance",
            MentorshipType::TechnicalMentoring => "technical_mentoring",
            MentorshipType::InterviewPrep => "interview_prep",
            MentorshipType::ResumeReview => "resume_review",
            MentorshipType::ProjectGuidance => "project_guidance",
            MentorshipType::General => "general",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "career_guidance" => Some(MentorshipType::CareerGuidance),
            "technical_mentoring" => Some(MentorshipType::TechnicalMentoring),
            "interview_prep" => Some(MentorshipType::InterviewPrep),
            "resume_review" => Some(MentorshipType::ResumeReview),
            "project_guidance" => Some(MentorshipType::ProjectGuidance),
            "general" => Some(MentorshipType::General),
            _ => None,
        }
    }
}

impl fmt::Display for MentorshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MentorshipStatus {
    #[default]
    Pending,
    Active,
    Completed,
    Cancelled,
}

impl MentorshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MentorshipStatus::Pending => "pending",
            MentorshipStatus::Active => "active",
            MentorshipStatus::Completed => "completed",
            MentorshipStatus::Cancelled => "cancelled",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(MentorshipStatus::Pending),
            "active" => Some(MentorshipStatus::Active),
            "completed" => Some(MentorshipStatus::Completed),
            "cancelled" => Some(MentorshipStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mentorship {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub mentorship_type: MentorshipType,
    pub status: MentorshipStatus,
    pub mentor_id: Uuid,
    pub mentee_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub meeting_link: Option<String>,
    pub meeting_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Mentorship {
    pub fn is_participant(&self, account_id: Uuid) -> bool {
        self.mentor_id == account_id || self.mentee_id == account_id
    }
}

/// Mentorship request. The caller always becomes the mentee.
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_create_window"))]
pub struct CreateMentorship {
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub mentorship_type: MentorshipType,
    pub mentor_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    #[validate(url)]
    pub meeting_link: Option<String>,
    pub meeting_notes: Option<String>,
}

fn validate_create_window(input: &CreateMentorship) -> Result<(), ValidationError> {
    check_window(Some(input.start_date), input.end_date)
}

/// Ensure a mentorship never ends before it starts.
pub fn check_window(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<(), ValidationError> {
    if let (Some(start), Some(end)) = (start, end)
        && end < start
    {
        let mut err = ValidationError::new("end_before_start");
        err.message = Some("end_date must not be earlier than start_date".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateMentorship {
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub mentorship_type: Option<MentorshipType>,
    pub status: Option<MentorshipStatus>,
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "double_option")]
    pub end_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub meeting_link: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub meeting_notes: Option<Option<String>>,
}
