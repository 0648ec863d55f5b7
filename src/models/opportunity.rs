use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::validators::{double_option, validate_not_blank};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityType {
    Internship,
    Hackathon,
    Scholarship,
    Event,
    Job,
    Other,
}

impl OpportunityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpportunityType::Internship => "internship",
            OpportunityType::Hackathon => "hackathon",
            OpportunityType::Scholarship => "scholarship",
            OpportunityType::Event => "event",
            OpportunityType::Job => "job",
            OpportunityType::Other => "other",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "internship" => Some(OpportunityType::Internship),
            "hackathon" => Some(OpportunityType::Hackathon),
            "scholarship" => Some(OpportunityType::Scholarship),
            "event" => Some(OpportunityType::Event),
            "job" => Some(OpportunityType::Job),
            "other" => Some(OpportunityType::Other),
            _ => None,
        }
    }
}

impl fmt::Display for OpportunityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Opportunity {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub opportunity_type: OpportunityType,
    pub company_id: Option<Uuid>,
    pub application_deadline: Option<DateTime<Utc>>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub is_remote: bool,
    pub compensation: Option<String>,
    pub requirements: Option<String>,
    pub application_link: Option<String>,
    pub contact_email: Option<String>,
    pub visibility: bool,
    pub verified: bool,
    pub created_by: Uuid,
    pub verified_by: Option<Uuid>,
    pub tags: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set the first time the opportunity is verified
    pub published_at: Option<DateTime<Utc>>,
    pub version: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOpportunity {
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub title: String,
    #[validate(length(min = 1))]
    pub description: String,
    pub opportunity_type: OpportunityType,
    pub company_id: Option<Uuid>,
    pub application_deadline: Option<DateTime<Utc>>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[validate(length(max = 200))]
    pub location: Option<String>,
    #[serde(default)]
    pub is_remote: bool,
    pub compensation: Option<String>,
    pub requirements: Option<String>,
    #[validate(url)]
    pub application_link: Option<String>,
    #[validate(email)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub tags: Vec<Uuid>,
    #[serde(default = "default_visibility")]
    pub visibility: bool,
}

fn default_visibility() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateOpportunity {
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub description: Option<String>,
    pub opportunity_type: Option<OpportunityType>,
    #[serde(default, deserialize_with = "double_option")]
    pub company_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    pub application_deadline: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub start_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub end_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub location: Option<Option<String>>,
    pub is_remote: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub compensation: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub requirements: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub application_link: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub contact_email: Option<Option<String>>,
    pub visibility: Option<bool>,
    pub verified: Option<bool>,
    pub tags: Option<Vec<Uuid>>,
}

impl UpdateOpportunity {
    /// Names of the fields present in the payload.
    pub fn present_fields(&self) -> Vec<&'static str> {
        [
            ("title", self.title.is_some()),
            ("description", self.description.is_some()),
            ("opportunity_type", self.opportunity_type.is_some()),
            ("company_id", self.company_id.is_some()),
            ("application_deadline", self.application_deadline.is_some()),
            ("start_date", self.start_date.is_some()),
            ("end_date", self.end_date.is_some()),
            ("location", self.location.is_some()),
            ("is_remote", self.is_remote.is_some()),
            ("compensation", self.compensation.is_some()),
            ("requirements", self.requirements.is_some()),
            ("application_link", self.application_link.is_some()),
            ("contact_email", self.contact_email.is_some()),
            ("visibility", self.visibility.is_some()),
            ("verified", self.verified.is_some()),
            ("tags", self.tags.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, present)| present.then_some(name))
        .collect()
    }

    /// Validate the nested link/email values that `validator` cannot reach
    /// through the double option.
    pub fn validate_nested(&self) -> Result<(), String> {
        use validator::{ValidateEmail, ValidateUrl};

        if let Some(Some(link)) = &self.application_link
            && !link.validate_url()
        {
            return Err("application_link must be a valid URL".into());
        }
        if let Some(Some(email)) = &self.contact_email
            && !email.validate_email()
        {
            return Err("contact_email must be a valid email address".into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpportunityQuery {
    /// Filter by opportunity type
    #[serde(rename = "type")]
    pub opportunity_type: Option<OpportunityType>,
    /// Filter by company slug
    pub company: Option<String>,
    /// Case-insensitive substring match on title or description
    pub search: Option<String>,
    /// Comma-separated tag ids; matches records with any of them
    pub tag_ids: Option<String>,
}
