use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::validators::{double_option, validate_sluggable};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    /// Derived from `name`; re-derived on rename
    pub slug: String,
    pub logo_path: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCompany {
    #[validate(length(min = 1, max = 200), custom(function = "validate_sluggable"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub logo_path: String,
    #[serde(default)]
    pub description: String,
    #[validate(url)]
    pub website: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateCompany {
    #[validate(length(min = 1, max = 200), custom(function = "validate_sluggable"))]
    pub name: Option<String>,
    #[validate(length(max = 200))]
    pub logo_path: Option<String>,
    pub description: Option<String>,
    /// Use null to remove the website
    #[serde(default, deserialize_with = "double_option")]
    pub website: Option<Option<String>>,
}

impl UpdateCompany {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.logo_path.is_none()
            && self.description.is_none()
            && self.website.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_company_validation() {
        let input: CreateCompany = serde_json::from_value(serde_json::json!({
            "name": "Texas Instruments",
            "website": "https://ti.com"
        }))
        .unwrap();
        assert!(input.validate().is_ok());

        let bad_name: CreateCompany =
            serde_json::from_value(serde_json::json!({ "name": "***" })).unwrap();
        assert!(bad_name.validate().is_err());

        let bad_site: CreateCompany = serde_json::from_value(serde_json::json!({
            "name": "Acme",
            "website": "not a url"
        }))
        .unwrap();
        assert!(bad_site.validate().is_err());
    }

    #[test]
    fn test_update_company_website_clear() {
        let update: UpdateCompany =
            serde_json::from_value(serde_json::json!({ "website": null })).unwrap();
        assert_eq!(update.website, Some(None));
        assert!(!update.is_empty());

        let empty: UpdateCompany = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_update_company_rejects_slug() {
        let result =
            serde_json::from_value::<UpdateCompany>(serde_json::json!({ "slug": "custom" }));
        assert!(result.is_err());
    }
}
