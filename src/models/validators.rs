use std::borrow::Cow;

use serde::{Deserialize, Deserializer};
use validator::ValidationError;

/// Maximum slug length derived from a company name.
pub const MAX_SLUG_LENGTH: usize = 200;

/// Derive a URL-friendly slug from a display name.
///
/// Lowercases ASCII alphanumerics and collapses every other run of characters
/// into a single hyphen. "Goldman Sachs & Co." becomes "goldman-sachs-co".
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug.truncate(MAX_SLUG_LENGTH);
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Check that a slug is lowercase alphanumeric segments separated by single hyphens.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= MAX_SLUG_LENGTH
        && slug
            .split('-')
            .all(|segment| !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit()))
}

/// Reject names that would produce an empty slug (e.g. "!!!").
pub fn validate_sluggable(name: &str) -> Result<(), ValidationError> {
    if is_valid_slug(&slugify(name)) {
        return Ok(());
    }
    let mut err = ValidationError::new("unsluggable_name");
    err.message = Some(Cow::Borrowed(
        "Name must contain at least one ASCII letter or digit",
    ));
    Err(err)
}

/// Reject strings that are empty once surrounding whitespace is removed.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some(Cow::Borrowed("Value cannot be blank"));
        return Err(err);
    }
    Ok(())
}

/// Deserializer for `Option<Option<T>>` patch fields:
/// - field absent -> None (leave unchanged)
/// - field null -> Some(None) (clear)
/// - field with value -> Some(Some(value)) (set)
///
/// Use together with `#[serde(default)]`.
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::<T>::deserialize(deserializer)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Goldman Sachs & Co."), "goldman-sachs-co");
        assert_eq!(slugify("  Google  "), "google");
        assert_eq!(slugify("J.P. Morgan"), "j-p-morgan");
        assert_eq!(slugify("ISRO"), "isro");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_slugify_output_is_valid_slug() {
        for name in ["Texas Instruments", "D. E. Shaw", "a--b", "Tata Consultancy Services (TCS)"] {
            assert!(is_valid_slug(&slugify(name)), "{name}");
        }
    }

    #[test]
    fn test_is_valid_slug() {
        assert!(is_valid_slug("my-company"));
        assert!(is_valid_slug("abc123"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("-leading"));
        assert!(!is_valid_slug("trailing-"));
        assert!(!is_valid_slug("double--hyphen"));
        assert!(!is_valid_slug("Upper"));
    }

    #[test]
    fn test_validate_sluggable() {
        assert!(validate_sluggable("Amazon").is_ok());
        assert!(validate_sluggable("???").is_err());
    }

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("x").is_ok());
        assert!(validate_not_blank("   ").is_err());
    }

    #[test]
    fn test_double_option() {
        #[derive(Deserialize)]
        struct Patch {
            #[serde(default, deserialize_with = "double_option")]
            tips: Option<Option<String>>,
        }

        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.tips, None);

        let cleared: Patch = serde_json::from_str(r#"{"tips": null}"#).unwrap();
        assert_eq!(cleared.tips, Some(None));

        let set: Patch = serde_json::from_str(r#"{"tips": "practice DP"}"#).unwrap();
        assert_eq!(set.tips, Some(Some("practice DP".into())));
    }
}
