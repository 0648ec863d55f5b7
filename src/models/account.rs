use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Role held by an account. Every branch of the authorization policy matches
/// on this exhaustively.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Student,
    Spoc,
    Pr,
    Admin,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Student, Role::Spoc, Role::Pr, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Spoc => "spoc",
            Role::Pr => "pr",
            Role::Admin => "admin",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "student" => Some(Role::Student),
            "spoc" => Some(Role::Spoc),
            "pr" => Some(Role::Pr),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Roles that can be granted through the role-assignment endpoints.
/// `admin` is deliberately absent; admins are only created out of band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignableRole {
    Pr,
    Spoc,
}

impl From<AssignableRole> for Role {
    fn from(role: AssignableRole) -> Self {
        match role {
            AssignableRole::Pr => Role::Pr,
            AssignableRole::Spoc => Role::Spoc,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    /// Sign-in identity (institutional Google account)
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_email: Option<String>,
    pub name: String,
    /// Immutable once issued
    pub roll_number: String,
    pub department: String,
    pub programme: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile data used when provisioning a new account at first sign-in.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub name: String,
    pub roll_number: String,
    pub department: String,
    pub programme: String,
    pub role: Role,
}

/// Identity asserted by a verified Google ID token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    /// Lowercased email from the token's `email` claim
    pub email: String,
    /// Display name from the token's `name` claim
    pub name: Option<String>,
}

/// Profile fields the client may send at sign-in. Only read when a new
/// account is provisioned.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProvisionProfile {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 32))]
    pub roll_number: Option<String>,
    #[validate(length(max = 200))]
    pub department: Option<String>,
    #[validate(length(max = 200))]
    pub programme: Option<String>,
}

/// Body of `POST /auth/google-oauth`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GoogleSignInRequest {
    #[validate(length(min = 1))]
    pub id_token: String,
    #[serde(flatten)]
    #[validate(nested)]
    pub profile: ProvisionProfile,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateBackupEmail {
    #[validate(email, length(max = 254))]
    pub backup_email: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SetRoleRequest {
    /// Email of the account whose role changes
    #[validate(email, length(max = 254))]
    pub email: String,
}

/// Public subset of an account shown to other users (mentor pickers etc).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub department: String,
    pub programme: String,
    pub role: Role,
}

impl From<Account> for AccountSummary {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            name: account.name,
            email: account.email,
            department: account.department,
            programme: account.programme,
            role: account.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip_through_str() {
        for role in Role::ALL {
            assert_eq!(Role::from_str(role.as_str()), Some(role));
        }
        assert_eq!(Role::from_str("superuser"), None);
        assert_eq!(Role::from_str("Admin"), None);
    }

    #[test]
    fn test_role_serde() {
        assert_eq!(serde_json::to_string(&Role::Spoc).unwrap(), "\"spoc\"");
        let role: Role = serde_json::from_str("\"pr\"").unwrap();
        assert_eq!(role, Role::Pr);
        assert!(serde_json::from_str::<Role>("\"owner\"").is_err());
    }

    #[test]
    fn test_assignable_role_never_admin() {
        assert_eq!(Role::from(AssignableRole::Pr), Role::Pr);
        assert_eq!(Role::from(AssignableRole::Spoc), Role::Spoc);
    }

    #[test]
    fn test_backup_email_validation() {
        let ok = UpdateBackupEmail {
            backup_email: "alum@example.com".into(),
        };
        assert!(ok.validate().is_ok());

        let bad = UpdateBackupEmail {
            backup_email: "not-an-email".into(),
        };
        assert!(bad.validate().is_err());
    }
}
