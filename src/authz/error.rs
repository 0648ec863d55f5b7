//! Authorization errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthzError {
    /// The actor may not perform the operation at all.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// The actor may write to the record, but not to these fields. Nothing is
    /// applied.
    #[error("Elevated roles may only change {allowed}; rejected fields: {}", .rejected.join(", "))]
    RestrictedFields {
        allowed: String,
        rejected: Vec<&'static str>,
    },
}

impl AuthzError {
    pub fn access_denied(reason: impl Into<String>) -> Self {
        Self::AccessDenied(reason.into())
    }
}
