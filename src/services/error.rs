use thiserror::Error;

use crate::{authz::AuthzError, db::DbError};

/// Errors from service operations that combine authorization with storage.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Database(#[from] DbError),

    #[error(transparent)]
    Authz(#[from] AuthzError),

    /// Record absent or not visible to the caller; the two are not distinguished.
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Validation(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
