use axum::{
    Json,
    extract::{FromRequest, Request},
};
use axum_valid::{Valid, ValidationRejection};
use serde::de::DeserializeOwned;
use validator::Validate;

use super::ApiError;

/// JSON body that has been deserialized and validated. Every failure is
/// answered with the standard error envelope as `400 invalid_request_error`.
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Valid::<Json<T>>::from_request(req, state).await {
            Ok(Valid(Json(value))) => Ok(Self(value)),
            Err(ValidationRejection::Valid(errors)) => Err(ApiError::BadRequest(format!(
                "Invalid request body: {errors}"
            ))),
            Err(ValidationRejection::Inner(rejection)) => {
                Err(ApiError::BadRequest(rejection.body_text()))
            }
        }
    }
}
