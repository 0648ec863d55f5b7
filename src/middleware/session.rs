//! Bearer session authentication for protected routes.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use super::RequestId;
use crate::{AppState, auth::AuthError, authz::Actor, observability::metrics};

/// Requires a valid access token and attaches the caller's [`Actor`] and
/// [`Account`](crate::models::Account) to the request.
///
/// The account is re-read on every request so role changes and deactivation
/// apply to tokens that were issued earlier.
pub async fn session_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let request_id = req.extensions().get::<RequestId>().cloned();

    let token = bearer_token(&req).ok_or(AuthError::MissingCredentials)?;

    let account_id = match state.tokens.verify_access(token) {
        Ok(id) => id,
        Err(e) => {
            metrics::record_auth_attempt("bearer", false);
            return Err(e);
        }
    };

    let account = state
        .services
        .accounts
        .get_by_id(account_id)
        .await
        .map_err(|e| AuthError::Internal(e.to_string()))?;

    let Some(account) = account.filter(|a| a.is_active) else {
        metrics::record_auth_attempt("bearer", false);
        tracing::info!(account_id = %account_id, "Token presented for missing or inactive account");
        return Err(AuthError::InactiveAccount);
    };

    metrics::record_auth_attempt("bearer", true);
    tracing::debug!(
        request_id = ?request_id.as_ref().map(RequestId::as_str),
        account_id = %account.id,
        role = %account.role,
        "Request authenticated"
    );

    req.extensions_mut().insert(Actor::from(&account));
    req.extensions_mut().insert(account);

    Ok(next.run(req).await)
}

fn bearer_token(req: &Request) -> Option<&str> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;

    use super::*;

    fn request(header: Option<&str>) -> Request {
        let mut builder = Request::builder().uri("/auth/me");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&request(Some("Bearer abc.def"))), Some("abc.def"));
        assert_eq!(bearer_token(&request(Some("bearer  abc"))), Some("abc"));
        assert_eq!(bearer_token(&request(Some("Basic abc"))), None);
        assert_eq!(bearer_token(&request(Some("Bearer "))), None);
        assert_eq!(bearer_token(&request(None)), None);
    }
}
