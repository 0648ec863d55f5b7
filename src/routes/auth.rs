//! Sign-in, token refresh and account self-service.

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{ApiError, ValidJson};
use crate::{
    AppState,
    auth::{AuthError, TokenPair},
    authz::Actor,
    models::{Account, AssignableRole, GoogleSignInRequest, SetRoleRequest, UpdateBackupEmail},
    observability::metrics,
};

#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub tokens: TokenPair,
    pub user: Account,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1))]
    pub refresh: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub tokens: TokenPair,
}

/// Exchange a Google ID token for a portal token pair.
///
/// The account is looked up by the token's email (then by backup email). A
/// first sign-in from the institution domain provisions a student account from
/// the profile fields in the body.
#[tracing::instrument(name = "auth.google_oauth", skip(state, input))]
pub async fn google_oauth(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<GoogleSignInRequest>,
) -> Result<(StatusCode, Json<SignInResponse>), ApiError> {
    let identity = match state.google.verify(&input.id_token).await {
        Ok(identity) => identity,
        Err(e) => {
            metrics::record_auth_attempt("google", false);
            return Err(e.into());
        }
    };

    let suffix = state.config.auth.institution_email_suffix();
    let (account, resolution) = state
        .services
        .accounts
        .resolve_or_provision(&identity, &suffix, input.profile)
        .await
        .inspect_err(|_| metrics::record_auth_attempt("google", false))?;

    let tokens = state.tokens.issue_pair(account.id)?;
    metrics::record_auth_attempt("google", true);
    tracing::info!(
        account_id = %account.id,
        resolution = resolution.as_str(),
        "Signed in with Google"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(SignInResponse {
            tokens,
            user: account,
        }),
    ))
}

/// Trade a refresh token for a new pair.
#[tracing::instrument(name = "auth.refresh", skip(state, input))]
pub async fn refresh(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<RefreshRequest>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let account_id = state
        .tokens
        .verify_refresh(&input.refresh)
        .inspect_err(|_| metrics::record_auth_attempt("refresh", false))?;

    let active = state
        .services
        .accounts
        .get_by_id(account_id)
        .await?
        .is_some_and(|a| a.is_active);
    if !active {
        metrics::record_auth_attempt("refresh", false);
        return Err(AuthError::InactiveAccount.into());
    }

    let tokens = state.tokens.issue_pair(account_id)?;
    metrics::record_auth_attempt("refresh", true);
    Ok(Json(RefreshResponse { tokens }))
}

#[tracing::instrument(name = "auth.me", skip(account), fields(account_id = %account.id))]
pub async fn me(Extension(account): Extension<Account>) -> Json<Account> {
    Json(account)
}

#[tracing::instrument(name = "auth.backup_email", skip(state, actor, input), fields(actor_id = %actor.id))]
pub async fn set_backup_email(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ValidJson(input): ValidJson<UpdateBackupEmail>,
) -> Result<Json<Account>, ApiError> {
    let account = state
        .services
        .accounts
        .set_backup_email(
            &actor,
            &input.backup_email,
            &state.config.auth.institution_email_suffix(),
        )
        .await?;
    Ok(Json(account))
}

#[tracing::instrument(name = "auth.set_pr", skip(state, actor, input), fields(actor_id = %actor.id))]
pub async fn set_pr(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ValidJson(input): ValidJson<SetRoleRequest>,
) -> Result<Json<Account>, ApiError> {
    assign_role(&state, &actor, &input.email, AssignableRole::Pr).await
}

#[tracing::instrument(name = "auth.set_spoc", skip(state, actor, input), fields(actor_id = %actor.id))]
pub async fn set_spoc(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ValidJson(input): ValidJson<SetRoleRequest>,
) -> Result<Json<Account>, ApiError> {
    assign_role(&state, &actor, &input.email, AssignableRole::Spoc).await
}

async fn assign_role(
    state: &AppState,
    actor: &Actor,
    email: &str,
    role: AssignableRole,
) -> Result<Json<Account>, ApiError> {
    let account = state.services.accounts.set_role(actor, email, role).await?;
    Ok(Json(account))
}
