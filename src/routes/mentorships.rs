use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use super::{ApiError, ListQuery, ValidJson, paginate};
use crate::{
    AppState,
    api_types::ListResponse,
    authz::Actor,
    models::{AccountSummary, CreateMentorship, Mentorship, UpdateMentorship},
};

/// Mentorships where the caller is mentor or mentee.
#[tracing::instrument(name = "mentorships.list", skip(state, actor, query), fields(actor_id = %actor.id))]
pub async fn list(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse<Mentorship>>, ApiError> {
    let params = query.try_into_params()?;
    let page = state
        .services
        .mentorships
        .list(&actor, params.clone())
        .await?;
    Ok(Json(paginate(page, &params)))
}

/// The caller becomes the mentee; status starts as pending.
#[tracing::instrument(name = "mentorships.create", skip(state, actor, input), fields(actor_id = %actor.id))]
pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ValidJson(input): ValidJson<CreateMentorship>,
) -> Result<(StatusCode, Json<Mentorship>), ApiError> {
    let mentorship = state.services.mentorships.create(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(mentorship)))
}

#[tracing::instrument(name = "mentorships.available_mentors", skip(state, actor), fields(actor_id = %actor.id))]
pub async fn available_mentors(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<AccountSummary>>, ApiError> {
    Ok(Json(state.services.accounts.available_mentors(&actor).await?))
}

#[tracing::instrument(name = "mentorships.get", skip(state, actor), fields(actor_id = %actor.id, %id))]
pub async fn get(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<Mentorship>, ApiError> {
    Ok(Json(state.services.mentorships.get(&actor, id).await?))
}

#[tracing::instrument(name = "mentorships.update", skip(state, actor, input), fields(actor_id = %actor.id, %id))]
pub async fn update(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    ValidJson(input): ValidJson<UpdateMentorship>,
) -> Result<Json<Mentorship>, ApiError> {
    Ok(Json(
        state.services.mentorships.update(&actor, id, input).await?,
    ))
}

#[tracing::instrument(name = "mentorships.delete", skip(state, actor), fields(actor_id = %actor.id, %id))]
pub async fn delete(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.services.mentorships.delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
