use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

use super::{ApiError, ListQuery, ValidJson, paginate, parse_tag_ids};
use crate::{
    AppState,
    api_types::ListResponse,
    authz::Actor,
    models::{
        CreateExperience, Experience, ExperienceAnalytics, SaveToggleResponse, UpdateExperience,
    },
};

#[derive(Debug, Default, Deserialize)]
pub struct ExperienceFilter {
    pub company_id: Option<Uuid>,
    /// Comma-separated tag ids
    pub tag_ids: Option<String>,
}

/// List experiences visible to the caller, newest first.
#[tracing::instrument(name = "experiences.list", skip(state, actor, query, filter), fields(actor_id = %actor.id))]
pub async fn list(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ListQuery>,
    Query(filter): Query<ExperienceFilter>,
) -> Result<Json<ListResponse<Experience>>, ApiError> {
    let params = query.try_into_params()?;
    let tag_ids = parse_tag_ids(filter.tag_ids.as_deref())?;
    let page = state
        .services
        .experiences
        .list(&actor, filter.company_id, tag_ids, params.clone())
        .await?;
    Ok(Json(paginate(page, &params)))
}

#[tracing::instrument(name = "experiences.create", skip(state, actor, input), fields(actor_id = %actor.id))]
pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ValidJson(input): ValidJson<CreateExperience>,
) -> Result<(StatusCode, Json<Experience>), ApiError> {
    let experience = state.services.experiences.create(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(experience)))
}

/// Moderation queue.
#[tracing::instrument(name = "experiences.unverified", skip(state, actor, query), fields(actor_id = %actor.id))]
pub async fn unverified(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse<Experience>>, ApiError> {
    let params = query.try_into_params()?;
    let page = state
        .services
        .experiences
        .list_unverified(&actor, params.clone())
        .await?;
    Ok(Json(paginate(page, &params)))
}

#[tracing::instrument(name = "experiences.own", skip(state, actor, query), fields(actor_id = %actor.id))]
pub async fn own(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse<Experience>>, ApiError> {
    let params = query.try_into_params()?;
    let page = state
        .services
        .experiences
        .list_own(&actor, params.clone())
        .await?;
    Ok(Json(paginate(page, &params)))
}

#[tracing::instrument(name = "experiences.saved", skip(state, actor, query), fields(actor_id = %actor.id))]
pub async fn saved(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse<Experience>>, ApiError> {
    let params = query.try_into_params()?;
    let page = state
        .services
        .experiences
        .list_saved(&actor, params.clone())
        .await?;
    Ok(Json(paginate(page, &params)))
}

#[tracing::instrument(name = "experiences.analytics", skip(state, actor), fields(actor_id = %actor.id))]
pub async fn analytics(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<ExperienceAnalytics>, ApiError> {
    Ok(Json(state.services.experiences.analytics(&actor).await?))
}

#[tracing::instrument(name = "experiences.get", skip(state, actor), fields(actor_id = %actor.id, %id))]
pub async fn get(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<Experience>, ApiError> {
    Ok(Json(state.services.experiences.get(&actor, id).await?))
}

/// Partial update. Authors may change any editable field; staff and PR may
/// only touch `verified` and `tags` on records they do not own.
#[tracing::instrument(name = "experiences.update", skip(state, actor, patch), fields(actor_id = %actor.id, %id))]
pub async fn update(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    ValidJson(patch): ValidJson<UpdateExperience>,
) -> Result<Json<Experience>, ApiError> {
    Ok(Json(
        state.services.experiences.update(&actor, id, patch).await?,
    ))
}

#[tracing::instrument(name = "experiences.delete", skip(state, actor), fields(actor_id = %actor.id, %id))]
pub async fn delete(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.services.experiences.delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(name = "experiences.save_unsave", skip(state, actor), fields(actor_id = %actor.id, %id))]
pub async fn save_unsave(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<SaveToggleResponse>, ApiError> {
    let status = state.services.experiences.toggle_save(&actor, id).await?;
    Ok(Json(SaveToggleResponse { status }))
}

#[tracing::instrument(name = "experiences.verify", skip(state, actor), fields(actor_id = %actor.id, %id))]
pub async fn verify(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<Experience>, ApiError> {
    Ok(Json(state.services.experiences.verify(&actor, id).await?))
}
