//! Tags and tag types. Reads are open to any signed-in account; writes are staff only.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use super::{ApiError, ValidJson};
use crate::{
    AppState,
    authz::Actor,
    models::{CreateTag, CreateTagType, Tag, TagType, UpdateTag, UpdateTagType},
};

#[tracing::instrument(name = "tags.list", skip(state))]
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Tag>>, ApiError> {
    Ok(Json(state.services.tags.list().await?))
}

#[tracing::instrument(name = "tags.create", skip(state, actor, input), fields(actor_id = %actor.id))]
pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ValidJson(input): ValidJson<CreateTag>,
) -> Result<(StatusCode, Json<Tag>), ApiError> {
    let tag = state.services.tags.create(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

#[tracing::instrument(name = "tags.get", skip(state), fields(%id))]
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Tag>, ApiError> {
    Ok(Json(state.services.tags.get(id).await?))
}

#[tracing::instrument(name = "tags.update", skip(state, actor, input), fields(actor_id = %actor.id, %id))]
pub async fn update(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    ValidJson(input): ValidJson<UpdateTag>,
) -> Result<Json<Tag>, ApiError> {
    Ok(Json(state.services.tags.update(&actor, id, input).await?))
}

/// Also detaches the tag from every experience and opportunity.
#[tracing::instrument(name = "tags.delete", skip(state, actor), fields(actor_id = %actor.id, %id))]
pub async fn delete(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.services.tags.delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(name = "tag_types.list", skip(state))]
pub async fn list_types(State(state): State<AppState>) -> Result<Json<Vec<TagType>>, ApiError> {
    Ok(Json(state.services.tags.list_types().await?))
}

#[tracing::instrument(name = "tag_types.create", skip(state, actor, input), fields(actor_id = %actor.id))]
pub async fn create_type(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ValidJson(input): ValidJson<CreateTagType>,
) -> Result<(StatusCode, Json<TagType>), ApiError> {
    let tag_type = state.services.tags.create_type(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(tag_type)))
}

#[tracing::instrument(name = "tag_types.get", skip(state), fields(%id))]
pub async fn get_type(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TagType>, ApiError> {
    Ok(Json(state.services.tags.get_type(id).await?))
}

#[tracing::instrument(name = "tag_types.update", skip(state, actor, input), fields(actor_id = %actor.id, %id))]
pub async fn update_type(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    ValidJson(input): ValidJson<UpdateTagType>,
) -> Result<Json<TagType>, ApiError> {
    Ok(Json(
        state.services.tags.rename_type(&actor, id, input).await?,
    ))
}

/// Tags of the deleted type are kept with no type.
#[tracing::instrument(name = "tag_types.delete", skip(state, actor), fields(actor_id = %actor.id, %id))]
pub async fn delete_type(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.services.tags.delete_type(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(name = "tag_types.tags", skip(state), fields(%id))]
pub async fn tags_of_type(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Tag>>, ApiError> {
    Ok(Json(state.services.tags.list_by_type(id).await?))
}
