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
    models::{CreateNotification, MarkAllReadResponse, Notification},
};

/// The caller's own notifications, newest first.
#[tracing::instrument(name = "notifications.list", skip(state, actor, query), fields(actor_id = %actor.id))]
pub async fn list(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse<Notification>>, ApiError> {
    let params = query.try_into_params()?;
    let page = state
        .services
        .notifications
        .list(&actor, params.clone())
        .await?;
    Ok(Json(paginate(page, &params)))
}

#[tracing::instrument(name = "notifications.create", skip(state, actor, input), fields(actor_id = %actor.id))]
pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ValidJson(input): ValidJson<CreateNotification>,
) -> Result<(StatusCode, Json<Notification>), ApiError> {
    let notification = state.services.notifications.create(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(notification)))
}

#[tracing::instrument(name = "notifications.get", skip(state, actor), fields(actor_id = %actor.id, %id))]
pub async fn get(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<Notification>, ApiError> {
    Ok(Json(state.services.notifications.get(&actor, id).await?))
}

#[tracing::instrument(name = "notifications.delete", skip(state, actor), fields(actor_id = %actor.id, %id))]
pub async fn delete(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.services.notifications.delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(name = "notifications.mark_read", skip(state, actor), fields(actor_id = %actor.id, %id))]
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<Notification>, ApiError> {
    Ok(Json(
        state.services.notifications.mark_read(&actor, id).await?,
    ))
}

#[tracing::instrument(name = "notifications.mark_all_read", skip(state, actor), fields(actor_id = %actor.id))]
pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<MarkAllReadResponse>, ApiError> {
    let updated = state.services.notifications.mark_all_read(&actor).await?;
    Ok(Json(MarkAllReadResponse { updated }))
}
