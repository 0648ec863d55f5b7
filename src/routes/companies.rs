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
    models::{Company, CompanyAnalytics, CreateCompany, Experience, UpdateCompany},
};

#[tracing::instrument(name = "companies.list", skip(state, query))]
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse<Company>>, ApiError> {
    let params = query.try_into_params()?;
    let page = state.services.companies.list(params.clone()).await?;
    Ok(Json(paginate(page, &params)))
}

#[tracing::instrument(name = "companies.create", skip(state, actor, input), fields(actor_id = %actor.id))]
pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ValidJson(input): ValidJson<CreateCompany>,
) -> Result<(StatusCode, Json<Company>), ApiError> {
    let company = state.services.companies.create(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(company)))
}

#[tracing::instrument(name = "companies.analytics", skip(state, actor), fields(actor_id = %actor.id))]
pub async fn analytics(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<CompanyAnalytics>, ApiError> {
    Ok(Json(state.services.companies.analytics(&actor).await?))
}

#[tracing::instrument(name = "companies.get", skip(state), fields(%id))]
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Company>, ApiError> {
    Ok(Json(state.services.companies.get(id).await?))
}

/// Renaming re-derives the slug.
#[tracing::instrument(name = "companies.update", skip(state, actor, input), fields(actor_id = %actor.id, %id))]
pub async fn update(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    ValidJson(input): ValidJson<UpdateCompany>,
) -> Result<Json<Company>, ApiError> {
    Ok(Json(
        state.services.companies.update(&actor, id, input).await?,
    ))
}

#[tracing::instrument(name = "companies.delete", skip(state, actor), fields(actor_id = %actor.id, %id))]
pub async fn delete(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.services.companies.delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Experiences about one company that the caller can see.
#[tracing::instrument(name = "companies.experiences", skip(state, actor, query), fields(actor_id = %actor.id, %id))]
pub async fn experiences(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse<Experience>>, ApiError> {
    let params = query.try_into_params()?;
    let page = state
        .services
        .experiences
        .list_for_company(&actor, id, params.clone())
        .await?;
    Ok(Json(paginate(page, &params)))
}
