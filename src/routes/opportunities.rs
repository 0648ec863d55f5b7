use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use super::{ApiError, ListQuery, ValidJson, paginate, parse_tag_ids};
use crate::{
    AppState,
    api_types::ListResponse,
    authz::Actor,
    models::{
        CreateOpportunity, Opportunity, OpportunityAnalytics, OpportunityQuery,
        SaveToggleResponse, UpdateOpportunity,
    },
    services::OpportunitySearch,
};

/// List opportunities visible to the caller, newest first.
#[tracing::instrument(name = "opportunities.list", skip(state, actor, query, filter), fields(actor_id = %actor.id))]
pub async fn list(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ListQuery>,
    Query(filter): Query<OpportunityQuery>,
) -> Result<Json<ListResponse<Opportunity>>, ApiError> {
    let params = query.try_into_params()?;
    let search = OpportunitySearch {
        tag_ids: parse_tag_ids(filter.tag_ids.as_deref())?,
        opportunity_type: filter.opportunity_type,
        company_slug: filter.company,
        search: filter.search,
    };
    let page = state
        .services
        .opportunities
        .list(&actor, search, params.clone())
        .await?;
    Ok(Json(paginate(page, &params)))
}

#[tracing::instrument(name = "opportunities.create", skip(state, actor, input), fields(actor_id = %actor.id))]
pub async fn create(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    ValidJson(input): ValidJson<CreateOpportunity>,
) -> Result<(StatusCode, Json<Opportunity>), ApiError> {
    let opportunity = state.services.opportunities.create(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(opportunity)))
}

#[tracing::instrument(name = "opportunities.saved", skip(state, actor, query), fields(actor_id = %actor.id))]
pub async fn saved(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse<Opportunity>>, ApiError> {
    let params = query.try_into_params()?;
    let page = state
        .services
        .opportunities
        .list_saved(&actor, params.clone())
        .await?;
    Ok(Json(paginate(page, &params)))
}

#[tracing::instrument(name = "opportunities.unverified", skip(state, actor, query), fields(actor_id = %actor.id))]
pub async fn unverified(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse<Opportunity>>, ApiError> {
    let params = query.try_into_params()?;
    let page = state
        .services
        .opportunities
        .list_unverified(&actor, params.clone())
        .await?;
    Ok(Json(paginate(page, &params)))
}

#[tracing::instrument(name = "opportunities.analytics", skip(state, actor), fields(actor_id = %actor.id))]
pub async fn analytics(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<OpportunityAnalytics>, ApiError> {
    Ok(Json(state.services.opportunities.analytics(&actor).await?))
}

#[tracing::instrument(name = "opportunities.get", skip(state, actor), fields(actor_id = %actor.id, %id))]
pub async fn get(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<Opportunity>, ApiError> {
    Ok(Json(state.services.opportunities.get(&actor, id).await?))
}

#[tracing::instrument(name = "opportunities.update", skip(state, actor, patch), fields(actor_id = %actor.id, %id))]
pub async fn update(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    ValidJson(patch): ValidJson<UpdateOpportunity>,
) -> Result<Json<Opportunity>, ApiError> {
    Ok(Json(
        state.services.opportunities.update(&actor, id, patch).await?,
    ))
}

#[tracing::instrument(name = "opportunities.delete", skip(state, actor), fields(actor_id = %actor.id, %id))]
pub async fn delete(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.services.opportunities.delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(name = "opportunities.verify", skip(state, actor), fields(actor_id = %actor.id, %id))]
pub async fn verify(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<Opportunity>, ApiError> {
    Ok(Json(state.services.opportunities.verify(&actor, id).await?))
}

/// Idempotent save.
#[tracing::instrument(name = "opportunities.save", skip(state, actor), fields(actor_id = %actor.id, %id))]
pub async fn save(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.services.opportunities.save(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(name = "opportunities.unsave", skip(state, actor), fields(actor_id = %actor.id, %id))]
pub async fn unsave(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.services.opportunities.unsave(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(name = "opportunities.save_unsave", skip(state, actor), fields(actor_id = %actor.id, %id))]
pub async fn save_unsave(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<SaveToggleResponse>, ApiError> {
    let status = state.services.opportunities.toggle_save(&actor, id).await?;
    Ok(Json(SaveToggleResponse { status }))
}
