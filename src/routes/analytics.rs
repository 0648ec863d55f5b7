use axum::{Extension, Json, extract::State};

use super::ApiError;
use crate::{AppState, authz::Actor, models::DashboardAnalytics};

/// Portal-wide aggregates for moderators.
#[tracing::instrument(name = "analytics.dashboard", skip(state, actor), fields(actor_id = %actor.id))]
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<DashboardAnalytics>, ApiError> {
    Ok(Json(state.services.analytics.dashboard(&actor).await?))
}
