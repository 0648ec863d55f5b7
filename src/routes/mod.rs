pub mod analytics;
pub mod auth;
pub mod companies;
mod error;
pub mod experiences;
mod extract;
pub mod health;
mod list;
pub mod mentorships;
pub mod notifications;
pub mod opportunities;
pub mod tags;

use axum::{
    Router,
    routing::{get, post},
};
pub use error::ApiError;
pub use extract::ValidJson;
pub use list::{ListQuery, paginate, parse_tag_ids};

use crate::{AppState, middleware::session_auth_middleware};

/// Routes reachable without a session: sign-in and token refresh.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/google-oauth", post(auth::google_oauth))
        .route("/auth/refresh", post(auth::refresh))
}

/// Everything that requires a bearer access token.
pub fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(account_routes())
        .merge(experience_routes())
        .merge(opportunity_routes())
        .merge(taxonomy_routes())
        .merge(mentorship_routes())
        .merge(notification_routes())
        .route("/analytics/dashboard", get(analytics::dashboard))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            session_auth_middleware,
        ))
}

fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(auth::me))
        .route("/auth/backup-email", post(auth::set_backup_email))
        .route("/auth/set-pr", post(auth::set_pr))
        .route("/auth/set-spoc", post(auth::set_spoc))
}

fn experience_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/experiences",
            get(experiences::list).post(experiences::create),
        )
        .route("/experiences/unverified", get(experiences::unverified))
        .route("/experiences/self", get(experiences::own))
        .route("/experiences/saved", get(experiences::saved))
        .route("/experiences/analytics", get(experiences::analytics))
        .route(
            "/experiences/{id}",
            get(experiences::get)
                .patch(experiences::update)
                .delete(experiences::delete),
        )
        .route(
            "/experiences/{id}/save_unsave",
            post(experiences::save_unsave),
        )
        .route("/experiences/{id}/verify", post(experiences::verify))
}

fn opportunity_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/opportunities",
            get(opportunities::list).post(opportunities::create),
        )
        .route("/opportunities/saved", get(opportunities::saved))
        .route("/opportunities/unverified", get(opportunities::unverified))
        .route("/opportunities/analytics", get(opportunities::analytics))
        .route(
            "/opportunities/{id}",
            get(opportunities::get)
                .patch(opportunities::update)
                .delete(opportunities::delete),
        )
        .route("/opportunities/{id}/verify", post(opportunities::verify))
        .route("/opportunities/{id}/save", post(opportunities::save))
        .route("/opportunities/{id}/unsave", post(opportunities::unsave))
        .route(
            "/opportunities/{id}/save_unsave",
            post(opportunities::save_unsave),
        )
}

/// Companies, tags and tag types.
fn taxonomy_routes() -> Router<AppState> {
    Router::new()
        .route("/companies", get(companies::list).post(companies::create))
        .route("/companies/analytics", get(companies::analytics))
        .route(
            "/companies/{id}",
            get(companies::get)
                .patch(companies::update)
                .delete(companies::delete),
        )
        .route("/companies/{id}/experiences", get(companies::experiences))
        .route("/tags", get(tags::list).post(tags::create))
        .route(
            "/tags/{id}",
            get(tags::get).patch(tags::update).delete(tags::delete),
        )
        .route("/tag-types", get(tags::list_types).post(tags::create_type))
        .route(
            "/tag-types/{id}",
            get(tags::get_type)
                .patch(tags::update_type)
                .delete(tags::delete_type),
        )
        .route("/tag-types/{id}/tags", get(tags::tags_of_type))
}

fn mentorship_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/mentorships",
            get(mentorships::list).post(mentorships::create),
        )
        .route(
            "/mentorships/available_mentors",
            get(mentorships::available_mentors),
        )
        .route(
            "/mentorships/{id}",
            get(mentorships::get)
                .patch(mentorships::update)
                .delete(mentorships::delete),
        )
}

fn notification_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/notifications",
            get(notifications::list).post(notifications::create),
        )
        .route(
            "/notifications/mark_all_read",
            post(notifications::mark_all_read),
        )
        .route(
            "/notifications/{id}",
            get(notifications::get).delete(notifications::delete),
        )
        .route(
            "/notifications/{id}/mark_read",
            post(notifications::mark_read),
        )
}
