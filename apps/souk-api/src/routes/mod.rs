//! HTTP routes.

mod admin;
mod health;
mod users;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/admin/sync", post(admin::trigger_sync))
        .route("/users", post(users::create_user).get(users::list_users))
        .route(
            "/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/users/by-username/:username", get(users::get_user_by_username))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
