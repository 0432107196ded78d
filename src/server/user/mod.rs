mod profile;
mod roles;

use std::sync::Arc;

use axum::{Router, routing::get};

use crate::server::AppState;

pub fn user_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/me", get(profile::get_me).patch(profile::update_me))
        .route("/me/stats", get(profile::get_my_stats))
        .route("/users/{id}", get(profile::get_user))
        .route("/users/{id}/activity", get(profile::get_user_activity))
        .route("/roles", get(roles::list_roles))
}
