use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};

use crate::auth::Caller;
use crate::server::AppState;
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};

pub async fn list_roles(_caller: Caller, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let roles = state.store.list_roles().api_err("Failed to list roles")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(roles)))
}
