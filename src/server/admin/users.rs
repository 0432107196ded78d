use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use chrono::Utc;

use crate::auth::{RequireCapability, cap};
use crate::server::AppState;
use crate::server::dto::{PageParams, UpdateUserRoleRequest, UserListResponse};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::server::validation::clamp_page;

pub async fn list_users(
    _auth: RequireCapability<cap::ManageUsers>,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let (page, page_size) = clamp_page(params.page, params.page_size);
    let offset = i64::from(page - 1) * i64::from(page_size);

    let users = store
        .list_users(offset, i64::from(page_size))
        .api_err("Failed to list users")?;
    let total = store.count_users().api_err("Failed to count users")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(UserListResponse {
        users,
        total,
        page,
        page_size,
    })))
}

pub async fn set_user_role(
    auth: RequireCapability<cap::ManageRoles>,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateUserRoleRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let mut user = store
        .get_user(&id)
        .api_err("Failed to get user")?
        .or_not_found("User not found")?;
    let role = store
        .get_role(&req.role_id)
        .api_err("Failed to get role")?
        .ok_or_else(|| ApiError::bad_request("Unknown role"))?;

    user.role_id = role.id;
    user.updated_at = Utc::now();
    store.update_user(&user)?;

    tracing::info!(
        user_id = %user.id,
        role = %role.name,
        by = %auth.caller.user.id,
        "role assigned"
    );

    Ok::<_, ApiError>(Json(ApiResponse::success(user)))
}
