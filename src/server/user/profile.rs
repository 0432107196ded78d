use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use chrono::Utc;

use crate::activity;
use crate::auth::Caller;
use crate::server::AppState;
use crate::server::dto::{PageParams, ProfileResponse, UpdateProfileRequest};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::server::validation::{clamp_page, validate_bio};

pub async fn get_me(caller: Caller, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let stats = activity::user_stats(state.store.as_ref(), &caller.user.id, true)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(ProfileResponse {
        role: (&caller.role).into(),
        user: caller.user,
        stats,
    })))
}

pub async fn update_me(
    caller: Caller,
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateProfileRequest>,
) -> impl IntoResponse {
    if req.bio.is_none() && req.avatar_url.is_none() {
        return Err(ApiError::bad_request("Nothing to update"));
    }

    let mut user = caller.user;

    if let Some(bio) = req.bio {
        validate_bio(&bio)?;
        user.bio = Some(bio).filter(|b| !b.trim().is_empty());
    }
    if let Some(avatar_url) = req.avatar_url {
        user.avatar_url = Some(avatar_url.trim().to_string()).filter(|u| !u.is_empty());
    }
    user.updated_at = Utc::now();

    state.store.update_user(&user)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(user)))
}

pub async fn get_my_stats(caller: Caller, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let stats = activity::user_stats(state.store.as_ref(), &caller.user.id, true)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(stats)))
}

/// Public profile. Private stats are included for the user themself and for
/// callers that manage users.
pub async fn get_user(
    caller: Caller,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let user = store
        .get_user(&id)
        .api_err("Failed to get user")?
        .or_not_found("User not found")?;
    let role = store
        .get_role(&user.role_id)
        .api_err("Failed to get role")?
        .or_not_found("Role not found")?;

    let stats = activity::user_stats(store, &user.id, caller.can_view_private(&user.id))?;

    Ok::<_, ApiError>(Json(ApiResponse::success(ProfileResponse {
        role: (&role).into(),
        user,
        stats,
    })))
}

pub async fn get_user_activity(
    _caller: Caller,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<PageParams>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let user = store
        .get_user(&id)
        .api_err("Failed to get user")?
        .or_not_found("User not found")?;

    let (page, page_size) = clamp_page(params.page, params.page_size);
    let feed = activity::user_activity(store, &user.id, page, page_size)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(feed)))
}
