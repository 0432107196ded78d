use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use super::{load_authors, with_authors};
use crate::auth::{Caller, RequireCapability, cap};
use crate::server::AppState;
use crate::server::dto::CreateReplyRequest;
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::server::validation::validate_content;
use crate::types::{Capability, Reply};

pub async fn list_replies(
    _caller: Caller,
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let thread = store
        .get_thread(&thread_id)
        .api_err("Failed to get thread")?
        .or_not_found("Thread not found")?;

    let replies = store
        .list_thread_replies(std::slice::from_ref(&thread.id))
        .api_err("Failed to list replies")?;
    let authors = load_authors(store, replies.iter().map(|r| r.user_id.as_str()))?;

    Ok::<_, ApiError>(Json(ApiResponse::success(with_authors(replies, &authors))))
}

pub async fn create_reply(
    auth: RequireCapability<cap::Reply>,
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
    Json(req): Json<CreateReplyRequest>,
) -> impl IntoResponse {
    validate_content(&req.content)?;

    let store = state.store.as_ref();

    let thread = store
        .get_thread(&thread_id)
        .api_err("Failed to get thread")?
        .or_not_found("Thread not found")?;

    let now = Utc::now();
    let reply = Reply {
        id: Uuid::new_v4().to_string(),
        content: req.content,
        thread_id: thread.id,
        user_id: auth.caller.user.id,
        created_at: now,
        updated_at: now,
        deleted_at: None,
    };

    store.create_reply(&reply).api_err("Failed to create reply")?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(reply))))
}

pub async fn delete_reply(
    caller: Caller,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let reply = store
        .get_reply(&id)
        .api_err("Failed to get reply")?
        .or_not_found("Reply not found")?;

    if !caller.owns_or_can(&reply.user_id, Capability::DeleteThreads) {
        return Err(ApiError::forbidden("Cannot delete another user's reply"));
    }

    store
        .soft_delete_reply(&reply.id, Utc::now())
        .api_err("Failed to delete reply")?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
