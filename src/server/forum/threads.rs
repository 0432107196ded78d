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
use crate::server::dto::CreateThreadRequest;
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::server::validation::{
    normalize_tags, validate_content, validate_section, validate_thread_title,
};
use crate::types::{Capability, Thread, ThreadWithReplies};

pub async fn list_section_threads(
    _caller: Caller,
    State(state): State<Arc<AppState>>,
    Path(section): Path<String>,
) -> impl IntoResponse {
    let threads = state
        .store
        .list_section_threads(&section)
        .api_err("Failed to list threads")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(threads)))
}

pub async fn create_thread(
    auth: RequireCapability<cap::CreateThreads>,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateThreadRequest>,
) -> impl IntoResponse {
    validate_thread_title(&req.title)?;
    validate_content(&req.content)?;
    validate_section(&req.section)?;

    let now = Utc::now();
    let thread = Thread {
        id: Uuid::new_v4().to_string(),
        title: req.title.trim().to_string(),
        content: req.content,
        section: req.section,
        tags: normalize_tags(&req.tags),
        views: 0,
        user_id: auth.caller.user.id,
        created_at: now,
        updated_at: now,
        deleted_at: None,
    };

    state
        .store
        .create_thread(&thread)
        .api_err("Failed to create thread")?;

    tracing::info!(thread_id = %thread.id, section = %thread.section, "thread created");

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(thread))))
}

/// Returns the thread with its replies and counts the view.
pub async fn get_thread(
    _caller: Caller,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let mut thread = store
        .get_thread(&id)
        .api_err("Failed to get thread")?
        .or_not_found("Thread not found")?;

    store
        .increment_thread_views(&thread.id)
        .api_err("Failed to record view")?;
    thread.views += 1;

    let replies = store
        .list_thread_replies(std::slice::from_ref(&thread.id))
        .api_err("Failed to list replies")?;

    let user_ids = std::iter::once(thread.user_id.as_str())
        .chain(replies.iter().map(|r| r.user_id.as_str()));
    let authors = load_authors(store, user_ids)?;

    let view = ThreadWithReplies {
        author: authors.get(&thread.user_id).cloned(),
        replies: with_authors(replies, &authors),
        thread,
    };

    Ok::<_, ApiError>(Json(ApiResponse::success(view)))
}

pub async fn delete_thread(
    caller: Caller,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let thread = store
        .get_thread(&id)
        .api_err("Failed to get thread")?
        .or_not_found("Thread not found")?;

    if !caller.owns_or_can(&thread.user_id, Capability::DeleteThreads) {
        return Err(ApiError::forbidden("Cannot delete another user's thread"));
    }

    store
        .soft_delete_thread(&thread.id, Utc::now())
        .api_err("Failed to delete thread")?;

    tracing::info!(thread_id = %thread.id, by = %caller.user.id, "thread deleted");

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
