use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use chrono::Utc;

use crate::auth::Caller;
use crate::search::{self, SearchQuery};
use crate::server::AppState;
use crate::server::response::{ApiError, ApiResponse};

/// `GET /search`. Pairs are taken raw so `tags[]` may repeat.
pub async fn search_threads(
    _caller: Caller,
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> impl IntoResponse {
    let query = SearchQuery::from_pairs(pairs)?;

    let results = search::search(
        state.store.as_ref(),
        &query,
        state.search_result_limit,
        Utc::now(),
    )?;

    Ok::<_, ApiError>(Json(ApiResponse::success(results)))
}
