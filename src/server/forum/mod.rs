mod replies;
mod search;
mod threads;

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::server::AppState;
use crate::server::response::{ApiError, StoreResultExt};
use crate::store::Store;
use crate::types::{Author, Reply, ReplyWithAuthor};

pub fn forum_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/search", get(search::search_threads))
        .route(
            "/sections/{section}/threads",
            get(threads::list_section_threads),
        )
        .route("/threads", post(threads::create_thread))
        .route("/threads/{id}", get(threads::get_thread))
        .route("/threads/{id}", delete(threads::delete_thread))
        .route("/threads/{id}/replies", get(replies::list_replies))
        .route("/threads/{id}/replies", post(replies::create_reply))
        .route("/replies/{id}", delete(replies::delete_reply))
}

fn load_authors<'a, I>(
    store: &dyn Store,
    user_ids: I,
) -> Result<HashMap<String, Author>, ApiError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut ids: Vec<String> = user_ids.into_iter().map(str::to_string).collect();
    ids.sort();
    ids.dedup();
    let users = store.get_users(&ids).api_err("Failed to load authors")?;
    Ok(users.iter().map(|u| (u.id.clone(), Author::from(u))).collect())
}

fn with_authors(replies: Vec<Reply>, authors: &HashMap<String, Author>) -> Vec<ReplyWithAuthor> {
    replies
        .into_iter()
        .map(|reply| ReplyWithAuthor {
            author: authors.get(&reply.user_id).cloned(),
            reply,
        })
        .collect()
}
