//! Multi-criteria thread search.
//!
//! A [`SearchQuery`] is validated at the boundary, composed into one grouped
//! SQL statement by [`query::build_thread_search`], and executed by the store.
//! Matching is literal, case-insensitive substring matching; there is no
//! relevance scoring beyond the binary "title matches" ordering of
//! [`SortMode::Relevant`].

mod params;
pub mod query;
mod snippet;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

pub use params::{DateRange, SearchQuery, SearchType, SortMode};
pub use query::{ComposedQuery, build_thread_search};
pub use snippet::{snippet, thread_matches};

use crate::error::Result;
use crate::store::Store;
use crate::types::{Author, ReplyWithAuthor, Thread};

/// A thread row produced by a composed search, before relations are loaded.
#[derive(Debug, Clone)]
pub struct ThreadMatch {
    pub thread: Thread,
    pub reply_count: i64,
    pub last_reply_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    #[serde(flatten)]
    pub thread: Thread,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
    pub replies: Vec<ReplyWithAuthor>,
    pub reply_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reply_at: Option<DateTime<Utc>>,
    pub matches: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResultSet {
    pub results: Vec<SearchResult>,
    pub total: usize,
    pub has_more: bool,
}

/// Runs a search and populates each thread's author and replies.
///
/// At most `limit` threads are returned; `has_more` reports whether the
/// match set was larger.
pub fn search(
    store: &dyn Store,
    query: &SearchQuery,
    limit: usize,
    now: DateTime<Utc>,
) -> Result<SearchResultSet> {
    let composed = build_thread_search(query, now, Some(limit.saturating_add(1)));
    tracing::debug!(sql = %composed.sql, params = composed.params.len(), "thread search");

    let mut matches = store.search_threads(&composed)?;
    let has_more = matches.len() > limit;
    if has_more {
        matches.truncate(limit);
        tracing::warn!(limit, query = %query.query, "search results truncated");
    }

    let thread_ids: Vec<String> = matches.iter().map(|m| m.thread.id.clone()).collect();
    let replies = store.list_thread_replies(&thread_ids)?;

    let mut user_ids: Vec<String> = matches
        .iter()
        .map(|m| m.thread.user_id.clone())
        .chain(replies.iter().map(|r| r.user_id.clone()))
        .collect();
    user_ids.sort();
    user_ids.dedup();
    let authors: HashMap<String, Author> = store
        .get_users(&user_ids)?
        .iter()
        .map(|u| (u.id.clone(), Author::from(u)))
        .collect();

    let mut replies_by_thread: HashMap<String, Vec<ReplyWithAuthor>> = HashMap::new();
    for reply in replies {
        let author = authors.get(&reply.user_id).cloned();
        replies_by_thread
            .entry(reply.thread_id.clone())
            .or_default()
            .push(ReplyWithAuthor { reply, author });
    }

    let results: Vec<SearchResult> = matches
        .into_iter()
        .map(|m| SearchResult {
            author: authors.get(&m.thread.user_id).cloned(),
            replies: replies_by_thread.remove(&m.thread.id).unwrap_or_default(),
            matches: thread_matches(&m.thread.title, &m.thread.content, &query.query),
            reply_count: m.reply_count,
            last_reply_at: m.last_reply_at,
            thread: m.thread,
        })
        .collect();

    Ok(SearchResultSet {
        total: results.len(),
        results,
        has_more,
    })
}
