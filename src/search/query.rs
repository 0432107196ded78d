use chrono::{DateTime, Utc};
use rusqlite::types::Value;

use super::params::{SearchQuery, SearchType, SortMode};
use crate::store::format_datetime;

/// A SQL statement with positional `?` parameters in textual order.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Columns produced by every composed thread search, in order:
/// the thread columns followed by `reply_count` and `last_reply_at`.
pub const THREAD_SEARCH_COLUMNS: &str = "t.id, t.title, t.content, t.section, t.tags, t.views, \
     t.user_id, t.created_at, t.updated_at, t.deleted_at, \
     COUNT(r.id) AS reply_count, MAX(r.created_at) AS last_reply_at";

/// Builds a substring LIKE pattern with LIKE wildcards escaped.
///
/// The text is lowercased the same way the store's `quad_fold` SQL function folds columns.
pub fn like_pattern(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 2);
    escaped.push('%');
    for c in text.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Accumulates WHERE / HAVING / ORDER BY fragments alongside their parameters.
#[derive(Default)]
struct Clauses {
    joins: Vec<&'static str>,
    conditions: Vec<(String, Vec<Value>)>,
    having: Vec<&'static str>,
    order: Vec<(String, Vec<Value>)>,
}

impl Clauses {
    fn filter(&mut self, sql: impl Into<String>, params: Vec<Value>) {
        self.conditions.push((sql.into(), params));
    }

    fn substring(&mut self, column: &str, needle: &str) {
        self.filter(
            format!("quad_fold({column}) LIKE ? ESCAPE '\\'"),
            vec![Value::Text(like_pattern(needle))],
        );
    }

    fn order_by(&mut self, sql: impl Into<String>, params: Vec<Value>) {
        self.order.push((sql.into(), params));
    }
}

/// Translates a validated search into a single grouped query over threads,
/// their non-deleted replies and (for user searches) their authors.
///
/// `limit` of `None` returns every match.
pub fn build_thread_search(
    query: &SearchQuery,
    now: DateTime<Utc>,
    limit: Option<usize>,
) -> ComposedQuery {
    let mut clauses = Clauses::default();
    let pattern = || Value::Text(like_pattern(&query.query));

    clauses.filter("t.deleted_at IS NULL", Vec::new());

    match query.search_type {
        SearchType::Title => clauses.substring("t.title", &query.query),
        SearchType::Content => clauses.filter(
            "(quad_fold(t.content) LIKE ? ESCAPE '\\' OR EXISTS (\
                SELECT 1 FROM replies rc \
                WHERE rc.thread_id = t.id AND rc.deleted_at IS NULL \
                AND quad_fold(rc.content) LIKE ? ESCAPE '\\'))",
            vec![pattern(), pattern()],
        ),
        SearchType::User => {
            clauses.joins.push("JOIN users u ON u.id = t.user_id");
            clauses.filter(
                "(quad_fold(u.name) LIKE ? ESCAPE '\\' OR quad_fold(u.email) LIKE ? ESCAPE '\\')",
                vec![pattern(), pattern()],
            );
        }
        SearchType::Tags => clauses.substring("t.tags", &query.query),
    }

    if let Some(section) = query.effective_section() {
        clauses.filter("t.section = ?", vec![Value::Text(section.to_string())]);
    }

    if let Some(since) = query.date_range.since(now) {
        clauses.filter("t.created_at > ?", vec![Value::Text(format_datetime(&since))]);
    }

    for tag in &query.tags {
        clauses.substring("t.tags", tag);
    }

    if query.has_replies {
        clauses.having.push("COUNT(r.id) > 0");
    }

    match query.sort {
        SortMode::Recent => {}
        SortMode::Replies => clauses.order_by("reply_count DESC", Vec::new()),
        SortMode::Relevant => clauses.order_by(
            "CASE WHEN quad_fold(t.title) LIKE ? ESCAPE '\\' THEN 1 ELSE 2 END",
            vec![pattern()],
        ),
        SortMode::Views => clauses.order_by("t.views DESC", Vec::new()),
    }
    clauses.order_by("t.created_at DESC", Vec::new());
    clauses.order_by("t.id", Vec::new());

    assemble(clauses, limit)
}

fn assemble(clauses: Clauses, limit: Option<usize>) -> ComposedQuery {
    let mut sql = format!(
        "SELECT {THREAD_SEARCH_COLUMNS} FROM threads t \
         LEFT JOIN replies r ON r.thread_id = t.id AND r.deleted_at IS NULL"
    );
    let mut params = Vec::new();

    for join in clauses.joins {
        sql.push(' ');
        sql.push_str(join);
    }

    if !clauses.conditions.is_empty() {
        let mut parts = Vec::with_capacity(clauses.conditions.len());
        for (fragment, values) in clauses.conditions {
            parts.push(fragment);
            params.extend(values);
        }
        sql.push_str(" WHERE ");
        sql.push_str(&parts.join(" AND "));
    }

    sql.push_str(" GROUP BY t.id");

    if !clauses.having.is_empty() {
        sql.push_str(" HAVING ");
        sql.push_str(&clauses.having.join(" AND "));
    }

    let mut parts = Vec::with_capacity(clauses.order.len());
    for (fragment, values) in clauses.order {
        parts.push(fragment);
        params.extend(values);
    }
    sql.push_str(" ORDER BY ");
    sql.push_str(&parts.join(", "));

    if let Some(limit) = limit {
        sql.push_str(" LIMIT ?");
        params.push(Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
    }

    ComposedQuery { sql, params }
}
