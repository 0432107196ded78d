//! Combinators over dated records drawn from several sources.
//!
//! Threads and replies live in different tables but most activity questions
//! ("when was this user last active", "how busy were they each month", "what
//! did they do most recently") treat them as one stream. These helpers answer
//! those questions for any number of sources without caring what the records
//! are.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

/// Anything with a creation time.
pub trait Dated {
    fn timestamp(&self) -> DateTime<Utc>;
}

impl Dated for DateTime<Utc> {
    fn timestamp(&self) -> DateTime<Utc> {
        *self
    }
}

impl Dated for crate::types::ActivityEvent {
    fn timestamp(&self) -> DateTime<Utc> {
        self.created_at()
    }
}

/// The most recent timestamp across all sources.
pub fn latest<T: Dated>(sources: &[&[T]]) -> Option<DateTime<Utc>> {
    sources
        .iter()
        .flat_map(|source| source.iter())
        .map(Dated::timestamp)
        .max()
}

/// Counts records from all sources per bucket key.
pub fn bucket_counts<T, F>(sources: &[&[T]], key: F) -> BTreeMap<String, i64>
where
    T: Dated,
    F: Fn(DateTime<Utc>) -> String,
{
    let mut counts = BTreeMap::new();
    for record in sources.iter().flat_map(|source| source.iter()) {
        *counts.entry(key(record.timestamp())).or_insert(0) += 1;
    }
    counts
}

/// Merges sources into one newest-first sequence.
///
/// Records with equal timestamps keep source order (earlier sources first)
/// and, within a source, their original order.
pub fn merge_newest_first<T: Dated>(sources: Vec<Vec<T>>) -> Vec<T> {
    let mut merged: Vec<T> = sources.into_iter().flatten().collect();
    merged.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));
    merged
}

pub fn month_key(at: DateTime<Utc>) -> String {
    at.format("%Y-%m").to_string()
}

/// `Mon-15` style weekday / hour key.
pub fn weekday_hour_key(at: DateTime<Utc>) -> String {
    at.format("%a-%H").to_string()
}
