use super::timeline::merge_newest_first;
use crate::error::Result;
use crate::store::Store;
use crate::types::{ActivityEvent, PaginatedActivity};

/// Returns one page of a user's threads and replies as a single newest-first feed.
///
/// Pages are cut from the globally ordered sequence, so a page may hold any mix
/// of threads and replies. Expects `page >= 1` and `page_size >= 1`; the HTTP
/// layer clamps caller input before getting here.
pub fn user_activity(
    store: &dyn Store,
    user_id: &str,
    page: u32,
    page_size: u32,
) -> Result<PaginatedActivity> {
    let total = store.count_user_threads(user_id)? + store.count_user_replies(user_id)?;

    let offset = u64::from(page.saturating_sub(1)) * u64::from(page_size);
    // The first `offset + page_size` events overall can only come from the
    // first `offset + page_size` events of each kind.
    let window = i64::try_from(offset + u64::from(page_size)).unwrap_or(i64::MAX);
    tracing::debug!(user_id, page, page_size, window, "fetching activity window");

    let threads: Vec<ActivityEvent> = store
        .recent_user_threads(user_id, window)?
        .into_iter()
        .map(ActivityEvent::from)
        .collect();
    let replies: Vec<ActivityEvent> = store
        .recent_user_replies(user_id, window)?
        .into_iter()
        .map(ActivityEvent::from)
        .collect();

    let activities = merge_newest_first(vec![threads, replies])
        .into_iter()
        .skip(usize::try_from(offset).unwrap_or(usize::MAX))
        .take(page_size as usize)
        .collect();

    Ok(PaginatedActivity {
        activities,
        total,
        page,
        page_size,
    })
}
