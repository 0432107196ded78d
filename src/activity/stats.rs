use chrono::{DateTime, Utc};

use super::timeline::{bucket_counts, latest, month_key, weekday_hour_key};
use crate::error::Result;
use crate::store::Store;
use crate::types::{
    ActivityMap, EngagementMetrics, RecentActivity, ReplyTiming, UserActivityStats,
};

const TOP_SECTIONS: i64 = 5;
const RECENT_ITEMS: i64 = 5;

/// Computes a user's activity summary.
///
/// `include_private` adds engagement metrics and the monthly activity map;
/// the public view leaves both unset. A user without records gets zeroed
/// stats, not an error. Any store failure aborts the whole computation.
pub fn user_stats(
    store: &dyn Store,
    user_id: &str,
    include_private: bool,
) -> Result<UserActivityStats> {
    let total_threads = store.count_user_threads(user_id)?;
    let total_replies = store.count_user_replies(user_id)?;
    let top_sections = store.top_user_sections(user_id, TOP_SECTIONS)?;

    let recent_activity = RecentActivity {
        threads: store.recent_user_threads(user_id, RECENT_ITEMS)?,
        replies: store.recent_user_replies(user_id, RECENT_ITEMS)?,
    };

    let mut stats = UserActivityStats {
        total_threads,
        total_replies,
        top_sections,
        recent_activity,
        activity_map: None,
        metrics: None,
    };

    if include_private {
        let thread_times = store.user_thread_timestamps(user_id)?;
        let reply_times = store.user_reply_timestamps(user_id)?;
        let timings = store.user_reply_timings(user_id)?;

        let sources = [thread_times.as_slice(), reply_times.as_slice()];
        stats.metrics = Some(engagement_metrics(&timings, latest(&sources)));
        stats.activity_map = Some(ActivityMap(bucket_counts(&sources, month_key)));
    }

    Ok(stats)
}

/// Response-time and heatmap figures over a user's replies.
pub fn engagement_metrics(
    timings: &[ReplyTiming],
    last_active: Option<DateTime<Utc>>,
) -> EngagementMetrics {
    let avg_response_time = if timings.is_empty() {
        0.0
    } else {
        let total_hours: f64 = timings.iter().map(response_hours).sum();
        total_hours / timings.len() as f64
    };

    let reply_times: Vec<DateTime<Utc>> = timings.iter().map(|t| t.reply_at).collect();

    EngagementMetrics {
        avg_response_time,
        activity_heatmap: bucket_counts(&[reply_times.as_slice()], weekday_hour_key),
        last_active: last_active.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
    }
}

fn response_hours(timing: &ReplyTiming) -> f64 {
    (timing.reply_at - timing.thread_at).num_milliseconds() as f64 / 3_600_000.0
}
