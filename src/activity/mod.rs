//! Per-user activity: summary statistics and the merged, paginated feed.

mod feed;
mod stats;
pub mod timeline;

pub use feed::user_activity;
pub use stats::{engagement_metrics, user_stats};
