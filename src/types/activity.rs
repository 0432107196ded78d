use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreadInfo {
    pub id: String,
    pub title: String,
    pub section: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplyInfo {
    pub id: String,
    pub content: String,
    pub thread_id: String,
    /// None when the parent thread has been deleted.
    pub thread_title: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionCount {
    pub section: String,
    pub count: i64,
}

/// A reply's timestamp next to its parent thread's timestamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplyTiming {
    pub reply_at: DateTime<Utc>,
    pub thread_at: DateTime<Utc>,
}

/// One entry of a user's merged activity feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ActivityEvent {
    Thread {
        id: String,
        title: String,
        section: String,
        created_at: DateTime<Utc>,
    },
    Reply {
        id: String,
        content: String,
        thread_id: String,
        thread_title: Option<String>,
        created_at: DateTime<Utc>,
    },
}

impl ActivityEvent {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            ActivityEvent::Thread { id, .. } | ActivityEvent::Reply { id, .. } => id,
        }
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            ActivityEvent::Thread { created_at, .. } | ActivityEvent::Reply { created_at, .. } => {
                *created_at
            }
        }
    }
}

impl From<ThreadInfo> for ActivityEvent {
    fn from(t: ThreadInfo) -> Self {
        ActivityEvent::Thread {
            id: t.id,
            title: t.title,
            section: t.section,
            created_at: t.created_at,
        }
    }
}

impl From<ReplyInfo> for ActivityEvent {
    fn from(r: ReplyInfo) -> Self {
        ActivityEvent::Reply {
            id: r.id,
            content: r.content,
            thread_id: r.thread_id,
            thread_title: r.thread_title,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaginatedActivity {
    pub activities: Vec<ActivityEvent>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RecentActivity {
    pub threads: Vec<ThreadInfo>,
    pub replies: Vec<ReplyInfo>,
}

/// Monthly activity counts keyed by `YYYY-MM`, serialized newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityMap(pub BTreeMap<String, i64>);

impl ActivityMap {
    #[must_use]
    pub fn get(&self, month: &str) -> Option<i64> {
        self.0.get(month).copied()
    }

    /// Months from newest to oldest.
    pub fn iter_newest_first(&self) -> impl Iterator<Item = (&String, &i64)> {
        self.0.iter().rev()
    }
}

impl Serialize for ActivityMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (month, count) in self.iter_newest_first() {
            map.serialize_entry(month, count)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngagementMetrics {
    /// Mean hours between a thread being opened and the user replying to it.
    pub avg_response_time: f64,
    /// `<Weekday>-<HH>` -> reply count.
    pub activity_heatmap: BTreeMap<String, i64>,
    pub last_active: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserActivityStats {
    pub total_threads: i64,
    pub total_replies: i64,
    pub top_sections: Vec<SectionCount>,
    pub recent_activity: RecentActivity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_map: Option<ActivityMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<EngagementMetrics>,
}
