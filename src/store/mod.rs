mod schema;
mod sqlite;

pub use sqlite::{SqliteStore, format_datetime, parse_datetime};

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::search::{ComposedQuery, ThreadMatch};
use crate::types::*;

/// Store defines the database interface.
///
/// Every thread / reply read excludes soft-deleted rows unless noted.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // Role operations
    fn create_role(&self, role: &Role) -> Result<()>;
    fn get_role(&self, id: &str) -> Result<Option<Role>>;
    fn get_role_by_name(&self, name: &str) -> Result<Option<Role>>;
    fn list_roles(&self) -> Result<Vec<Role>>;

    // User operations
    fn create_user(&self, user: &User) -> Result<()>;
    fn get_user(&self, id: &str) -> Result<Option<User>>;
    fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    fn get_users(&self, ids: &[String]) -> Result<Vec<User>>;
    fn list_users(&self, offset: i64, limit: i64) -> Result<Vec<User>>;
    fn count_users(&self) -> Result<i64>;
    fn update_user(&self, user: &User) -> Result<()>;

    // Thread operations
    fn create_thread(&self, thread: &Thread) -> Result<()>;
    fn get_thread(&self, id: &str) -> Result<Option<Thread>>;
    fn list_section_threads(&self, section: &str) -> Result<Vec<Thread>>;
    fn increment_thread_views(&self, id: &str) -> Result<()>;
    fn soft_delete_thread(&self, id: &str, at: DateTime<Utc>) -> Result<bool>;

    // Reply operations
    fn create_reply(&self, reply: &Reply) -> Result<()>;
    fn get_reply(&self, id: &str) -> Result<Option<Reply>>;
    /// Replies of the given threads, oldest first.
    fn list_thread_replies(&self, thread_ids: &[String]) -> Result<Vec<Reply>>;
    fn soft_delete_reply(&self, id: &str, at: DateTime<Utc>) -> Result<bool>;

    // Per-user activity aggregates
    fn count_user_threads(&self, user_id: &str) -> Result<i64>;
    fn count_user_replies(&self, user_id: &str) -> Result<i64>;
    fn top_user_sections(&self, user_id: &str, limit: i64) -> Result<Vec<SectionCount>>;
    /// Newest first; ties by id descending.
    fn recent_user_threads(&self, user_id: &str, limit: i64) -> Result<Vec<ThreadInfo>>;
    /// Newest first; ties by id descending. Titles of deleted parents are None.
    fn recent_user_replies(&self, user_id: &str, limit: i64) -> Result<Vec<ReplyInfo>>;
    /// Reply / parent timestamps for every reply whose parent row exists.
    fn user_reply_timings(&self, user_id: &str) -> Result<Vec<ReplyTiming>>;
    fn user_thread_timestamps(&self, user_id: &str) -> Result<Vec<DateTime<Utc>>>;
    fn user_reply_timestamps(&self, user_id: &str) -> Result<Vec<DateTime<Utc>>>;

    // Search
    fn search_threads(&self, query: &ComposedQuery) -> Result<Vec<ThreadMatch>>;
}

/// Name, color and capabilities of the roles every installation starts with.
pub const DEFAULT_ROLES: [(&str, &str, CapabilitySet); 3] = [
    ("admin", "#FF4444", CapabilitySet::admin_defaults()),
    ("moderator", "#44AA44", CapabilitySet::moderator_defaults()),
    ("member", "#808080", CapabilitySet::member_defaults()),
];

/// Creates any missing default role. Existing roles are left untouched.
pub fn seed_default_roles(store: &dyn Store) -> Result<Vec<Role>> {
    let mut roles = Vec::with_capacity(DEFAULT_ROLES.len());
    for (name, color, capabilities) in DEFAULT_ROLES {
        let role = match store.get_role_by_name(name)? {
            Some(existing) => existing,
            None => {
                let role = Role {
                    id: uuid::Uuid::new_v4().to_string(),
                    name: name.to_string(),
                    color: color.to_string(),
                    capabilities,
                    created_at: Utc::now(),
                };
                store.create_role(&role)?;
                tracing::info!(role = name, "created default role");
                role
            }
        };
        roles.push(role);
    }
    Ok(roles)
}
