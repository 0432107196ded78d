#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use tempfile::TempDir;
use uuid::Uuid;

use quad::store::{SqliteStore, Store, seed_default_roles};
use quad::types::{Reply, Role, Thread, User};

/// A seeded store in an isolated temp directory.
pub struct Fixture {
    pub temp_dir: TempDir,
    pub store: Arc<SqliteStore>,
    pub admin_role: Role,
    pub moderator_role: Role,
    pub member_role: Role,
}

impl Fixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let store = SqliteStore::new(temp_dir.path().join("quad.db")).expect("open store");
        store.initialize().expect("initialize store");

        let mut roles = seed_default_roles(&store).expect("seed roles").into_iter();
        let admin_role = roles.next().expect("admin role");
        let moderator_role = roles.next().expect("moderator role");
        let member_role = roles.next().expect("member role");

        Self {
            temp_dir,
            store: Arc::new(store),
            admin_role,
            moderator_role,
            member_role,
        }
    }

    pub fn user(&self, name: &str, role: &Role) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: format!("{}@uni.example", name.to_lowercase().replace(' ', ".")),
            name: name.to_string(),
            role_id: role.id.clone(),
            verified: true,
            bio: None,
            avatar_url: None,
            created_at: now,
            updated_at: now,
        };
        self.store.create_user(&user).expect("create user");
        user
    }

    pub fn member(&self, name: &str) -> User {
        self.user(name, &self.member_role)
    }

    pub fn thread(
        &self,
        author: &User,
        title: &str,
        section: &str,
        created_at: DateTime<Utc>,
    ) -> Thread {
        self.thread_with(author, title, "", section, "", created_at)
    }

    pub fn thread_with(
        &self,
        author: &User,
        title: &str,
        content: &str,
        section: &str,
        tags: &str,
        created_at: DateTime<Utc>,
    ) -> Thread {
        let thread = Thread {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            content: content.to_string(),
            section: section.to_string(),
            tags: tags.to_string(),
            views: 0,
            user_id: author.id.clone(),
            created_at,
            updated_at: created_at,
            deleted_at: None,
        };
        self.store.create_thread(&thread).expect("create thread");
        thread
    }

    pub fn reply(
        &self,
        author: &User,
        thread: &Thread,
        content: &str,
        created_at: DateTime<Utc>,
    ) -> Reply {
        let reply = Reply {
            id: Uuid::new_v4().to_string(),
            content: content.to_string(),
            thread_id: thread.id.clone(),
            user_id: author.id.clone(),
            created_at,
            updated_at: created_at,
            deleted_at: None,
        };
        self.store.create_reply(&reply).expect("create reply");
        reply
    }

    pub fn delete_thread(&self, thread: &Thread) {
        assert!(self.store.soft_delete_thread(&thread.id, Utc::now()).expect("delete thread"));
    }

    pub fn delete_reply(&self, reply: &Reply) {
        assert!(self.store.soft_delete_reply(&reply.id, Utc::now()).expect("delete reply"));
    }
}

/// Fixed reference point for timestamp arithmetic in tests.
pub fn day(n: f64) -> DateTime<Utc> {
    let base = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    base + Duration::minutes((n * 24.0 * 60.0) as i64)
}
