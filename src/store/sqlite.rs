use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::search::{ComposedQuery, ThreadMatch};
use crate::types::*;

const ROLE_COLUMNS: &str = "id, name, color, capabilities, created_at";
const USER_COLUMNS: &str =
    "id, email, name, role_id, verified, bio, avatar_url, created_at, updated_at";
const THREAD_COLUMNS: &str =
    "id, title, content, section, tags, views, user_id, created_at, updated_at, deleted_at";
const REPLY_COLUMNS: &str = "id, content, thread_id, user_id, created_at, updated_at, deleted_at";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        register_fold_case(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// SQL name of the Unicode-aware lowercasing function. SQLite's own
/// `LOWER` only folds ASCII letters.
const FOLD_CASE_FN: &str = "quad_fold";

fn register_fold_case(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        FOLD_CASE_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| Ok(ctx.get::<Option<String>>(0)?.map(|text| text.to_lowercase())),
    )
}

pub fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::warn!("Invalid datetime in database: '{}' - {}", s, e);
            DateTime::<Utc>::UNIX_EPOCH
        })
}

/// Fixed-width UTC form; lexical order matches chronological order.
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn role_from_row(row: &Row<'_>) -> rusqlite::Result<Role> {
    Ok(Role {
        id: row.get(0)?,
        name: row.get(1)?,
        color: row.get(2)?,
        capabilities: CapabilitySet::from(row.get::<_, i64>(3)?),
        created_at: parse_datetime(&row.get::<_, String>(4)?),
    })
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        role_id: row.get(3)?,
        verified: row.get(4)?,
        bio: row.get(5)?,
        avatar_url: row.get(6)?,
        created_at: parse_datetime(&row.get::<_, String>(7)?),
        updated_at: parse_datetime(&row.get::<_, String>(8)?),
    })
}

fn thread_from_row(row: &Row<'_>) -> rusqlite::Result<Thread> {
    Ok(Thread {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        section: row.get(3)?,
        tags: row.get(4)?,
        views: row.get(5)?,
        user_id: row.get(6)?,
        created_at: parse_datetime(&row.get::<_, String>(7)?),
        updated_at: parse_datetime(&row.get::<_, String>(8)?),
        deleted_at: row.get::<_, Option<String>>(9)?.map(|s| parse_datetime(&s)),
    })
}

fn reply_from_row(row: &Row<'_>) -> rusqlite::Result<Reply> {
    Ok(Reply {
        id: row.get(0)?,
        content: row.get(1)?,
        thread_id: row.get(2)?,
        user_id: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
        updated_at: parse_datetime(&row.get::<_, String>(5)?),
        deleted_at: row.get::<_, Option<String>>(6)?.map(|s| parse_datetime(&s)),
    })
}

impl SqliteStore {
    fn timestamps(&self, sql: &str, user_id: &str) -> Result<Vec<DateTime<Utc>>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok(parse_datetime(&row.get::<_, String>(0)?))
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn count(&self, sql: &str, user_id: &str) -> Result<i64> {
        self.conn()
            .query_row(sql, params![user_id], |row| row.get(0))
            .map_err(Error::from)
    }
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // Role operations

    fn create_role(&self, role: &Role) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO roles (id, name, color, capabilities, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                role.id,
                role.name,
                role.color,
                i64::from(role.capabilities),
                format_datetime(&role.created_at),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_constraint_violation(&e) => Err(Error::AlreadyExists),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_role(&self, id: &str) -> Result<Option<Role>> {
        self.conn()
            .query_row(
                &format!("SELECT {ROLE_COLUMNS} FROM roles WHERE id = ?1"),
                params![id],
                role_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn get_role_by_name(&self, name: &str) -> Result<Option<Role>> {
        self.conn()
            .query_row(
                &format!("SELECT {ROLE_COLUMNS} FROM roles WHERE name = ?1"),
                params![name],
                role_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_roles(&self) -> Result<Vec<Role>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare(&format!("SELECT {ROLE_COLUMNS} FROM roles ORDER BY created_at, name"))?;
        let rows = stmt.query_map([], role_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // User operations

    fn create_user(&self, user: &User) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO users (id, email, name, role_id, verified, bio, avatar_url, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                user.id,
                user.email,
                user.name,
                user.role_id,
                user.verified,
                user.bio,
                user.avatar_url,
                format_datetime(&user.created_at),
                format_datetime(&user.updated_at),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_constraint_violation(&e) => Err(Error::AlreadyExists),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_user(&self, id: &str) -> Result<Option<User>> {
        self.conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                user_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                params![email],
                user_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn get_users(&self, ids: &[String]) -> Result<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id IN ({})",
            placeholders(ids.len())
        ))?;
        let rows = stmt.query_map(params_from_iter(ids.iter()), user_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_users(&self, offset: i64, limit: i64) -> Result<Vec<User>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at, id LIMIT ?1 OFFSET ?2"
        ))?;
        let rows = stmt.query_map(params![limit, offset], user_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn count_users(&self) -> Result<i64> {
        self.conn()
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .map_err(Error::from)
    }

    fn update_user(&self, user: &User) -> Result<()> {
        let result = self.conn().execute(
            "UPDATE users SET email = ?1, name = ?2, role_id = ?3, verified = ?4, bio = ?5,
                avatar_url = ?6, updated_at = ?7
             WHERE id = ?8",
            params![
                user.email,
                user.name,
                user.role_id,
                user.verified,
                user.bio,
                user.avatar_url,
                format_datetime(&user.updated_at),
                user.id,
            ],
        );

        match result {
            Ok(0) => Err(Error::NotFound),
            Ok(_) => Ok(()),
            Err(e) if is_constraint_violation(&e) => Err(Error::AlreadyExists),
            Err(e) => Err(Error::from(e)),
        }
    }

    // Thread operations

    fn create_thread(&self, thread: &Thread) -> Result<()> {
        self.conn().execute(
            "INSERT INTO threads (id, title, content, section, tags, views, user_id, created_at, updated_at, deleted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                thread.id,
                thread.title,
                thread.content,
                thread.section,
                thread.tags,
                thread.views,
                thread.user_id,
                format_datetime(&thread.created_at),
                format_datetime(&thread.updated_at),
                thread.deleted_at.as_ref().map(format_datetime),
            ],
        )?;
        Ok(())
    }

    fn get_thread(&self, id: &str) -> Result<Option<Thread>> {
        self.conn()
            .query_row(
                &format!(
                    "SELECT {THREAD_COLUMNS} FROM threads WHERE id = ?1 AND deleted_at IS NULL"
                ),
                params![id],
                thread_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_section_threads(&self, section: &str) -> Result<Vec<Thread>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {THREAD_COLUMNS} FROM threads
             WHERE section = ?1 AND deleted_at IS NULL
             ORDER BY created_at DESC, id DESC"
        ))?;
        let rows = stmt.query_map(params![section], thread_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn increment_thread_views(&self, id: &str) -> Result<()> {
        self.conn().execute(
            "UPDATE threads SET views = views + 1 WHERE id = ?1 AND deleted_at IS NULL",
            params![id],
        )?;
        Ok(())
    }

    fn soft_delete_thread(&self, id: &str, at: DateTime<Utc>) -> Result<bool> {
        let rows = self.conn().execute(
            "UPDATE threads SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
            params![format_datetime(&at), id],
        )?;
        Ok(rows > 0)
    }

    // Reply operations

    fn create_reply(&self, reply: &Reply) -> Result<()> {
        self.conn().execute(
            "INSERT INTO replies (id, content, thread_id, user_id, created_at, updated_at, deleted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                reply.id,
                reply.content,
                reply.thread_id,
                reply.user_id,
                format_datetime(&reply.created_at),
                format_datetime(&reply.updated_at),
                reply.deleted_at.as_ref().map(format_datetime),
            ],
        )?;
        Ok(())
    }

    fn get_reply(&self, id: &str) -> Result<Option<Reply>> {
        self.conn()
            .query_row(
                &format!(
                    "SELECT {REPLY_COLUMNS} FROM replies WHERE id = ?1 AND deleted_at IS NULL"
                ),
                params![id],
                reply_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    fn list_thread_replies(&self, thread_ids: &[String]) -> Result<Vec<Reply>> {
        if thread_ids.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {REPLY_COLUMNS} FROM replies
             WHERE thread_id IN ({}) AND deleted_at IS NULL
             ORDER BY created_at, id",
            placeholders(thread_ids.len())
        ))?;
        let rows = stmt.query_map(params_from_iter(thread_ids.iter()), reply_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn soft_delete_reply(&self, id: &str, at: DateTime<Utc>) -> Result<bool> {
        let rows = self.conn().execute(
            "UPDATE replies SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
            params![format_datetime(&at), id],
        )?;
        Ok(rows > 0)
    }

    // Per-user activity aggregates

    fn count_user_threads(&self, user_id: &str) -> Result<i64> {
        self.count(
            "SELECT COUNT(*) FROM threads WHERE user_id = ?1 AND deleted_at IS NULL",
            user_id,
        )
    }

    fn count_user_replies(&self, user_id: &str) -> Result<i64> {
        self.count(
            "SELECT COUNT(*) FROM replies WHERE user_id = ?1 AND deleted_at IS NULL",
            user_id,
        )
    }

    fn top_user_sections(&self, user_id: &str, limit: i64) -> Result<Vec<SectionCount>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT section, COUNT(*) AS count FROM threads
             WHERE user_id = ?1 AND deleted_at IS NULL
             GROUP BY section
             ORDER BY count DESC, section
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![user_id, limit], |row| {
            Ok(SectionCount {
                section: row.get(0)?,
                count: row.get(1)?,
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn recent_user_threads(&self, user_id: &str, limit: i64) -> Result<Vec<ThreadInfo>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, title, section, created_at FROM threads
             WHERE user_id = ?1 AND deleted_at IS NULL
             ORDER BY created_at DESC, id DESC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![user_id, limit], |row| {
            Ok(ThreadInfo {
                id: row.get(0)?,
                title: row.get(1)?,
                section: row.get(2)?,
                created_at: parse_datetime(&row.get::<_, String>(3)?),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn recent_user_replies(&self, user_id: &str, limit: i64) -> Result<Vec<ReplyInfo>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT r.id, r.content, r.thread_id, t.title, r.created_at
             FROM replies r
             LEFT JOIN threads t ON t.id = r.thread_id AND t.deleted_at IS NULL
             WHERE r.user_id = ?1 AND r.deleted_at IS NULL
             ORDER BY r.created_at DESC, r.id DESC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![user_id, limit], |row| {
            Ok(ReplyInfo {
                id: row.get(0)?,
                content: row.get(1)?,
                thread_id: row.get(2)?,
                thread_title: row.get(3)?,
                created_at: parse_datetime(&row.get::<_, String>(4)?),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn user_reply_timings(&self, user_id: &str) -> Result<Vec<ReplyTiming>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT r.created_at, t.created_at
             FROM replies r
             JOIN threads t ON t.id = r.thread_id
             WHERE r.user_id = ?1 AND r.deleted_at IS NULL",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok(ReplyTiming {
                reply_at: parse_datetime(&row.get::<_, String>(0)?),
                thread_at: parse_datetime(&row.get::<_, String>(1)?),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn user_thread_timestamps(&self, user_id: &str) -> Result<Vec<DateTime<Utc>>> {
        self.timestamps(
            "SELECT created_at FROM threads WHERE user_id = ?1 AND deleted_at IS NULL",
            user_id,
        )
    }

    fn user_reply_timestamps(&self, user_id: &str) -> Result<Vec<DateTime<Utc>>> {
        self.timestamps(
            "SELECT created_at FROM replies WHERE user_id = ?1 AND deleted_at IS NULL",
            user_id,
        )
    }

    // Search

    fn search_threads(&self, query: &ComposedQuery) -> Result<Vec<ThreadMatch>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&query.sql)?;
        let rows = stmt.query_map(params_from_iter(query.params.iter()), |row| {
            Ok(ThreadMatch {
                thread: thread_from_row(row)?,
                reply_count: row.get(10)?,
                last_reply_at: row.get::<_, Option<String>>(11)?.map(|s| parse_datetime(&s)),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    use super::*;
    use crate::store::seed_default_roles;

    fn open_store(temp: &TempDir) -> SqliteStore {
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        store
    }

    fn user(id: &str, role_id: &str) -> User {
        let now = Utc::now();
        User {
            id: id.to_string(),
            email: format!("{id}@uni.example"),
            name: id.to_string(),
            role_id: role_id.to_string(),
            verified: true,
            bio: None,
            avatar_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn thread(id: &str, user_id: &str, created_at: DateTime<Utc>) -> Thread {
        Thread {
            id: id.to_string(),
            title: format!("Thread {id}"),
            content: "body".to_string(),
            section: "general".to_string(),
            tags: String::new(),
            views: 0,
            user_id: user_id.to_string(),
            created_at,
            updated_at: created_at,
            deleted_at: None,
        }
    }

    fn reply(id: &str, thread_id: &str, user_id: &str, created_at: DateTime<Utc>) -> Reply {
        Reply {
            id: id.to_string(),
            content: "reply".to_string(),
            thread_id: thread_id.to_string(),
            user_id: user_id.to_string(),
            created_at,
            updated_at: created_at,
            deleted_at: None,
        }
    }

    #[test]
    fn test_initialize_creates_tables() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let conn = store.conn();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert_eq!(tables, vec!["replies", "roles", "threads", "users"]);
    }

    #[test]
    fn test_fold_case_lowercases_unicode() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let conn = store.conn();
        let folded: String = conn
            .query_row("SELECT quad_fold('Übung ÄRGER Élan')", [], |row| row.get(0))
            .unwrap();
        assert_eq!(folded, "übung ärger élan");

        let null: Option<String> = conn
            .query_row("SELECT quad_fold(NULL)", [], |row| row.get(0))
            .unwrap();
        assert_eq!(null, None);
    }

    #[test]
    fn test_datetime_format_is_sortable() {
        let early = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let late = early + Duration::microseconds(1500);
        assert_eq!(format_datetime(&early), "2024-01-01T09:00:00.000000Z");
        assert!(format_datetime(&early) < format_datetime(&late));
        assert_eq!(parse_datetime(&format_datetime(&late)), late);
        assert_eq!(
            parse_datetime("2024-01-01 09:00:00"),
            Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_seed_default_roles_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let first = seed_default_roles(&store).unwrap();
        let second = seed_default_roles(&store).unwrap();
        assert_eq!(first.len(), 3);
        assert_eq!(
            first.iter().map(|r| &r.id).collect::<Vec<_>>(),
            second.iter().map(|r| &r.id).collect::<Vec<_>>()
        );

        let admin = store.get_role_by_name("admin").unwrap().unwrap();
        assert!(admin.can(Capability::ManageRoles));
        assert!(!admin.can(Capability::Reply));
        assert_eq!(store.list_roles().unwrap().len(), 3);
    }

    #[test]
    fn test_duplicate_email_is_rejected() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let roles = seed_default_roles(&store).unwrap();

        store.create_user(&user("alice", &roles[2].id)).unwrap();
        let mut dup = user("alice2", &roles[2].id);
        dup.email = "alice@uni.example".to_string();

        assert!(matches!(store.create_user(&dup), Err(Error::AlreadyExists)));
    }

    #[test]
    fn test_user_update_and_lookup() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let roles = seed_default_roles(&store).unwrap();

        let mut alice = user("alice", &roles[2].id);
        store.create_user(&alice).unwrap();

        alice.bio = Some("Flies quadcopters".to_string());
        alice.role_id = roles[1].id.clone();
        store.update_user(&alice).unwrap();

        let fetched = store.get_user_by_email("alice@uni.example").unwrap().unwrap();
        assert_eq!(fetched.bio.as_deref(), Some("Flies quadcopters"));
        assert_eq!(fetched.role_id, roles[1].id);

        let missing = user("ghost", &roles[2].id);
        assert!(matches!(store.update_user(&missing), Err(Error::NotFound)));
    }

    #[test]
    fn test_soft_deleted_rows_are_hidden() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let roles = seed_default_roles(&store).unwrap();
        store.create_user(&user("alice", &roles[2].id)).unwrap();

        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        store.create_thread(&thread("t1", "alice", t0)).unwrap();
        store
            .create_reply(&reply("r1", "t1", "alice", t0 + Duration::hours(1)))
            .unwrap();

        assert!(store.soft_delete_thread("t1", Utc::now()).unwrap());
        assert!(!store.soft_delete_thread("t1", Utc::now()).unwrap());
        assert!(store.get_thread("t1").unwrap().is_none());
        assert_eq!(store.count_user_threads("alice").unwrap(), 0);

        // The reply survives but loses its parent title.
        let replies = store.recent_user_replies("alice", 5).unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].thread_title, None);

        // Timings still see the parent row.
        assert_eq!(store.user_reply_timings("alice").unwrap().len(), 1);

        assert!(store.soft_delete_reply("r1", Utc::now()).unwrap());
        assert_eq!(store.count_user_replies("alice").unwrap(), 0);
        assert!(store.get_reply("r1").unwrap().is_none());
    }

    #[test]
    fn test_reply_requires_existing_thread() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let roles = seed_default_roles(&store).unwrap();
        store.create_user(&user("alice", &roles[2].id)).unwrap();

        let result = store.create_reply(&reply("r1", "missing", "alice", Utc::now()));
        assert!(matches!(result, Err(Error::Database(_))));
    }

    #[test]
    fn test_top_sections_order() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let roles = seed_default_roles(&store).unwrap();
        store.create_user(&user("alice", &roles[2].id)).unwrap();

        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let sections = ["b", "a", "c", "a", "c", "c"];
        for (i, section) in sections.iter().enumerate() {
            let mut t = thread(&format!("t{i}"), "alice", t0 + Duration::hours(i as i64));
            t.section = section.to_string();
            store.create_thread(&t).unwrap();
        }

        let top = store.top_user_sections("alice", 2).unwrap();
        assert_eq!(
            top,
            vec![
                SectionCount { section: "c".into(), count: 3 },
                SectionCount { section: "a".into(), count: 2 },
            ]
        );
    }

    #[test]
    fn test_list_users_pages() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let roles = seed_default_roles(&store).unwrap();
        for name in ["a", "b", "c"] {
            store.create_user(&user(name, &roles[2].id)).unwrap();
        }

        assert_eq!(store.count_users().unwrap(), 3);
        assert_eq!(store.list_users(0, 2).unwrap().len(), 2);
        assert_eq!(store.list_users(2, 2).unwrap().len(), 1);
        assert_eq!(store.get_users(&["a".into(), "c".into()]).unwrap().len(), 2);
        assert!(store.get_users(&[]).unwrap().is_empty());
    }
}
