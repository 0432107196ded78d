pub const SCHEMA: &str = r#"
-- Roles carry a capability bitmask (see types::CapabilitySet)
CREATE TABLE IF NOT EXISTS roles (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    color TEXT NOT NULL DEFAULT '#808080',
    capabilities INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    role_id TEXT NOT NULL REFERENCES roles(id),
    verified INTEGER NOT NULL DEFAULT 0,
    bio TEXT,
    avatar_url TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Timestamps are fixed-width RFC 3339 (microseconds, Z) so text order is time order
CREATE TABLE IF NOT EXISTS threads (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    section TEXT NOT NULL,
    tags TEXT NOT NULL DEFAULT '',
    views INTEGER NOT NULL DEFAULT 0,
    user_id TEXT NOT NULL REFERENCES users(id),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    deleted_at TEXT               -- NULL = live
);

CREATE TABLE IF NOT EXISTS replies (
    id TEXT PRIMARY KEY,
    content TEXT NOT NULL,
    thread_id TEXT NOT NULL REFERENCES threads(id),
    user_id TEXT NOT NULL REFERENCES users(id),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    deleted_at TEXT               -- NULL = live
);

CREATE INDEX IF NOT EXISTS idx_users_role ON users(role_id);
CREATE INDEX IF NOT EXISTS idx_threads_user_created ON threads(user_id, created_at);
CREATE INDEX IF NOT EXISTS idx_threads_section ON threads(section);
CREATE INDEX IF NOT EXISTS idx_replies_thread ON replies(thread_id);
CREATE INDEX IF NOT EXISTS idx_replies_user_created ON replies(user_id, created_at);
"#;
