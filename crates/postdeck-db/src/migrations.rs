use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

/// Timestamps are stored as RFC 3339 TEXT written by the store, so
/// lexicographic ORDER BY matches chronological order. AUTOINCREMENT keeps
/// ids monotonic and never reused, even after deletion.
pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            email           TEXT NOT NULL UNIQUE,
            name            TEXT NOT NULL,
            password_hash   TEXT NOT NULL,
            avatar_url      TEXT,
            external_id     TEXT UNIQUE,
            role            TEXT NOT NULL DEFAULT 'team_member',
            created_at      TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS social_accounts (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id         INTEGER NOT NULL REFERENCES users(id),
            platform        TEXT NOT NULL,
            account_name    TEXT NOT NULL,
            account_id      TEXT NOT NULL,
            access_token    TEXT,
            is_connected    INTEGER NOT NULL DEFAULT 1,
            created_at      TEXT NOT NULL,
            UNIQUE(user_id, platform, account_id)
        );

        CREATE TABLE IF NOT EXISTS content_categories (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id         INTEGER NOT NULL REFERENCES users(id),
            name            TEXT NOT NULL,
            description     TEXT,
            color           TEXT NOT NULL DEFAULT '#3b82f6',
            auto_queue_rule TEXT,
            created_at      TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS posts (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id         INTEGER NOT NULL REFERENCES users(id),
            category_id     INTEGER REFERENCES content_categories(id),
            assigned_to     INTEGER REFERENCES users(id),
            content         TEXT NOT NULL,
            media_refs      TEXT,
            platforms       TEXT NOT NULL,
            status          TEXT NOT NULL DEFAULT 'draft',
            scheduled_at    TEXT,
            published_at    TEXT,
            approved_at     TEXT,
            approved_by     INTEGER REFERENCES users(id),
            engagement      TEXT,
            created_at      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_posts_user_status
            ON posts(user_id, status);
        CREATE INDEX IF NOT EXISTS idx_posts_user_scheduled
            ON posts(user_id, scheduled_at);

        CREATE TABLE IF NOT EXISTS post_comments (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            post_id         INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
            user_id         INTEGER NOT NULL REFERENCES users(id),
            content         TEXT NOT NULL,
            is_internal     INTEGER NOT NULL DEFAULT 1,
            created_at      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_comments_post
            ON post_comments(post_id);

        CREATE TABLE IF NOT EXISTS media_library (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id         INTEGER NOT NULL REFERENCES users(id),
            filename        TEXT NOT NULL,
            original_name   TEXT NOT NULL,
            mime_type       TEXT NOT NULL,
            size_bytes      INTEGER NOT NULL,
            url             TEXT NOT NULL,
            tags            TEXT NOT NULL,
            alt_text        TEXT,
            created_at      TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS automations (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id         INTEGER NOT NULL REFERENCES users(id),
            name            TEXT NOT NULL,
            description     TEXT,
            kind            TEXT NOT NULL,
            config          TEXT NOT NULL,
            is_active       INTEGER NOT NULL DEFAULT 1,
            trigger_count   INTEGER NOT NULL DEFAULT 0,
            last_run        TEXT,
            next_run        TEXT,
            created_at      TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS analytics (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id         INTEGER NOT NULL REFERENCES users(id),
            date            TEXT NOT NULL,
            platform        TEXT NOT NULL,
            followers       INTEGER NOT NULL DEFAULT 0,
            engagement      INTEGER NOT NULL DEFAULT 0,
            reach           INTEGER NOT NULL DEFAULT 0,
            posts           INTEGER NOT NULL DEFAULT 0,
            metrics         TEXT,
            created_at      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_analytics_user_platform
            ON analytics(user_id, platform);

        CREATE TABLE IF NOT EXISTS content_library (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id         INTEGER NOT NULL REFERENCES users(id),
            title           TEXT NOT NULL,
            body            TEXT,
            media_url       TEXT,
            media_type      TEXT,
            tags            TEXT NOT NULL,
            category        TEXT,
            is_template     INTEGER NOT NULL DEFAULT 0,
            created_at      TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS activities (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id         INTEGER NOT NULL REFERENCES users(id),
            kind            TEXT NOT NULL,
            description     TEXT NOT NULL,
            platform        TEXT,
            metadata        TEXT,
            created_at      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_activities_user_created
            ON activities(user_id, created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
