//! Blocking rusqlite helpers. One mapper and one set of statement helpers
//! per table; `SqliteStorage` runs these inside `spawn_blocking`.

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Serialize;
use serde::de::DeserializeOwned;

use postdeck_types::models::{
    Activity, AnalyticsRow, AnalyticsSummary, Automation, AutomationUpdate, CategoryUpdate,
    ContentCategory, LibraryItem, MediaItem, MediaUpdate, NewActivity, NewAnalyticsRow,
    NewAutomation, NewCategory, NewComment, NewLibraryItem, NewMediaItem, NewPost,
    NewSocialAccount, NewUser, Post, PostComment, PostStatus, PostUpdate, SocialAccount, User,
    UserProfileUpdate,
};

// -- Column conversions --

/// RFC 3339 with fixed-width nanosecond fractional seconds, so TEXT
/// ordering is chronological ordering and create-then-fetch returns the
/// exact timestamp the insert reported.
fn ts_to_sql(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn opt_ts_to_sql(t: Option<DateTime<Utc>>) -> Option<String> {
    t.map(ts_to_sql)
}

fn json_to_sql<T: Serialize>(v: &T) -> Result<String> {
    Ok(serde_json::to_string(v)?)
}

fn opt_json_to_sql<T: Serialize>(v: &Option<T>) -> Result<Option<String>> {
    v.as_ref().map(|v| json_to_sql(v)).transpose()
}

fn conv_err(idx: usize, e: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

fn get_ts(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let s: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conv_err(idx, e))
}

fn get_opt_ts(row: &Row, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let s: Option<String> = row.get(idx)?;
    s.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| conv_err(idx, e))
    })
    .transpose()
}

fn get_json<T: DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    let s: String = row.get(idx)?;
    serde_json::from_str(&s).map_err(|e| conv_err(idx, e))
}

fn get_opt_json<T: DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<Option<T>> {
    let s: Option<String> = row.get(idx)?;
    s.map(|s| serde_json::from_str(&s).map_err(|e| conv_err(idx, e)))
        .transpose()
}

pub(crate) fn delete_by_id(conn: &Connection, table: &'static str, id: i64) -> Result<bool> {
    let affected = conn.execute(&format!("DELETE FROM {table} WHERE id = ?1"), [id])?;
    Ok(affected > 0)
}

// -- Users --

const USER_COLS: &str = "id, email, name, password_hash, avatar_url, external_id, role, created_at";

fn map_user(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        password_hash: row.get(3)?,
        avatar_url: row.get(4)?,
        external_id: row.get(5)?,
        role: row.get::<_, String>(6)?.parse().map_err(|e| conv_err(6, e))?,
        created_at: get_ts(row, 7)?,
    })
}

pub(crate) fn insert_user(conn: &Connection, data: NewUser) -> Result<User> {
    let now = Utc::now();
    conn.execute(
        "INSERT INTO users (email, name, password_hash, avatar_url, external_id, role, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            data.email,
            data.name,
            data.password_hash,
            data.avatar_url,
            data.external_id,
            data.role.as_str(),
            ts_to_sql(now),
        ],
    )?;
    Ok(User {
        id: conn.last_insert_rowid(),
        email: data.email,
        name: data.name,
        password_hash: data.password_hash,
        avatar_url: data.avatar_url,
        external_id: data.external_id,
        role: data.role,
        created_at: now,
    })
}

pub(crate) fn query_user(conn: &Connection, id: i64) -> Result<Option<User>> {
    let sql = format!("SELECT {USER_COLS} FROM users WHERE id = ?1");
    Ok(conn.query_row(&sql, [id], map_user).optional()?)
}

pub(crate) fn query_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {USER_COLS} FROM users WHERE email = ?1");
    Ok(conn.query_row(&sql, [email], map_user).optional()?)
}

pub(crate) fn query_user_by_external_id(
    conn: &Connection,
    external_id: &str,
) -> Result<Option<User>> {
    let sql = format!("SELECT {USER_COLS} FROM users WHERE external_id = ?1");
    Ok(conn.query_row(&sql, [external_id], map_user).optional()?)
}

pub(crate) fn update_user_profile(
    conn: &Connection,
    id: i64,
    update: UserProfileUpdate,
) -> Result<Option<User>> {
    let Some(mut user) = query_user(conn, id)? else {
        return Ok(None);
    };
    if let Some(name) = update.name {
        user.name = name;
    }
    if let Some(avatar_url) = update.avatar_url {
        user.avatar_url = Some(avatar_url);
    }
    if let Some(password_hash) = update.password_hash {
        user.password_hash = password_hash;
    }
    conn.execute(
        "UPDATE users SET name = ?2, avatar_url = ?3, password_hash = ?4 WHERE id = ?1",
        params![id, user.name, user.avatar_url, user.password_hash],
    )?;
    Ok(Some(user))
}

// -- Social accounts --

const ACCOUNT_COLS: &str =
    "id, user_id, platform, account_name, account_id, access_token, is_connected, created_at";

fn map_account(row: &Row) -> rusqlite::Result<SocialAccount> {
    Ok(SocialAccount {
        id: row.get(0)?,
        user_id: row.get(1)?,
        platform: row.get(2)?,
        account_name: row.get(3)?,
        account_id: row.get(4)?,
        access_token: row.get(5)?,
        is_connected: row.get(6)?,
        created_at: get_ts(row, 7)?,
    })
}

pub(crate) fn query_accounts(conn: &Connection, user_id: i64) -> Result<Vec<SocialAccount>> {
    let sql = format!("SELECT {ACCOUNT_COLS} FROM social_accounts WHERE user_id = ?1 ORDER BY id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([user_id], map_account)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub(crate) fn upsert_account(conn: &Connection, data: NewSocialAccount) -> Result<SocialAccount> {
    let now = Utc::now();
    let sql = format!(
        "INSERT INTO social_accounts
             (user_id, platform, account_name, account_id, access_token, is_connected, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(user_id, platform, account_id) DO UPDATE SET
             account_name = excluded.account_name,
             access_token = excluded.access_token,
             is_connected = excluded.is_connected
         RETURNING {ACCOUNT_COLS}"
    );
    let account = conn.query_row(
        &sql,
        params![
            data.user_id,
            data.platform,
            data.account_name,
            data.account_id,
            data.access_token,
            data.is_connected,
            ts_to_sql(now),
        ],
        map_account,
    )?;
    Ok(account)
}

pub(crate) fn set_account_connected(
    conn: &Connection,
    id: i64,
    is_connected: bool,
) -> Result<Option<SocialAccount>> {
    let sql = format!(
        "UPDATE social_accounts SET is_connected = ?2 WHERE id = ?1 RETURNING {ACCOUNT_COLS}"
    );
    Ok(conn
        .query_row(&sql, params![id, is_connected], map_account)
        .optional()?)
}

// -- Posts --

const POST_COLS: &str = "id, user_id, category_id, assigned_to, content, media_refs, platforms, \
                         status, scheduled_at, published_at, approved_at, approved_by, engagement, \
                         created_at";

fn map_post(row: &Row) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        user_id: row.get(1)?,
        category_id: row.get(2)?,
        assigned_to: row.get(3)?,
        content: row.get(4)?,
        media_refs: get_opt_json(row, 5)?,
        platforms: get_json(row, 6)?,
        status: row.get::<_, String>(7)?.parse().map_err(|e| conv_err(7, e))?,
        scheduled_at: get_opt_ts(row, 8)?,
        published_at: get_opt_ts(row, 9)?,
        approved_at: get_opt_ts(row, 10)?,
        approved_by: row.get(11)?,
        engagement: get_opt_json(row, 12)?,
        created_at: get_ts(row, 13)?,
    })
}

pub(crate) fn insert_post(conn: &Connection, data: NewPost) -> Result<Post> {
    let now = Utc::now();
    conn.execute(
        "INSERT INTO posts (user_id, category_id, assigned_to, content, media_refs, platforms,
                            status, scheduled_at, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            data.user_id,
            data.category_id,
            data.assigned_to,
            data.content,
            opt_json_to_sql(&data.media_refs)?,
            json_to_sql(&data.platforms)?,
            data.status.as_str(),
            opt_ts_to_sql(data.scheduled_at),
            ts_to_sql(now),
        ],
    )?;
    Ok(Post {
        id: conn.last_insert_rowid(),
        user_id: data.user_id,
        category_id: data.category_id,
        assigned_to: data.assigned_to,
        content: data.content,
        media_refs: data.media_refs,
        platforms: data.platforms,
        status: data.status,
        scheduled_at: data.scheduled_at,
        published_at: None,
        approved_at: None,
        approved_by: None,
        engagement: None,
        created_at: now,
    })
}

pub(crate) fn query_posts(conn: &Connection, user_id: i64) -> Result<Vec<Post>> {
    let sql = format!(
        "SELECT {POST_COLS} FROM posts WHERE user_id = ?1 ORDER BY created_at DESC, id DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([user_id], map_post)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub(crate) fn query_posts_by_status(
    conn: &Connection,
    user_id: i64,
    status: PostStatus,
) -> Result<Vec<Post>> {
    let sql = format!(
        "SELECT {POST_COLS} FROM posts WHERE user_id = ?1 AND status = ?2
         ORDER BY created_at DESC, id DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![user_id, status.as_str()], map_post)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub(crate) fn query_upcoming_posts(conn: &Connection, user_id: i64) -> Result<Vec<Post>> {
    let sql = format!(
        "SELECT {POST_COLS} FROM posts
         WHERE user_id = ?1 AND status = 'scheduled'
           AND scheduled_at IS NOT NULL AND scheduled_at >= ?2
         ORDER BY scheduled_at ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![user_id, ts_to_sql(Utc::now())], map_post)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub(crate) fn query_top_posts(conn: &Connection, user_id: i64, limit: usize) -> Result<Vec<Post>> {
    let sql = format!(
        "SELECT {POST_COLS} FROM posts
         WHERE user_id = ?1 AND status = 'published' AND engagement IS NOT NULL
         ORDER BY json_extract(engagement, '$.reach') DESC
         LIMIT ?2"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![user_id, limit as i64], map_post)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub(crate) fn update_post(conn: &Connection, id: i64, update: PostUpdate) -> Result<Option<Post>> {
    let sql = format!("SELECT {POST_COLS} FROM posts WHERE id = ?1");
    let Some(mut post) = conn.query_row(&sql, [id], map_post).optional()? else {
        return Ok(None);
    };
    if let Some(category_id) = update.category_id {
        post.category_id = Some(category_id);
    }
    if let Some(assigned_to) = update.assigned_to {
        post.assigned_to = Some(assigned_to);
    }
    if let Some(content) = update.content {
        post.content = content;
    }
    if let Some(media_refs) = update.media_refs {
        post.media_refs = Some(media_refs);
    }
    if let Some(platforms) = update.platforms {
        post.platforms = platforms;
    }
    if let Some(status) = update.status {
        post.status = status;
    }
    if let Some(scheduled_at) = update.scheduled_at {
        post.scheduled_at = Some(scheduled_at);
    }
    if let Some(published_at) = update.published_at {
        post.published_at = Some(published_at);
    }
    if let Some(approved_at) = update.approved_at {
        post.approved_at = Some(approved_at);
    }
    if let Some(approved_by) = update.approved_by {
        post.approved_by = Some(approved_by);
    }
    if let Some(engagement) = update.engagement {
        post.engagement = Some(engagement);
    }
    conn.execute(
        "UPDATE posts SET category_id = ?2, assigned_to = ?3, content = ?4, media_refs = ?5,
                          platforms = ?6, status = ?7, scheduled_at = ?8, published_at = ?9,
                          approved_at = ?10, approved_by = ?11, engagement = ?12
         WHERE id = ?1",
        params![
            id,
            post.category_id,
            post.assigned_to,
            post.content,
            opt_json_to_sql(&post.media_refs)?,
            json_to_sql(&post.platforms)?,
            post.status.as_str(),
            opt_ts_to_sql(post.scheduled_at),
            opt_ts_to_sql(post.published_at),
            opt_ts_to_sql(post.approved_at),
            post.approved_by,
            opt_json_to_sql(&post.engagement)?,
        ],
    )?;
    Ok(Some(post))
}

// -- Automations --

const AUTOMATION_COLS: &str = "id, user_id, name, description, kind, config, is_active, \
                               trigger_count, last_run, next_run, created_at";

fn map_automation(row: &Row) -> rusqlite::Result<Automation> {
    Ok(Automation {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        kind: row.get(4)?,
        config: get_json(row, 5)?,
        is_active: row.get(6)?,
        trigger_count: row.get(7)?,
        last_run: get_opt_ts(row, 8)?,
        next_run: get_opt_ts(row, 9)?,
        created_at: get_ts(row, 10)?,
    })
}

pub(crate) fn insert_automation(conn: &Connection, data: NewAutomation) -> Result<Automation> {
    let now = Utc::now();
    conn.execute(
        "INSERT INTO automations (user_id, name, description, kind, config, is_active,
                                  trigger_count, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)",
        params![
            data.user_id,
            data.name,
            data.description,
            data.kind,
            json_to_sql(&data.config)?,
            data.is_active,
            ts_to_sql(now),
        ],
    )?;
    Ok(Automation {
        id: conn.last_insert_rowid(),
        user_id: data.user_id,
        name: data.name,
        description: data.description,
        kind: data.kind,
        config: data.config,
        is_active: data.is_active,
        trigger_count: 0,
        last_run: None,
        next_run: None,
        created_at: now,
    })
}

pub(crate) fn query_automations(conn: &Connection, user_id: i64) -> Result<Vec<Automation>> {
    let sql = format!(
        "SELECT {AUTOMATION_COLS} FROM automations WHERE user_id = ?1
         ORDER BY created_at DESC, id DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([user_id], map_automation)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub(crate) fn update_automation(
    conn: &Connection,
    id: i64,
    update: AutomationUpdate,
) -> Result<Option<Automation>> {
    let sql = format!("SELECT {AUTOMATION_COLS} FROM automations WHERE id = ?1");
    let Some(mut automation) = conn.query_row(&sql, [id], map_automation).optional()? else {
        return Ok(None);
    };
    if let Some(name) = update.name {
        automation.name = name;
    }
    if let Some(description) = update.description {
        automation.description = Some(description);
    }
    if let Some(kind) = update.kind {
        automation.kind = kind;
    }
    if let Some(config) = update.config {
        automation.config = config;
    }
    if let Some(is_active) = update.is_active {
        automation.is_active = is_active;
    }
    if let Some(last_run) = update.last_run {
        automation.last_run = Some(last_run);
    }
    if let Some(next_run) = update.next_run {
        automation.next_run = Some(next_run);
    }
    conn.execute(
        "UPDATE automations SET name = ?2, description = ?3, kind = ?4, config = ?5,
                                is_active = ?6, last_run = ?7, next_run = ?8
         WHERE id = ?1",
        params![
            id,
            automation.name,
            automation.description,
            automation.kind,
            json_to_sql(&automation.config)?,
            automation.is_active,
            opt_ts_to_sql(automation.last_run),
            opt_ts_to_sql(automation.next_run),
        ],
    )?;
    Ok(Some(automation))
}

/// Single-statement flip, so two concurrent toggles cannot read the same
/// stale value.
pub(crate) fn toggle_automation(conn: &Connection, id: i64) -> Result<Option<Automation>> {
    let sql = format!(
        "UPDATE automations SET is_active = NOT is_active WHERE id = ?1
         RETURNING {AUTOMATION_COLS}"
    );
    Ok(conn.query_row(&sql, [id], map_automation).optional()?)
}

// -- Analytics --

const ANALYTICS_COLS: &str =
    "id, user_id, date, platform, followers, engagement, reach, posts, metrics, created_at";

fn map_analytics(row: &Row) -> rusqlite::Result<AnalyticsRow> {
    Ok(AnalyticsRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        date: get_ts(row, 2)?,
        platform: row.get(3)?,
        followers: row.get(4)?,
        engagement: row.get(5)?,
        reach: row.get(6)?,
        posts: row.get(7)?,
        metrics: get_opt_json(row, 8)?,
        created_at: get_ts(row, 9)?,
    })
}

pub(crate) fn insert_analytics(conn: &Connection, data: NewAnalyticsRow) -> Result<AnalyticsRow> {
    let now = Utc::now();
    conn.execute(
        "INSERT INTO analytics (user_id, date, platform, followers, engagement, reach, posts,
                                metrics, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            data.user_id,
            ts_to_sql(data.date),
            data.platform,
            data.followers,
            data.engagement,
            data.reach,
            data.posts,
            opt_json_to_sql(&data.metrics)?,
            ts_to_sql(now),
        ],
    )?;
    Ok(AnalyticsRow {
        id: conn.last_insert_rowid(),
        user_id: data.user_id,
        date: data.date,
        platform: data.platform,
        followers: data.followers,
        engagement: data.engagement,
        reach: data.reach,
        posts: data.posts,
        metrics: data.metrics,
        created_at: now,
    })
}

pub(crate) fn query_analytics(
    conn: &Connection,
    user_id: i64,
    platform: Option<&str>,
) -> Result<Vec<AnalyticsRow>> {
    let rows = match platform {
        Some(platform) => {
            let sql = format!(
                "SELECT {ANALYTICS_COLS} FROM analytics
                 WHERE user_id = ?1 AND platform = ?2 ORDER BY id"
            );
            let mut stmt = conn.prepare(&sql)?;
            stmt.query_map(params![user_id, platform], map_analytics)?
                .collect::<rusqlite::Result<Vec<_>>>()?
        }
        None => {
            let sql =
                format!("SELECT {ANALYTICS_COLS} FROM analytics WHERE user_id = ?1 ORDER BY id");
            let mut stmt = conn.prepare(&sql)?;
            stmt.query_map([user_id], map_analytics)?
                .collect::<rusqlite::Result<Vec<_>>>()?
        }
    };
    Ok(rows)
}

pub(crate) fn query_analytics_summary(conn: &Connection, user_id: i64) -> Result<AnalyticsSummary> {
    let (followers, engagement, reach, posts) = conn.query_row(
        "SELECT COALESCE(SUM(followers), 0), COALESCE(SUM(engagement), 0),
                COALESCE(SUM(reach), 0), COALESCE(SUM(posts), 0)
         FROM analytics WHERE user_id = ?1",
        [user_id],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
    )?;
    Ok(AnalyticsSummary::from_totals(followers, engagement, reach, posts))
}

// -- Content library --

const LIBRARY_COLS: &str =
    "id, user_id, title, body, media_url, media_type, tags, category, is_template, created_at";

fn map_library_item(row: &Row) -> rusqlite::Result<LibraryItem> {
    Ok(LibraryItem {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        body: row.get(3)?,
        media_url: row.get(4)?,
        media_type: row.get(5)?,
        tags: get_json(row, 6)?,
        category: row.get(7)?,
        is_template: row.get(8)?,
        created_at: get_ts(row, 9)?,
    })
}

pub(crate) fn insert_library_item(conn: &Connection, data: NewLibraryItem) -> Result<LibraryItem> {
    let now = Utc::now();
    conn.execute(
        "INSERT INTO content_library (user_id, title, body, media_url, media_type, tags,
                                      category, is_template, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            data.user_id,
            data.title,
            data.body,
            data.media_url,
            data.media_type,
            json_to_sql(&data.tags)?,
            data.category,
            data.is_template,
            ts_to_sql(now),
        ],
    )?;
    Ok(LibraryItem {
        id: conn.last_insert_rowid(),
        user_id: data.user_id,
        title: data.title,
        body: data.body,
        media_url: data.media_url,
        media_type: data.media_type,
        tags: data.tags,
        category: data.category,
        is_template: data.is_template,
        created_at: now,
    })
}

pub(crate) fn query_library_items(conn: &Connection, user_id: i64) -> Result<Vec<LibraryItem>> {
    let sql = format!(
        "SELECT {LIBRARY_COLS} FROM content_library WHERE user_id = ?1
         ORDER BY created_at DESC, id DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([user_id], map_library_item)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

// -- Content categories --

const CATEGORY_COLS: &str =
    "id, user_id, name, description, color, auto_queue_rule, created_at";

fn map_category(row: &Row) -> rusqlite::Result<ContentCategory> {
    Ok(ContentCategory {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        color: row.get(4)?,
        auto_queue_rule: get_opt_json(row, 5)?,
        created_at: get_ts(row, 6)?,
    })
}

pub(crate) fn insert_category(conn: &Connection, data: NewCategory) -> Result<ContentCategory> {
    let now = Utc::now();
    conn.execute(
        "INSERT INTO content_categories (user_id, name, description, color, auto_queue_rule,
                                         created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            data.user_id,
            data.name,
            data.description,
            data.color,
            opt_json_to_sql(&data.auto_queue_rule)?,
            ts_to_sql(now),
        ],
    )?;
    Ok(ContentCategory {
        id: conn.last_insert_rowid(),
        user_id: data.user_id,
        name: data.name,
        description: data.description,
        color: data.color,
        auto_queue_rule: data.auto_queue_rule,
        created_at: now,
    })
}

pub(crate) fn query_categories(conn: &Connection, user_id: i64) -> Result<Vec<ContentCategory>> {
    let sql =
        format!("SELECT {CATEGORY_COLS} FROM content_categories WHERE user_id = ?1 ORDER BY id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([user_id], map_category)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub(crate) fn update_category(
    conn: &Connection,
    id: i64,
    update: CategoryUpdate,
) -> Result<Option<ContentCategory>> {
    let sql = format!("SELECT {CATEGORY_COLS} FROM content_categories WHERE id = ?1");
    let Some(mut category) = conn.query_row(&sql, [id], map_category).optional()? else {
        return Ok(None);
    };
    if let Some(name) = update.name {
        category.name = name;
    }
    if let Some(description) = update.description {
        category.description = Some(description);
    }
    if let Some(color) = update.color {
        category.color = color;
    }
    if let Some(rule) = update.auto_queue_rule {
        category.auto_queue_rule = Some(rule);
    }
    conn.execute(
        "UPDATE content_categories SET name = ?2, description = ?3, color = ?4,
                                       auto_queue_rule = ?5
         WHERE id = ?1",
        params![
            id,
            category.name,
            category.description,
            category.color,
            opt_json_to_sql(&category.auto_queue_rule)?,
        ],
    )?;
    Ok(Some(category))
}

// -- Media library --

const MEDIA_COLS: &str = "id, user_id, filename, original_name, mime_type, size_bytes, url, \
                          tags, alt_text, created_at";

fn map_media_item(row: &Row) -> rusqlite::Result<MediaItem> {
    Ok(MediaItem {
        id: row.get(0)?,
        user_id: row.get(1)?,
        filename: row.get(2)?,
        original_name: row.get(3)?,
        mime_type: row.get(4)?,
        size_bytes: row.get(5)?,
        url: row.get(6)?,
        tags: get_json(row, 7)?,
        alt_text: row.get(8)?,
        created_at: get_ts(row, 9)?,
    })
}

pub(crate) fn insert_media_item(conn: &Connection, data: NewMediaItem) -> Result<MediaItem> {
    let now = Utc::now();
    conn.execute(
        "INSERT INTO media_library (user_id, filename, original_name, mime_type, size_bytes,
                                    url, tags, alt_text, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            data.user_id,
            data.filename,
            data.original_name,
            data.mime_type,
            data.size_bytes,
            data.url,
            json_to_sql(&data.tags)?,
            data.alt_text,
            ts_to_sql(now),
        ],
    )?;
    Ok(MediaItem {
        id: conn.last_insert_rowid(),
        user_id: data.user_id,
        filename: data.filename,
        original_name: data.original_name,
        mime_type: data.mime_type,
        size_bytes: data.size_bytes,
        url: data.url,
        tags: data.tags,
        alt_text: data.alt_text,
        created_at: now,
    })
}

pub(crate) fn query_media_items(conn: &Connection, user_id: i64) -> Result<Vec<MediaItem>> {
    let sql = format!(
        "SELECT {MEDIA_COLS} FROM media_library WHERE user_id = ?1
         ORDER BY created_at DESC, id DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([user_id], map_media_item)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub(crate) fn update_media_item(
    conn: &Connection,
    id: i64,
    update: MediaUpdate,
) -> Result<Option<MediaItem>> {
    let sql = format!("SELECT {MEDIA_COLS} FROM media_library WHERE id = ?1");
    let Some(mut item) = conn.query_row(&sql, [id], map_media_item).optional()? else {
        return Ok(None);
    };
    if let Some(tags) = update.tags {
        item.tags = tags;
    }
    if let Some(alt_text) = update.alt_text {
        item.alt_text = Some(alt_text);
    }
    conn.execute(
        "UPDATE media_library SET tags = ?2, alt_text = ?3 WHERE id = ?1",
        params![id, json_to_sql(&item.tags)?, item.alt_text],
    )?;
    Ok(Some(item))
}

// -- Post comments --

const COMMENT_COLS: &str = "id, post_id, user_id, content, is_internal, created_at";

fn map_comment(row: &Row) -> rusqlite::Result<PostComment> {
    Ok(PostComment {
        id: row.get(0)?,
        post_id: row.get(1)?,
        user_id: row.get(2)?,
        content: row.get(3)?,
        is_internal: row.get(4)?,
        created_at: get_ts(row, 5)?,
    })
}

pub(crate) fn insert_comment(conn: &Connection, data: NewComment) -> Result<PostComment> {
    let now = Utc::now();
    conn.execute(
        "INSERT INTO post_comments (post_id, user_id, content, is_internal, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            data.post_id,
            data.user_id,
            data.content,
            data.is_internal,
            ts_to_sql(now),
        ],
    )?;
    Ok(PostComment {
        id: conn.last_insert_rowid(),
        post_id: data.post_id,
        user_id: data.user_id,
        content: data.content,
        is_internal: data.is_internal,
        created_at: now,
    })
}

pub(crate) fn query_comments(conn: &Connection, post_id: i64) -> Result<Vec<PostComment>> {
    let sql = format!("SELECT {COMMENT_COLS} FROM post_comments WHERE post_id = ?1 ORDER BY id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([post_id], map_comment)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

// -- Activities --

const ACTIVITY_COLS: &str = "id, user_id, kind, description, platform, metadata, created_at";

fn map_activity(row: &Row) -> rusqlite::Result<Activity> {
    Ok(Activity {
        id: row.get(0)?,
        user_id: row.get(1)?,
        kind: row.get(2)?,
        description: row.get(3)?,
        platform: row.get(4)?,
        metadata: get_opt_json(row, 5)?,
        created_at: get_ts(row, 6)?,
    })
}

pub(crate) fn insert_activity(conn: &Connection, data: NewActivity) -> Result<Activity> {
    let now = Utc::now();
    conn.execute(
        "INSERT INTO activities (user_id, kind, description, platform, metadata, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            data.user_id,
            data.kind,
            data.description,
            data.platform,
            opt_json_to_sql(&data.metadata)?,
            ts_to_sql(now),
        ],
    )?;
    Ok(Activity {
        id: conn.last_insert_rowid(),
        user_id: data.user_id,
        kind: data.kind,
        description: data.description,
        platform: data.platform,
        metadata: data.metadata,
        created_at: now,
    })
}

pub(crate) fn query_recent_activities(
    conn: &Connection,
    user_id: i64,
    limit: usize,
) -> Result<Vec<Activity>> {
    let sql = format!(
        "SELECT {ACTIVITY_COLS} FROM activities WHERE user_id = ?1
         ORDER BY created_at DESC, id DESC LIMIT ?2"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![user_id, limit as i64], map_activity)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Post plus its audit record in one transaction: both or neither.
pub(crate) fn insert_post_logged(
    conn: &Connection,
    data: NewPost,
    activity: NewActivity,
) -> Result<Post> {
    let tx = conn.unchecked_transaction()?;
    let post = insert_post(&tx, data)?;
    insert_activity(&tx, activity)?;
    tx.commit()?;
    Ok(post)
}
