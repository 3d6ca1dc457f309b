use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, thiserror::Error)]
#[error("unrecognized value: {0}")]
pub struct ParseEnumError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    #[default]
    TeamMember,
    Client,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::TeamMember => "team_member",
            UserRole::Client => "client",
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "team_member" => Ok(UserRole::TeamMember),
            "client" => Ok(UserRole::Client),
            other => Err(ParseEnumError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Review,
    Approved,
    Scheduled,
    Published,
    Failed,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Review => "review",
            PostStatus::Approved => "approved",
            PostStatus::Scheduled => "scheduled",
            PostStatus::Published => "published",
            PostStatus::Failed => "failed",
        }
    }
}

impl std::str::FromStr for PostStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PostStatus::Draft),
            "review" => Ok(PostStatus::Review),
            "approved" => Ok(PostStatus::Approved),
            "scheduled" => Ok(PostStatus::Scheduled),
            "published" => Ok(PostStatus::Published),
            "failed" => Ok(PostStatus::Failed),
            other => Err(ParseEnumError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub avatar_url: Option<String>,
    /// Identity-provider subject, set when the account came from an
    /// external sign-in rather than email/password registration.
    pub external_id: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub role: UserRole,
}

/// Mutable profile fields. Identity (id, email, external_id) never changes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserProfileUpdate {
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub password_hash: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialAccount {
    pub id: i64,
    pub user_id: i64,
    pub platform: String,
    pub account_name: String,
    /// Platform-native identifier for the connected account.
    pub account_id: String,
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    pub is_connected: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSocialAccount {
    #[serde(default)]
    pub user_id: i64,
    pub platform: String,
    pub account_name: String,
    pub account_id: String,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_true")]
    pub is_connected: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentCategory {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub auto_queue_rule: Option<Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    #[serde(default)]
    pub user_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub auto_queue_rule: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub auto_queue_rule: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementMetrics {
    #[serde(default)]
    pub likes: i64,
    #[serde(default)]
    pub shares: i64,
    #[serde(default)]
    pub comments: i64,
    #[serde(default)]
    pub reach: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub category_id: Option<i64>,
    pub assigned_to: Option<i64>,
    pub content: String,
    pub media_refs: Option<Value>,
    pub platforms: Vec<String>,
    pub status: PostStatus,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub approved_by: Option<i64>,
    pub engagement: Option<EngagementMetrics>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPost {
    #[serde(default)]
    pub user_id: i64,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub assigned_to: Option<i64>,
    pub content: String,
    #[serde(default)]
    pub media_refs: Option<Value>,
    pub platforms: Vec<String>,
    #[serde(default)]
    pub status: PostStatus,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// Partial update. Like the other `*Update` shapes, `None` means "leave
/// as is", so a nullable column such as `scheduled_at` cannot be cleared
/// through an update, only overwritten.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostUpdate {
    pub category_id: Option<i64>,
    pub assigned_to: Option<i64>,
    pub content: Option<String>,
    pub media_refs: Option<Value>,
    pub platforms: Option<Vec<String>>,
    pub status: Option<PostStatus>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub approved_by: Option<i64>,
    pub engagement: Option<EngagementMetrics>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostComment {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub content: String,
    /// Internal notes are visible to the team only, not to clients.
    pub is_internal: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewComment {
    #[serde(default)]
    pub post_id: i64,
    #[serde(default)]
    pub user_id: i64,
    pub content: String,
    #[serde(default = "default_true")]
    pub is_internal: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: i64,
    pub user_id: i64,
    pub filename: String,
    pub original_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub url: String,
    pub tags: Vec<String>,
    pub alt_text: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMediaItem {
    #[serde(default)]
    pub user_id: i64,
    /// Stored object key. Left empty by clients; the server assigns one.
    #[serde(default)]
    pub filename: String,
    pub original_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub url: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub alt_text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaUpdate {
    pub tags: Option<Vec<String>>,
    pub alt_text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Automation {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Free-text tag, e.g. "welcome_series" or "auto_queue".
    pub kind: String,
    pub config: Value,
    pub is_active: bool,
    pub trigger_count: i64,
    pub last_run: Option<DateTime<Utc>>,
    pub next_run: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAutomation {
    #[serde(default)]
    pub user_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub kind: String,
    #[serde(default = "default_config")]
    pub config: Value,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AutomationUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub kind: Option<String>,
    pub config: Option<Value>,
    pub is_active: Option<bool>,
    pub last_run: Option<DateTime<Utc>>,
    pub next_run: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsRow {
    pub id: i64,
    pub user_id: i64,
    pub date: DateTime<Utc>,
    pub platform: String,
    pub followers: i64,
    pub engagement: i64,
    pub reach: i64,
    pub posts: i64,
    pub metrics: Option<Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAnalyticsRow {
    #[serde(default)]
    pub user_id: i64,
    pub date: DateTime<Utc>,
    pub platform: String,
    #[serde(default)]
    pub followers: i64,
    #[serde(default)]
    pub engagement: i64,
    #[serde(default)]
    pub reach: i64,
    #[serde(default)]
    pub posts: i64,
    #[serde(default)]
    pub metrics: Option<Value>,
}

/// Aggregate over a user's analytics rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub total_followers: i64,
    /// Engagement as a percentage of reach, rounded to one decimal.
    pub engagement_rate: f64,
    pub posts_this_month: i64,
    pub reach_this_month: i64,
}

impl AnalyticsSummary {
    /// Both stores derive the summary from the same totals so their
    /// arithmetic cannot drift apart.
    pub fn from_totals(followers: i64, engagement: i64, reach: i64, posts: i64) -> Self {
        let engagement_rate = if reach > 0 {
            ((engagement as f64 / reach as f64) * 1000.0).round() / 10.0
        } else {
            0.0
        };
        Self {
            total_followers: followers,
            engagement_rate,
            posts_this_month: posts,
            reach_this_month: reach,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryItem {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub body: Option<String>,
    pub media_url: Option<String>,
    pub media_type: Option<String>,
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub is_template: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewLibraryItem {
    #[serde(default)]
    pub user_id: i64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub is_template: bool,
}

/// Append-only audit record. Never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: i64,
    pub user_id: i64,
    pub kind: String,
    pub description: String,
    pub platform: Option<String>,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewActivity {
    #[serde(default)]
    pub user_id: i64,
    pub kind: String,
    pub description: String,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

fn default_true() -> bool {
    true
}

fn default_color() -> String {
    "#3b82f6".to_string()
}

fn default_config() -> Value {
    Value::Object(serde_json::Map::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_post_applies_declared_defaults() {
        let post: NewPost = serde_json::from_str(
            r#"{"content": "hello", "platforms": ["facebook"]}"#,
        )
        .unwrap();

        assert_eq!(post.status, PostStatus::Draft);
        assert!(post.scheduled_at.is_none());
        assert!(post.media_refs.is_none());
    }

    #[test]
    fn new_post_rejects_missing_required_fields() {
        let result = serde_json::from_str::<NewPost>(r#"{"platforms": []}"#);
        assert!(result.is_err());

        let result = serde_json::from_str::<NewPost>(r#"{"content": 42, "platforms": []}"#);
        assert!(result.is_err());
    }

    #[test]
    fn new_account_defaults_to_connected() {
        let account: NewSocialAccount = serde_json::from_str(
            r#"{"platform": "twitter", "account_name": "x", "account_id": "123"}"#,
        )
        .unwrap();
        assert!(account.is_connected);
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            PostStatus::Draft,
            PostStatus::Review,
            PostStatus::Approved,
            PostStatus::Scheduled,
            PostStatus::Published,
            PostStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<PostStatus>().unwrap(), status);
        }
        assert!("deleted".parse::<PostStatus>().is_err());
    }
}
