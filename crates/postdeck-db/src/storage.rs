use anyhow::Result;
use async_trait::async_trait;

use postdeck_types::models::{
    Activity, AnalyticsRow, AnalyticsSummary, Automation, AutomationUpdate, CategoryUpdate,
    ContentCategory, LibraryItem, MediaItem, MediaUpdate, NewActivity, NewAnalyticsRow,
    NewAutomation, NewCategory, NewComment, NewLibraryItem, NewMediaItem, NewPost,
    NewSocialAccount, NewUser, Post, PostComment, PostStatus, PostUpdate, SocialAccount, User,
    UserProfileUpdate,
};

/// The persistence contract for the whole backend. Every user-owned listing
/// is scoped by `user_id`; there is no global listing.
///
/// Absence is `Ok(None)` (or an empty list), never an error. `Err` means a
/// genuine backend failure (I/O, constraint violation) and is the caller's
/// job to translate into an HTTP status.
#[async_trait]
pub trait Storage: Send + Sync {
    // -- Users --

    async fn get_user(&self, id: i64) -> Result<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn get_user_by_external_id(&self, external_id: &str) -> Result<Option<User>>;
    /// Username lookups predate email-based accounts and no longer resolve.
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn create_user(&self, data: NewUser) -> Result<User>;
    async fn update_user_profile(
        &self,
        id: i64,
        update: UserProfileUpdate,
    ) -> Result<Option<User>>;

    // -- Social accounts --

    async fn social_accounts(&self, user_id: i64) -> Result<Vec<SocialAccount>>;
    /// Reconnecting the same (user, platform, account) updates the existing
    /// row in place instead of creating a duplicate.
    async fn upsert_social_account(&self, data: NewSocialAccount) -> Result<SocialAccount>;
    async fn set_account_connected(
        &self,
        id: i64,
        is_connected: bool,
    ) -> Result<Option<SocialAccount>>;
    async fn delete_social_account(&self, id: i64) -> Result<bool>;

    // -- Posts --

    async fn posts(&self, user_id: i64) -> Result<Vec<Post>>;
    async fn posts_by_status(&self, user_id: i64, status: PostStatus) -> Result<Vec<Post>>;
    async fn create_post(&self, data: NewPost) -> Result<Post>;
    /// Create a post and its audit record as one unit of work: either both
    /// are persisted or neither is.
    async fn create_post_logged(&self, data: NewPost, activity: NewActivity) -> Result<Post>;
    async fn update_post(&self, id: i64, update: PostUpdate) -> Result<Option<Post>>;
    async fn delete_post(&self, id: i64) -> Result<bool>;
    /// Scheduled posts with a future `scheduled_at`, soonest first.
    async fn upcoming_posts(&self, user_id: i64) -> Result<Vec<Post>>;
    /// Published posts with engagement data, highest reach first.
    async fn top_posts(&self, user_id: i64, limit: usize) -> Result<Vec<Post>>;

    // -- Automations --

    async fn automations(&self, user_id: i64) -> Result<Vec<Automation>>;
    async fn create_automation(&self, data: NewAutomation) -> Result<Automation>;
    async fn update_automation(
        &self,
        id: i64,
        update: AutomationUpdate,
    ) -> Result<Option<Automation>>;
    /// Atomically flips `is_active`. No-op returning `None` if absent.
    async fn toggle_automation(&self, id: i64) -> Result<Option<Automation>>;

    // -- Analytics --

    async fn analytics(&self, user_id: i64, platform: Option<&str>) -> Result<Vec<AnalyticsRow>>;
    async fn create_analytics(&self, data: NewAnalyticsRow) -> Result<AnalyticsRow>;
    async fn analytics_summary(&self, user_id: i64) -> Result<AnalyticsSummary>;

    // -- Content library --

    async fn library_items(&self, user_id: i64) -> Result<Vec<LibraryItem>>;
    async fn create_library_item(&self, data: NewLibraryItem) -> Result<LibraryItem>;

    // -- Content categories --

    async fn categories(&self, user_id: i64) -> Result<Vec<ContentCategory>>;
    async fn create_category(&self, data: NewCategory) -> Result<ContentCategory>;
    async fn update_category(
        &self,
        id: i64,
        update: CategoryUpdate,
    ) -> Result<Option<ContentCategory>>;
    async fn delete_category(&self, id: i64) -> Result<bool>;

    // -- Media library --

    async fn media_items(&self, user_id: i64) -> Result<Vec<MediaItem>>;
    async fn create_media_item(&self, data: NewMediaItem) -> Result<MediaItem>;
    async fn update_media_item(&self, id: i64, update: MediaUpdate) -> Result<Option<MediaItem>>;
    async fn delete_media_item(&self, id: i64) -> Result<bool>;

    // -- Post comments --

    async fn post_comments(&self, post_id: i64) -> Result<Vec<PostComment>>;
    async fn create_comment(&self, data: NewComment) -> Result<PostComment>;

    // -- Activities --

    async fn recent_activities(&self, user_id: i64, limit: usize) -> Result<Vec<Activity>>;
    async fn create_activity(&self, data: NewActivity) -> Result<Activity>;
}
