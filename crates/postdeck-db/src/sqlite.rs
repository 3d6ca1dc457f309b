use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use rusqlite::Connection;

use postdeck_types::models::{
    Activity, AnalyticsRow, AnalyticsSummary, Automation, AutomationUpdate, CategoryUpdate,
    ContentCategory, LibraryItem, MediaItem, MediaUpdate, NewActivity, NewAnalyticsRow,
    NewAutomation, NewCategory, NewComment, NewLibraryItem, NewMediaItem, NewPost,
    NewSocialAccount, NewUser, Post, PostComment, PostStatus, PostUpdate, SocialAccount, User,
    UserProfileUpdate,
};

use crate::Database;
use crate::queries;
use crate::storage::Storage;

/// SQLite-backed store. Same observable behavior as `MemStorage`; the two
/// are interchangeable behind the `Storage` trait.
pub struct SqliteStorage {
    db: Arc<Database>,
}

impl SqliteStorage {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            db: Arc::new(Database::open(path)?),
        })
    }

    /// Private throwaway database, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            db: Arc::new(Database::open_in_memory()?),
        })
    }

    // Blocking rusqlite work runs off the async runtime. Each closure holds
    // the connection lock for its whole duration, which is what makes
    // multi-step operations (read-merge-write updates) atomic.

    async fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || db.with_conn(f)).await?
    }

    async fn write<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || db.with_conn_mut(f)).await?
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn get_user(&self, id: i64) -> Result<Option<User>> {
        self.read(move |conn| queries::query_user(conn, id)).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = email.to_string();
        self.read(move |conn| queries::query_user_by_email(conn, &email))
            .await
    }

    async fn get_user_by_external_id(&self, external_id: &str) -> Result<Option<User>> {
        let external_id = external_id.to_string();
        self.read(move |conn| queries::query_user_by_external_id(conn, &external_id))
            .await
    }

    async fn get_user_by_username(&self, _username: &str) -> Result<Option<User>> {
        Ok(None)
    }

    async fn create_user(&self, data: NewUser) -> Result<User> {
        self.write(move |conn| queries::insert_user(conn, data)).await
    }

    async fn update_user_profile(
        &self,
        id: i64,
        update: UserProfileUpdate,
    ) -> Result<Option<User>> {
        self.write(move |conn| queries::update_user_profile(conn, id, update))
            .await
    }

    async fn social_accounts(&self, user_id: i64) -> Result<Vec<SocialAccount>> {
        self.read(move |conn| queries::query_accounts(conn, user_id))
            .await
    }

    async fn upsert_social_account(&self, data: NewSocialAccount) -> Result<SocialAccount> {
        self.write(move |conn| queries::upsert_account(conn, data))
            .await
    }

    async fn set_account_connected(
        &self,
        id: i64,
        is_connected: bool,
    ) -> Result<Option<SocialAccount>> {
        self.write(move |conn| queries::set_account_connected(conn, id, is_connected))
            .await
    }

    async fn delete_social_account(&self, id: i64) -> Result<bool> {
        self.write(move |conn| queries::delete_by_id(conn, "social_accounts", id))
            .await
    }

    async fn posts(&self, user_id: i64) -> Result<Vec<Post>> {
        self.read(move |conn| queries::query_posts(conn, user_id)).await
    }

    async fn posts_by_status(&self, user_id: i64, status: PostStatus) -> Result<Vec<Post>> {
        self.read(move |conn| queries::query_posts_by_status(conn, user_id, status))
            .await
    }

    async fn create_post(&self, data: NewPost) -> Result<Post> {
        self.write(move |conn| queries::insert_post(conn, data)).await
    }

    async fn create_post_logged(&self, data: NewPost, activity: NewActivity) -> Result<Post> {
        self.write(move |conn| queries::insert_post_logged(conn, data, activity))
            .await
    }

    async fn update_post(&self, id: i64, update: PostUpdate) -> Result<Option<Post>> {
        self.write(move |conn| queries::update_post(conn, id, update))
            .await
    }

    async fn delete_post(&self, id: i64) -> Result<bool> {
        self.write(move |conn| queries::delete_by_id(conn, "posts", id))
            .await
    }

    async fn upcoming_posts(&self, user_id: i64) -> Result<Vec<Post>> {
        self.read(move |conn| queries::query_upcoming_posts(conn, user_id))
            .await
    }

    async fn top_posts(&self, user_id: i64, limit: usize) -> Result<Vec<Post>> {
        self.read(move |conn| queries::query_top_posts(conn, user_id, limit))
            .await
    }

    async fn automations(&self, user_id: i64) -> Result<Vec<Automation>> {
        self.read(move |conn| queries::query_automations(conn, user_id))
            .await
    }

    async fn create_automation(&self, data: NewAutomation) -> Result<Automation> {
        self.write(move |conn| queries::insert_automation(conn, data))
            .await
    }

    async fn update_automation(
        &self,
        id: i64,
        update: AutomationUpdate,
    ) -> Result<Option<Automation>> {
        self.write(move |conn| queries::update_automation(conn, id, update))
            .await
    }

    async fn toggle_automation(&self, id: i64) -> Result<Option<Automation>> {
        self.write(move |conn| queries::toggle_automation(conn, id))
            .await
    }

    async fn analytics(&self, user_id: i64, platform: Option<&str>) -> Result<Vec<AnalyticsRow>> {
        let platform = platform.map(str::to_string);
        self.read(move |conn| queries::query_analytics(conn, user_id, platform.as_deref()))
            .await
    }

    async fn create_analytics(&self, data: NewAnalyticsRow) -> Result<AnalyticsRow> {
        self.write(move |conn| queries::insert_analytics(conn, data))
            .await
    }

    async fn analytics_summary(&self, user_id: i64) -> Result<AnalyticsSummary> {
        self.read(move |conn| queries::query_analytics_summary(conn, user_id))
            .await
    }

    async fn library_items(&self, user_id: i64) -> Result<Vec<LibraryItem>> {
        self.read(move |conn| queries::query_library_items(conn, user_id))
            .await
    }

    async fn create_library_item(&self, data: NewLibraryItem) -> Result<LibraryItem> {
        self.write(move |conn| queries::insert_library_item(conn, data))
            .await
    }

    async fn categories(&self, user_id: i64) -> Result<Vec<ContentCategory>> {
        self.read(move |conn| queries::query_categories(conn, user_id))
            .await
    }

    async fn create_category(&self, data: NewCategory) -> Result<ContentCategory> {
        self.write(move |conn| queries::insert_category(conn, data))
            .await
    }

    async fn update_category(
        &self,
        id: i64,
        update: CategoryUpdate,
    ) -> Result<Option<ContentCategory>> {
        self.write(move |conn| queries::update_category(conn, id, update))
            .await
    }

    async fn delete_category(&self, id: i64) -> Result<bool> {
        self.write(move |conn| queries::delete_by_id(conn, "content_categories", id))
            .await
    }

    async fn media_items(&self, user_id: i64) -> Result<Vec<MediaItem>> {
        self.read(move |conn| queries::query_media_items(conn, user_id))
            .await
    }

    async fn create_media_item(&self, data: NewMediaItem) -> Result<MediaItem> {
        self.write(move |conn| queries::insert_media_item(conn, data))
            .await
    }

    async fn update_media_item(&self, id: i64, update: MediaUpdate) -> Result<Option<MediaItem>> {
        self.write(move |conn| queries::update_media_item(conn, id, update))
            .await
    }

    async fn delete_media_item(&self, id: i64) -> Result<bool> {
        self.write(move |conn| queries::delete_by_id(conn, "media_library", id))
            .await
    }

    async fn post_comments(&self, post_id: i64) -> Result<Vec<PostComment>> {
        self.read(move |conn| queries::query_comments(conn, post_id))
            .await
    }

    async fn create_comment(&self, data: NewComment) -> Result<PostComment> {
        self.write(move |conn| queries::insert_comment(conn, data))
            .await
    }

    async fn recent_activities(&self, user_id: i64, limit: usize) -> Result<Vec<Activity>> {
        self.read(move |conn| queries::query_recent_activities(conn, user_id, limit))
            .await
    }

    async fn create_activity(&self, data: NewActivity) -> Result<Activity> {
        self.write(move |conn| queries::insert_activity(conn, data))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{new_account, new_analytics, new_automation, new_post, new_user};
    use chrono::{Duration, Utc};
    use postdeck_types::models::EngagementMetrics;

    fn store() -> SqliteStorage {
        SqliteStorage::open_in_memory().unwrap()
    }

    #[tokio::test]
    async fn ids_survive_deletion_without_reuse() {
        let store = store();
        let user = store.create_user(new_user("a@b.c")).await.unwrap();

        let first = store
            .upsert_social_account(new_account(user.id, "twitter", "111"))
            .await
            .unwrap();
        assert!(store.delete_social_account(first.id).await.unwrap());

        let second = store
            .upsert_social_account(new_account(user.id, "twitter", "222"))
            .await
            .unwrap();
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn listings_are_scoped_to_the_owner() {
        let store = store();
        let alice = store.create_user(new_user("alice@x.y")).await.unwrap();
        let bob = store.create_user(new_user("bob@x.y")).await.unwrap();

        store.create_post(new_post(alice.id, "mine")).await.unwrap();
        store.create_post(new_post(bob.id, "theirs")).await.unwrap();

        let posts = store.posts(alice.id).await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].content, "mine");
    }

    #[tokio::test]
    async fn create_then_list_round_trips_every_column() {
        let store = store();
        let user = store.create_user(new_user("a@b.c")).await.unwrap();

        let mut data = new_post(user.id, "hello");
        data.platforms = vec!["facebook".into(), "linkedin".into()];
        data.media_refs = Some(serde_json::json!({ "ids": [1, 2] }));
        // Nanosecond precision must survive the TEXT column round trip.
        data.scheduled_at = Some(Utc::now() + Duration::hours(4));
        let created = store.create_post(data).await.unwrap();

        let posts = store.posts(user.id).await.unwrap();
        assert_eq!(posts.len(), 1);
        let post = &posts[0];
        assert_eq!(post.id, created.id);
        assert_eq!(post.status, PostStatus::Draft);
        assert_eq!(post.platforms, vec!["facebook", "linkedin"]);
        assert_eq!(post.media_refs, created.media_refs);
        assert_eq!(post.created_at, created.created_at);
        assert_eq!(post.scheduled_at, created.scheduled_at);
        assert!(post.published_at.is_none());
    }

    #[tokio::test]
    async fn status_listing_matches_full_listing_subset() {
        let store = store();
        let user = store.create_user(new_user("a@b.c")).await.unwrap();

        store.create_post(new_post(user.id, "draft")).await.unwrap();
        let mut scheduled = new_post(user.id, "scheduled");
        scheduled.status = PostStatus::Scheduled;
        scheduled.scheduled_at = Some(Utc::now() + Duration::hours(2));
        store.create_post(scheduled).await.unwrap();

        let by_status = store
            .posts_by_status(user.id, PostStatus::Scheduled)
            .await
            .unwrap();
        assert_eq!(by_status.len(), 1);
        assert!(by_status.iter().all(|p| p.status == PostStatus::Scheduled));

        let all = store.posts(user.id).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn update_merges_and_missing_id_is_none() {
        let store = store();
        let user = store.create_user(new_user("a@b.c")).await.unwrap();
        let post = store.create_post(new_post(user.id, "before")).await.unwrap();

        let updated = store
            .update_post(
                post.id,
                PostUpdate {
                    content: Some("after".into()),
                    status: Some(PostStatus::Review),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.content, "after");
        assert_eq!(updated.status, PostStatus::Review);
        assert_eq!(updated.platforms, post.platforms);
        assert_eq!(updated.created_at, post.created_at);

        assert!(
            store
                .update_post(999_999, PostUpdate::default())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn upcoming_posts_come_back_soonest_first() {
        let store = store();
        let user = store.create_user(new_user("a@b.c")).await.unwrap();
        let now = Utc::now();

        for hours in [72, 6, 30] {
            let mut post = new_post(user.id, "queued");
            post.status = PostStatus::Scheduled;
            post.scheduled_at = Some(now + Duration::hours(hours));
            store.create_post(post).await.unwrap();
        }
        let mut past = new_post(user.id, "missed");
        past.status = PostStatus::Scheduled;
        past.scheduled_at = Some(now - Duration::hours(1));
        store.create_post(past).await.unwrap();

        let upcoming = store.upcoming_posts(user.id).await.unwrap();
        let hours: Vec<i64> = upcoming
            .iter()
            .map(|p| (p.scheduled_at.unwrap() - now).num_hours())
            .collect();
        assert_eq!(hours, vec![6, 30, 72]);
    }

    #[tokio::test]
    async fn top_posts_order_by_engagement_reach() {
        let store = store();
        let user = store.create_user(new_user("a@b.c")).await.unwrap();

        for reach in [10, 900, 300] {
            let post = store.create_post(new_post(user.id, "p")).await.unwrap();
            store
                .update_post(
                    post.id,
                    PostUpdate {
                        status: Some(PostStatus::Published),
                        engagement: Some(EngagementMetrics {
                            likes: 0,
                            shares: 0,
                            comments: 0,
                            reach,
                        }),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
        }

        let top = store.top_posts(user.id, 2).await.unwrap();
        let reaches: Vec<i64> = top
            .iter()
            .map(|p| p.engagement.as_ref().unwrap().reach)
            .collect();
        assert_eq!(reaches, vec![900, 300]);
    }

    #[tokio::test]
    async fn toggle_is_atomic_and_idempotent_in_pairs() {
        let store = store();
        let user = store.create_user(new_user("a@b.c")).await.unwrap();
        let automation = store
            .create_automation(new_automation(user.id))
            .await
            .unwrap();

        let once = store.toggle_automation(automation.id).await.unwrap().unwrap();
        assert!(!once.is_active);
        let twice = store.toggle_automation(automation.id).await.unwrap().unwrap();
        assert_eq!(twice.is_active, automation.is_active);

        assert!(store.toggle_automation(77).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn summary_matches_the_memory_store_arithmetic() {
        let store = store();
        let user = store.create_user(new_user("a@b.c")).await.unwrap();

        store
            .create_analytics(new_analytics(user.id, 10, 1, 0))
            .await
            .unwrap();
        store
            .create_analytics(new_analytics(user.id, 20, 4, 100))
            .await
            .unwrap();

        let summary = store.analytics_summary(user.id).await.unwrap();
        assert_eq!(summary.total_followers, 30);
        assert_eq!(summary.reach_this_month, 100);
        assert_eq!(summary.engagement_rate, 5.0);

        let empty = store.analytics_summary(user.id + 1).await.unwrap();
        assert_eq!(empty.engagement_rate, 0.0);
    }

    #[tokio::test]
    async fn analytics_listing_filters_by_platform() {
        let store = store();
        let user = store.create_user(new_user("a@b.c")).await.unwrap();

        let mut twitter = new_analytics(user.id, 10, 1, 50);
        twitter.platform = "twitter".into();
        store.create_analytics(twitter).await.unwrap();
        let mut instagram = new_analytics(user.id, 20, 2, 60);
        instagram.platform = "instagram".into();
        store.create_analytics(instagram).await.unwrap();

        assert_eq!(store.analytics(user.id, None).await.unwrap().len(), 2);
        let only = store.analytics(user.id, Some("twitter")).await.unwrap();
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].platform, "twitter");
    }

    #[tokio::test]
    async fn upsert_updates_existing_account_row() {
        let store = store();
        let user = store.create_user(new_user("a@b.c")).await.unwrap();

        let first = store
            .upsert_social_account(new_account(user.id, "linkedin", "abc"))
            .await
            .unwrap();
        let mut again = new_account(user.id, "linkedin", "abc");
        again.account_name = "Acme Inc".into();
        again.is_connected = false;
        let second = store.upsert_social_account(again).await.unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.account_name, "Acme Inc");
        assert!(!second.is_connected);
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(store.social_accounts(user.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn foreign_key_violations_surface_as_errors() {
        let store = store();
        // No such user: the insert must fail loudly, not silently succeed.
        let result = store.create_post(new_post(12345, "orphan")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn deleting_a_post_removes_its_comments() {
        let store = store();
        let user = store.create_user(new_user("a@b.c")).await.unwrap();
        let post = store.create_post(new_post(user.id, "p")).await.unwrap();
        store
            .create_comment(postdeck_types::models::NewComment {
                post_id: post.id,
                user_id: user.id,
                content: "looks good".into(),
                is_internal: true,
            })
            .await
            .unwrap();

        assert!(store.delete_post(post.id).await.unwrap());
        assert!(store.post_comments(post.id).await.unwrap().is_empty());
        assert!(!store.delete_post(post.id).await.unwrap());
    }

    #[tokio::test]
    async fn logged_post_creation_writes_both_rows() {
        let store = store();
        let user = store.create_user(new_user("a@b.c")).await.unwrap();

        store
            .create_post_logged(
                new_post(user.id, "hello"),
                NewActivity {
                    user_id: user.id,
                    kind: "post_created".into(),
                    description: "Created a post".into(),
                    platform: None,
                    metadata: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(store.posts(user.id).await.unwrap().len(), 1);
        let activities = store.recent_activities(user.id, 10).await.unwrap();
        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].kind, "post_created");
    }

    #[tokio::test]
    async fn logged_post_creation_rolls_back_on_failure() {
        let store = store();
        let user = store.create_user(new_user("a@b.c")).await.unwrap();

        // Activity references a missing user, so the whole unit must fail
        // and the post must not be persisted either.
        let result = store
            .create_post_logged(
                new_post(user.id, "hello"),
                NewActivity {
                    user_id: 999_999,
                    kind: "post_created".into(),
                    description: "Created a post".into(),
                    platform: None,
                    metadata: None,
                },
            )
            .await;

        assert!(result.is_err());
        assert!(store.posts(user.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_email_is_a_backend_error() {
        let store = store();
        store.create_user(new_user("same@x.y")).await.unwrap();
        assert!(store.create_user(new_user("same@x.y")).await.is_err());
    }

    #[tokio::test]
    async fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("postdeck.db");

        let user_id = {
            let store = SqliteStorage::open(&path).unwrap();
            let user = store.create_user(new_user("a@b.c")).await.unwrap();
            store.create_post(new_post(user.id, "kept")).await.unwrap();
            user.id
        };

        let store = SqliteStorage::open(&path).unwrap();
        let posts = store.posts(user_id).await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].content, "kept");
    }
}
