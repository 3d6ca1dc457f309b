use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::json;

use postdeck_types::models::{
    Activity, AnalyticsRow, AnalyticsSummary, Automation, AutomationUpdate, CategoryUpdate,
    ContentCategory, EngagementMetrics, LibraryItem, MediaItem, MediaUpdate, NewActivity,
    NewAnalyticsRow, NewAutomation, NewCategory, NewComment, NewLibraryItem, NewMediaItem,
    NewPost, NewSocialAccount, NewUser, Post, PostComment, PostStatus, PostUpdate, SocialAccount,
    User, UserProfileUpdate,
};

use crate::storage::Storage;

/// One indexed collection per entity type with a monotonic id counter.
/// Ids are never reused, even after deletion.
struct Table<T> {
    rows: HashMap<i64, T>,
    next_id: i64,
}

impl<T: Clone> Table<T> {
    fn new() -> Self {
        Self {
            rows: HashMap::new(),
            next_id: 1,
        }
    }

    fn insert_with(&mut self, build: impl FnOnce(i64) -> T) -> T {
        let id = self.next_id;
        self.next_id += 1;
        let row = build(id);
        self.rows.insert(id, row.clone());
        row
    }

    fn filter(&self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        self.rows.values().filter(|r| pred(r)).cloned().collect()
    }
}

struct MemInner {
    users: Table<User>,
    accounts: Table<SocialAccount>,
    categories: Table<ContentCategory>,
    posts: Table<Post>,
    comments: Table<PostComment>,
    media: Table<MediaItem>,
    automations: Table<Automation>,
    analytics: Table<AnalyticsRow>,
    library: Table<LibraryItem>,
    activities: Table<Activity>,
}

/// Process-local fallback store. Not persistent; data is lost on restart.
///
/// The whole store sits behind one mutex, so every operation is atomic with
/// respect to every other. That is what makes the memory and SQLite stores
/// interchangeable under concurrent handlers.
pub struct MemStorage {
    inner: Mutex<MemInner>,
}

impl MemStorage {
    /// Empty store. Tests use this so suites get isolated instances.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MemInner {
                users: Table::new(),
                accounts: Table::new(),
                categories: Table::new(),
                posts: Table::new(),
                comments: Table::new(),
                media: Table::new(),
                automations: Table::new(),
                analytics: Table::new(),
                library: Table::new(),
                activities: Table::new(),
            }),
        }
    }

    /// Store pre-populated with development fixtures so the dashboard is
    /// not empty when no database is configured.
    pub fn demo() -> Self {
        let store = Self::new();
        store.seed();
        store
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemInner>> {
        self.inner
            .lock()
            .map_err(|e| anyhow::anyhow!("store lock poisoned: {}", e))
    }

    fn seed(&self) {
        let Ok(mut inner) = self.lock() else {
            return;
        };
        let now = Utc::now();

        let user = inner.users.insert_with(|id| User {
            id,
            email: "demo@postdeck.dev".into(),
            name: "Demo Agency".into(),
            // Not a usable login; the demo account is for browsing only.
            password_hash: "!".into(),
            avatar_url: None,
            external_id: None,
            role: postdeck_types::models::UserRole::Admin,
            created_at: now - Duration::days(30),
        });

        for (platform, name) in [("twitter", "@demoagency"), ("instagram", "demo.agency")] {
            inner.accounts.insert_with(|id| SocialAccount {
                id,
                user_id: user.id,
                platform: platform.into(),
                account_name: name.into(),
                account_id: format!("demo-{platform}"),
                access_token: None,
                is_connected: true,
                created_at: now - Duration::days(20),
            });
        }

        let published = [
            ("Launch week recap: what we shipped and what we learned.", 4200),
            ("Behind the scenes of our spring campaign shoot.", 1850),
        ];
        for (content, reach) in published {
            inner.posts.insert_with(|id| Post {
                id,
                user_id: user.id,
                category_id: None,
                assigned_to: None,
                content: content.into(),
                media_refs: None,
                platforms: vec!["twitter".into(), "instagram".into()],
                status: PostStatus::Published,
                scheduled_at: None,
                published_at: Some(now - Duration::days(3)),
                approved_at: None,
                approved_by: None,
                engagement: Some(EngagementMetrics {
                    likes: reach / 20,
                    shares: reach / 80,
                    comments: reach / 100,
                    reach,
                }),
                created_at: now - Duration::days(4),
            });
        }

        for (content, days) in [
            ("Sneak peek: new product line drops Friday.", 1),
            ("Monthly Q&A thread — drop your questions below!", 3),
        ] {
            inner.posts.insert_with(|id| Post {
                id,
                user_id: user.id,
                category_id: None,
                assigned_to: None,
                content: content.into(),
                media_refs: None,
                platforms: vec!["twitter".into()],
                status: PostStatus::Scheduled,
                scheduled_at: Some(now + Duration::days(days)),
                published_at: None,
                approved_at: None,
                approved_by: None,
                engagement: None,
                created_at: now - Duration::days(1),
            });
        }

        inner.automations.insert_with(|id| Automation {
            id,
            user_id: user.id,
            name: "Welcome series".into(),
            description: Some("Greets new followers with a DM sequence".into()),
            kind: "welcome_series".into(),
            config: json!({ "delay_minutes": 15 }),
            is_active: true,
            trigger_count: 42,
            last_run: Some(now - Duration::hours(6)),
            next_run: Some(now + Duration::hours(18)),
            created_at: now - Duration::days(14),
        });
        inner.automations.insert_with(|id| Automation {
            id,
            user_id: user.id,
            name: "Evergreen re-queue".into(),
            description: None,
            kind: "auto_queue".into(),
            config: json!({ "category": "evergreen" }),
            is_active: false,
            trigger_count: 7,
            last_run: None,
            next_run: None,
            created_at: now - Duration::days(10),
        });

        for (platform, followers, engagement, reach, posts) in [
            ("twitter", 12800, 940, 31000, 18),
            ("instagram", 8400, 1220, 26000, 12),
        ] {
            inner.analytics.insert_with(|id| AnalyticsRow {
                id,
                user_id: user.id,
                date: now - Duration::days(1),
                platform: platform.into(),
                followers,
                engagement,
                reach,
                posts,
                metrics: None,
                created_at: now - Duration::days(1),
            });
        }

        for (kind, description, hours) in [
            ("post_published", "Published \"Launch week recap\"", 72),
            ("account_connected", "Connected Instagram account", 48),
            ("post_scheduled", "Scheduled \"Sneak peek\" for Friday", 20),
        ] {
            inner.activities.insert_with(|id| Activity {
                id,
                user_id: user.id,
                kind: kind.into(),
                description: description.into(),
                platform: None,
                metadata: None,
                created_at: now - Duration::hours(hours),
            });
        }
    }
}

impl Default for MemStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for MemStorage {
    async fn get_user(&self, id: i64) -> Result<Option<User>> {
        Ok(self.lock()?.users.rows.get(&id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .lock()?
            .users
            .rows
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn get_user_by_external_id(&self, external_id: &str) -> Result<Option<User>> {
        Ok(self
            .lock()?
            .users
            .rows
            .values()
            .find(|u| u.external_id.as_deref() == Some(external_id))
            .cloned())
    }

    async fn get_user_by_username(&self, _username: &str) -> Result<Option<User>> {
        Ok(None)
    }

    async fn create_user(&self, data: NewUser) -> Result<User> {
        let now = Utc::now();
        Ok(self.lock()?.users.insert_with(|id| User {
            id,
            email: data.email,
            name: data.name,
            password_hash: data.password_hash,
            avatar_url: data.avatar_url,
            external_id: data.external_id,
            role: data.role,
            created_at: now,
        }))
    }

    async fn update_user_profile(
        &self,
        id: i64,
        update: UserProfileUpdate,
    ) -> Result<Option<User>> {
        let mut inner = self.lock()?;
        let Some(user) = inner.users.rows.get_mut(&id) else {
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
        Ok(Some(user.clone()))
    }

    async fn social_accounts(&self, user_id: i64) -> Result<Vec<SocialAccount>> {
        let mut accounts = self.lock()?.accounts.filter(|a| a.user_id == user_id);
        accounts.sort_by_key(|a| a.id);
        Ok(accounts)
    }

    async fn upsert_social_account(&self, data: NewSocialAccount) -> Result<SocialAccount> {
        let mut inner = self.lock()?;
        let existing = inner.accounts.rows.values_mut().find(|a| {
            a.user_id == data.user_id
                && a.platform == data.platform
                && a.account_id == data.account_id
        });
        if let Some(account) = existing {
            account.account_name = data.account_name;
            account.access_token = data.access_token;
            account.is_connected = data.is_connected;
            return Ok(account.clone());
        }
        let now = Utc::now();
        Ok(inner.accounts.insert_with(|id| SocialAccount {
            id,
            user_id: data.user_id,
            platform: data.platform,
            account_name: data.account_name,
            account_id: data.account_id,
            access_token: data.access_token,
            is_connected: data.is_connected,
            created_at: now,
        }))
    }

    async fn set_account_connected(
        &self,
        id: i64,
        is_connected: bool,
    ) -> Result<Option<SocialAccount>> {
        let mut inner = self.lock()?;
        let Some(account) = inner.accounts.rows.get_mut(&id) else {
            return Ok(None);
        };
        account.is_connected = is_connected;
        Ok(Some(account.clone()))
    }

    async fn delete_social_account(&self, id: i64) -> Result<bool> {
        Ok(self.lock()?.accounts.rows.remove(&id).is_some())
    }

    async fn posts(&self, user_id: i64) -> Result<Vec<Post>> {
        let mut posts = self.lock()?.posts.filter(|p| p.user_id == user_id);
        posts.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(posts)
    }

    async fn posts_by_status(&self, user_id: i64, status: PostStatus) -> Result<Vec<Post>> {
        let mut posts = self
            .lock()?
            .posts
            .filter(|p| p.user_id == user_id && p.status == status);
        posts.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(posts)
    }

    async fn create_post(&self, data: NewPost) -> Result<Post> {
        let now = Utc::now();
        Ok(self.lock()?.posts.insert_with(|id| build_post(id, data, now)))
    }

    async fn create_post_logged(&self, data: NewPost, activity: NewActivity) -> Result<Post> {
        // One lock hold covers both inserts, so they land together.
        let mut inner = self.lock()?;
        let now = Utc::now();
        let post = inner.posts.insert_with(|id| build_post(id, data, now));
        inner
            .activities
            .insert_with(|id| build_activity(id, activity, now));
        Ok(post)
    }

    async fn update_post(&self, id: i64, update: PostUpdate) -> Result<Option<Post>> {
        let mut inner = self.lock()?;
        let Some(post) = inner.posts.rows.get_mut(&id) else {
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
        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, id: i64) -> Result<bool> {
        let mut inner = self.lock()?;
        let removed = inner.posts.rows.remove(&id).is_some();
        if removed {
            inner.comments.rows.retain(|_, c| c.post_id != id);
        }
        Ok(removed)
    }

    async fn upcoming_posts(&self, user_id: i64) -> Result<Vec<Post>> {
        let now = Utc::now();
        let mut posts = self.lock()?.posts.filter(|p| {
            p.user_id == user_id
                && p.status == PostStatus::Scheduled
                && p.scheduled_at.is_some_and(|at| at >= now)
        });
        posts.sort_by_key(|p| p.scheduled_at);
        Ok(posts)
    }

    async fn top_posts(&self, user_id: i64, limit: usize) -> Result<Vec<Post>> {
        let mut posts = self.lock()?.posts.filter(|p| {
            p.user_id == user_id && p.status == PostStatus::Published && p.engagement.is_some()
        });
        posts.sort_by_key(|p| std::cmp::Reverse(p.engagement.as_ref().map_or(0, |e| e.reach)));
        posts.truncate(limit);
        Ok(posts)
    }

    async fn automations(&self, user_id: i64) -> Result<Vec<Automation>> {
        let mut automations = self.lock()?.automations.filter(|a| a.user_id == user_id);
        automations.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(automations)
    }

    async fn create_automation(&self, data: NewAutomation) -> Result<Automation> {
        let now = Utc::now();
        Ok(self.lock()?.automations.insert_with(|id| Automation {
            id,
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
        }))
    }

    async fn update_automation(
        &self,
        id: i64,
        update: AutomationUpdate,
    ) -> Result<Option<Automation>> {
        let mut inner = self.lock()?;
        let Some(automation) = inner.automations.rows.get_mut(&id) else {
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
        Ok(Some(automation.clone()))
    }

    async fn toggle_automation(&self, id: i64) -> Result<Option<Automation>> {
        let mut inner = self.lock()?;
        let Some(automation) = inner.automations.rows.get_mut(&id) else {
            return Ok(None);
        };
        automation.is_active = !automation.is_active;
        Ok(Some(automation.clone()))
    }

    async fn analytics(&self, user_id: i64, platform: Option<&str>) -> Result<Vec<AnalyticsRow>> {
        let mut rows = self.lock()?.analytics.filter(|r| {
            r.user_id == user_id && platform.is_none_or(|p| r.platform == p)
        });
        rows.sort_by_key(|r| r.id);
        Ok(rows)
    }

    async fn create_analytics(&self, data: NewAnalyticsRow) -> Result<AnalyticsRow> {
        let now = Utc::now();
        Ok(self.lock()?.analytics.insert_with(|id| AnalyticsRow {
            id,
            user_id: data.user_id,
            date: data.date,
            platform: data.platform,
            followers: data.followers,
            engagement: data.engagement,
            reach: data.reach,
            posts: data.posts,
            metrics: data.metrics,
            created_at: now,
        }))
    }

    async fn analytics_summary(&self, user_id: i64) -> Result<AnalyticsSummary> {
        let inner = self.lock()?;
        let (mut followers, mut engagement, mut reach, mut posts) = (0, 0, 0, 0);
        for row in inner.analytics.rows.values().filter(|r| r.user_id == user_id) {
            followers += row.followers;
            engagement += row.engagement;
            reach += row.reach;
            posts += row.posts;
        }
        Ok(AnalyticsSummary::from_totals(followers, engagement, reach, posts))
    }

    async fn library_items(&self, user_id: i64) -> Result<Vec<LibraryItem>> {
        let mut items = self.lock()?.library.filter(|i| i.user_id == user_id);
        items.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(items)
    }

    async fn create_library_item(&self, data: NewLibraryItem) -> Result<LibraryItem> {
        let now = Utc::now();
        Ok(self.lock()?.library.insert_with(|id| LibraryItem {
            id,
            user_id: data.user_id,
            title: data.title,
            body: data.body,
            media_url: data.media_url,
            media_type: data.media_type,
            tags: data.tags,
            category: data.category,
            is_template: data.is_template,
            created_at: now,
        }))
    }

    async fn categories(&self, user_id: i64) -> Result<Vec<ContentCategory>> {
        let mut categories = self.lock()?.categories.filter(|c| c.user_id == user_id);
        categories.sort_by_key(|c| c.id);
        Ok(categories)
    }

    async fn create_category(&self, data: NewCategory) -> Result<ContentCategory> {
        let now = Utc::now();
        Ok(self.lock()?.categories.insert_with(|id| ContentCategory {
            id,
            user_id: data.user_id,
            name: data.name,
            description: data.description,
            color: data.color,
            auto_queue_rule: data.auto_queue_rule,
            created_at: now,
        }))
    }

    async fn update_category(
        &self,
        id: i64,
        update: CategoryUpdate,
    ) -> Result<Option<ContentCategory>> {
        let mut inner = self.lock()?;
        let Some(category) = inner.categories.rows.get_mut(&id) else {
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
        Ok(Some(category.clone()))
    }

    async fn delete_category(&self, id: i64) -> Result<bool> {
        Ok(self.lock()?.categories.rows.remove(&id).is_some())
    }

    async fn media_items(&self, user_id: i64) -> Result<Vec<MediaItem>> {
        let mut items = self.lock()?.media.filter(|m| m.user_id == user_id);
        items.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(items)
    }

    async fn create_media_item(&self, data: NewMediaItem) -> Result<MediaItem> {
        let now = Utc::now();
        Ok(self.lock()?.media.insert_with(|id| MediaItem {
            id,
            user_id: data.user_id,
            filename: data.filename,
            original_name: data.original_name,
            mime_type: data.mime_type,
            size_bytes: data.size_bytes,
            url: data.url,
            tags: data.tags,
            alt_text: data.alt_text,
            created_at: now,
        }))
    }

    async fn update_media_item(&self, id: i64, update: MediaUpdate) -> Result<Option<MediaItem>> {
        let mut inner = self.lock()?;
        let Some(item) = inner.media.rows.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(tags) = update.tags {
            item.tags = tags;
        }
        if let Some(alt_text) = update.alt_text {
            item.alt_text = Some(alt_text);
        }
        Ok(Some(item.clone()))
    }

    async fn delete_media_item(&self, id: i64) -> Result<bool> {
        Ok(self.lock()?.media.rows.remove(&id).is_some())
    }

    async fn post_comments(&self, post_id: i64) -> Result<Vec<PostComment>> {
        let mut comments = self.lock()?.comments.filter(|c| c.post_id == post_id);
        comments.sort_by_key(|c| c.id);
        Ok(comments)
    }

    async fn create_comment(&self, data: NewComment) -> Result<PostComment> {
        let now = Utc::now();
        Ok(self.lock()?.comments.insert_with(|id| PostComment {
            id,
            post_id: data.post_id,
            user_id: data.user_id,
            content: data.content,
            is_internal: data.is_internal,
            created_at: now,
        }))
    }

    async fn recent_activities(&self, user_id: i64, limit: usize) -> Result<Vec<Activity>> {
        let mut activities = self.lock()?.activities.filter(|a| a.user_id == user_id);
        activities.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        activities.truncate(limit);
        Ok(activities)
    }

    async fn create_activity(&self, data: NewActivity) -> Result<Activity> {
        let now = Utc::now();
        Ok(self
            .lock()?
            .activities
            .insert_with(|id| build_activity(id, data, now)))
    }
}

fn build_post(id: i64, data: NewPost, now: chrono::DateTime<Utc>) -> Post {
    Post {
        id,
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
    }
}

fn build_activity(id: i64, data: NewActivity, now: chrono::DateTime<Utc>) -> Activity {
    Activity {
        id,
        user_id: data.user_id,
        kind: data.kind,
        description: data.description,
        platform: data.platform,
        metadata: data.metadata,
        created_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{new_account, new_analytics, new_automation, new_post, new_user};

    #[tokio::test]
    async fn ids_are_never_reused_after_deletion() {
        let store = MemStorage::new();
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
        let store = MemStorage::new();
        let alice = store.create_user(new_user("alice@x.y")).await.unwrap();
        let bob = store.create_user(new_user("bob@x.y")).await.unwrap();

        store.create_post(new_post(alice.id, "mine")).await.unwrap();
        store.create_post(new_post(bob.id, "theirs")).await.unwrap();

        let posts = store.posts(alice.id).await.unwrap();
        assert_eq!(posts.len(), 1);
        assert!(posts.iter().all(|p| p.user_id == alice.id));
    }

    #[tokio::test]
    async fn create_then_list_applies_defaults() {
        let store = MemStorage::new();
        let user = store.create_user(new_user("a@b.c")).await.unwrap();

        store.create_post(new_post(user.id, "hello")).await.unwrap();

        let posts = store.posts(user.id).await.unwrap();
        assert_eq!(posts.len(), 1);
        let post = &posts[0];
        assert_eq!(post.content, "hello");
        assert_eq!(post.status, PostStatus::Draft);
        assert!(post.id > 0);
        assert!(post.published_at.is_none());
    }

    #[tokio::test]
    async fn status_listing_matches_full_listing_subset() {
        let store = MemStorage::new();
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
    }

    #[tokio::test]
    async fn upcoming_posts_are_future_scheduled_soonest_first() {
        let store = MemStorage::new();
        let user = store.create_user(new_user("a@b.c")).await.unwrap();
        let now = Utc::now();

        for hours in [48, 2, 24] {
            let mut post = new_post(user.id, "later");
            post.status = PostStatus::Scheduled;
            post.scheduled_at = Some(now + Duration::hours(hours));
            store.create_post(post).await.unwrap();
        }
        // Scheduled with no timestamp: excluded.
        let mut dangling = new_post(user.id, "no time");
        dangling.status = PostStatus::Scheduled;
        store.create_post(dangling).await.unwrap();
        // Scheduled in the past: excluded.
        let mut past = new_post(user.id, "missed");
        past.status = PostStatus::Scheduled;
        past.scheduled_at = Some(now - Duration::hours(1));
        store.create_post(past).await.unwrap();

        let upcoming = store.upcoming_posts(user.id).await.unwrap();
        assert_eq!(upcoming.len(), 3);
        for pair in upcoming.windows(2) {
            assert!(pair[0].scheduled_at <= pair[1].scheduled_at);
        }
    }

    #[tokio::test]
    async fn top_posts_rank_by_reach_and_truncate() {
        let store = MemStorage::new();
        let user = store.create_user(new_user("a@b.c")).await.unwrap();

        for reach in [50, 500, 200] {
            let post = store.create_post(new_post(user.id, "p")).await.unwrap();
            store
                .update_post(
                    post.id,
                    PostUpdate {
                        status: Some(PostStatus::Published),
                        engagement: Some(EngagementMetrics {
                            likes: 1,
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
        // Published without engagement: excluded.
        let bare = store.create_post(new_post(user.id, "bare")).await.unwrap();
        store
            .update_post(
                bare.id,
                PostUpdate {
                    status: Some(PostStatus::Published),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let top = store.top_posts(user.id, 2).await.unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].engagement.as_ref().unwrap().reach, 500);
        assert_eq!(top[1].engagement.as_ref().unwrap().reach, 200);
    }

    #[tokio::test]
    async fn update_round_trips_and_missing_id_is_none() {
        let store = MemStorage::new();
        let user = store.create_user(new_user("a@b.c")).await.unwrap();
        let post = store.create_post(new_post(user.id, "before")).await.unwrap();

        let updated = store
            .update_post(
                post.id,
                PostUpdate {
                    content: Some("after".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.content, "after");
        assert_eq!(updated.id, post.id);
        assert_eq!(updated.status, post.status);
        assert_eq!(updated.platforms, post.platforms);
        assert_eq!(updated.created_at, post.created_at);

        let missing = store
            .update_post(
                999_999,
                PostUpdate {
                    content: Some("x".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(missing.is_none());
        assert_eq!(store.posts(user.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn toggle_twice_restores_original_state() {
        let store = MemStorage::new();
        let user = store.create_user(new_user("a@b.c")).await.unwrap();
        let automation = store
            .create_automation(new_automation(user.id))
            .await
            .unwrap();
        assert!(automation.is_active);

        let once = store.toggle_automation(automation.id).await.unwrap().unwrap();
        assert!(!once.is_active);
        let twice = store.toggle_automation(automation.id).await.unwrap().unwrap();
        assert!(twice.is_active);

        assert!(store.toggle_automation(424_242).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn summary_sums_rows_and_handles_zero_reach() {
        let store = MemStorage::new();
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
        assert!(empty.engagement_rate.is_finite());
    }

    #[tokio::test]
    async fn deleted_account_disappears_from_listing() {
        let store = MemStorage::new();
        let user = store.create_user(new_user("a@b.c")).await.unwrap();
        let account = store
            .upsert_social_account(new_account(user.id, "twitter", "123"))
            .await
            .unwrap();

        assert!(store.delete_social_account(account.id).await.unwrap());
        assert!(!store.delete_social_account(account.id).await.unwrap());

        let accounts = store.social_accounts(user.id).await.unwrap();
        assert!(accounts.iter().all(|a| a.id != account.id));
    }

    #[tokio::test]
    async fn reconnecting_same_account_updates_in_place() {
        let store = MemStorage::new();
        let user = store.create_user(new_user("a@b.c")).await.unwrap();

        let first = store
            .upsert_social_account(new_account(user.id, "twitter", "123"))
            .await
            .unwrap();
        let mut reconnect = new_account(user.id, "twitter", "123");
        reconnect.account_name = "renamed".into();
        reconnect.access_token = Some("tok2".into());
        let second = store.upsert_social_account(reconnect).await.unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.account_name, "renamed");
        assert_eq!(store.social_accounts(user.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn post_creation_with_audit_records_both() {
        let store = MemStorage::new();
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
    async fn recent_activities_newest_first_with_limit() {
        let store = MemStorage::new();
        let user = store.create_user(new_user("a@b.c")).await.unwrap();

        for i in 0..5 {
            store
                .create_activity(NewActivity {
                    user_id: user.id,
                    kind: "event".into(),
                    description: format!("event {i}"),
                    platform: None,
                    metadata: None,
                })
                .await
                .unwrap();
        }

        let recent = store.recent_activities(user.id, 3).await.unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].description, "event 4");
    }

    #[tokio::test]
    async fn legacy_username_lookup_never_resolves() {
        let store = MemStorage::new();
        store.create_user(new_user("a@b.c")).await.unwrap();
        assert!(store.get_user_by_username("a@b.c").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn demo_store_is_populated_for_the_dashboard() {
        let store = MemStorage::demo();
        let user = store
            .get_user_by_email("demo@postdeck.dev")
            .await
            .unwrap()
            .unwrap();

        assert!(!store.posts(user.id).await.unwrap().is_empty());
        assert!(!store.automations(user.id).await.unwrap().is_empty());
        assert!(!store.upcoming_posts(user.id).await.unwrap().is_empty());
        assert!(!store.recent_activities(user.id, 10).await.unwrap().is_empty());
        assert!(store.analytics_summary(user.id).await.unwrap().total_followers > 0);
    }
}
