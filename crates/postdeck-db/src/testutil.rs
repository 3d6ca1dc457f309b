//! Fixture builders shared by the memory and SQLite test suites, so both
//! stores are exercised with identical inputs.

use chrono::Utc;
use serde_json::json;

use postdeck_types::models::{
    NewAnalyticsRow, NewAutomation, NewPost, NewSocialAccount, NewUser, UserRole,
};

pub fn new_user(email: &str) -> NewUser {
    NewUser {
        email: email.to_string(),
        name: "Test User".into(),
        password_hash: "hash".into(),
        avatar_url: None,
        external_id: None,
        role: UserRole::TeamMember,
    }
}

pub fn new_post(user_id: i64, content: &str) -> NewPost {
    NewPost {
        user_id,
        category_id: None,
        assigned_to: None,
        content: content.to_string(),
        media_refs: None,
        platforms: vec!["twitter".into()],
        status: Default::default(),
        scheduled_at: None,
    }
}

pub fn new_account(user_id: i64, platform: &str, account_id: &str) -> NewSocialAccount {
    NewSocialAccount {
        user_id,
        platform: platform.to_string(),
        account_name: format!("@{platform}"),
        account_id: account_id.to_string(),
        access_token: Some("tok".into()),
        is_connected: true,
    }
}

pub fn new_automation(user_id: i64) -> NewAutomation {
    NewAutomation {
        user_id,
        name: "Welcome series".into(),
        description: None,
        kind: "welcome_series".into(),
        config: json!({ "delay_minutes": 10 }),
        is_active: true,
    }
}

pub fn new_analytics(user_id: i64, followers: i64, engagement: i64, reach: i64) -> NewAnalyticsRow {
    NewAnalyticsRow {
        user_id,
        date: Utc::now(),
        platform: "twitter".into(),
        followers,
        engagement,
        reach,
        posts: 1,
        metrics: None,
    }
}
