use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use postdeck_types::api::Claims;
use postdeck_types::models::{NewActivity, NewComment, NewPost, PostStatus, PostUpdate};

use crate::auth::AppState;
use crate::internal_error;

#[derive(Debug, Deserialize)]
pub struct PostQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TopQuery {
    #[serde(default = "default_top_limit")]
    pub limit: usize,
}

fn default_top_limit() -> usize {
    10
}

pub async fn list_posts(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<PostQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let posts = match query.status {
        Some(raw) => {
            let status: PostStatus = raw.parse().map_err(|_| StatusCode::BAD_REQUEST)?;
            state
                .storage
                .posts_by_status(claims.sub, status)
                .await
                .map_err(internal_error)?
        }
        None => state.storage.posts(claims.sub).await.map_err(internal_error)?,
    };
    Ok(Json(posts))
}

pub async fn upcoming_posts(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let posts = state
        .storage
        .upcoming_posts(claims.sub)
        .await
        .map_err(internal_error)?;
    Ok(Json(posts))
}

pub async fn top_posts(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<TopQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let posts = state
        .storage
        .top_posts(claims.sub, query.limit.min(100))
        .await
        .map_err(internal_error)?;
    Ok(Json(posts))
}

pub async fn create_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(mut data): Json<NewPost>,
) -> Result<impl IntoResponse, StatusCode> {
    if data.platforms.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    data.user_id = claims.sub;

    let activity = NewActivity {
        user_id: claims.sub,
        kind: "post_created".into(),
        description: format!("Created \"{}\"", summary_of(&data.content)),
        platform: None,
        metadata: None,
    };

    let post = state
        .storage
        .create_post_logged(data, activity)
        .await
        .map_err(internal_error)?;
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<PostUpdate>,
) -> Result<impl IntoResponse, StatusCode> {
    let post = state
        .storage
        .update_post(id, update)
        .await
        .map_err(internal_error)?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(post))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, StatusCode> {
    let removed = state
        .storage
        .delete_post(id)
        .await
        .map_err(internal_error)?;
    if !removed {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> Result<impl IntoResponse, StatusCode> {
    let comments = state
        .storage
        .post_comments(post_id)
        .await
        .map_err(internal_error)?;
    Ok(Json(comments))
}

pub async fn create_comment(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    Extension(claims): Extension<Claims>,
    Json(mut data): Json<NewComment>,
) -> Result<impl IntoResponse, StatusCode> {
    data.post_id = post_id;
    data.user_id = claims.sub;

    let comment = state
        .storage
        .create_comment(data)
        .await
        .map_err(internal_error)?;
    Ok((StatusCode::CREATED, Json(comment)))
}

fn summary_of(content: &str) -> String {
    let mut summary: String = content.chars().take(60).collect();
    if summary.len() < content.len() {
        summary.push('…');
    }
    summary
}
