use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use postdeck_types::api::Claims;
use postdeck_types::models::{MediaUpdate, NewActivity, NewMediaItem};

use crate::auth::AppState;
use crate::internal_error;

pub async fn list_media(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let items = state
        .storage
        .media_items(claims.sub)
        .await
        .map_err(internal_error)?;
    Ok(Json(items))
}

pub async fn create_media(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(mut data): Json<NewMediaItem>,
) -> Result<impl IntoResponse, StatusCode> {
    data.user_id = claims.sub;
    // The stored object key is server-assigned; clients only name the
    // original file.
    if data.filename.is_empty() {
        data.filename = format!("{}-{}", Uuid::new_v4(), data.original_name);
    }
    let original_name = data.original_name.clone();

    let item = state
        .storage
        .create_media_item(data)
        .await
        .map_err(internal_error)?;

    state
        .storage
        .create_activity(NewActivity {
            user_id: claims.sub,
            kind: "media_uploaded".into(),
            description: format!("Uploaded {original_name}"),
            platform: None,
            metadata: None,
        })
        .await
        .map_err(internal_error)?;

    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_media(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<MediaUpdate>,
) -> Result<impl IntoResponse, StatusCode> {
    let item = state
        .storage
        .update_media_item(id, update)
        .await
        .map_err(internal_error)?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(item))
}

pub async fn delete_media(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, StatusCode> {
    let removed = state
        .storage
        .delete_media_item(id)
        .await
        .map_err(internal_error)?;
    if !removed {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(StatusCode::NO_CONTENT)
}
