use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use postdeck_types::api::Claims;
use postdeck_types::models::{CategoryUpdate, NewCategory};

use crate::auth::AppState;
use crate::internal_error;

pub async fn list_categories(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let categories = state
        .storage
        .categories(claims.sub)
        .await
        .map_err(internal_error)?;
    Ok(Json(categories))
}

pub async fn create_category(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(mut data): Json<NewCategory>,
) -> Result<impl IntoResponse, StatusCode> {
    data.user_id = claims.sub;
    let category = state
        .storage
        .create_category(data)
        .await
        .map_err(internal_error)?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<CategoryUpdate>,
) -> Result<impl IntoResponse, StatusCode> {
    let category = state
        .storage
        .update_category(id, update)
        .await
        .map_err(internal_error)?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(category))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, StatusCode> {
    let removed = state
        .storage
        .delete_category(id)
        .await
        .map_err(internal_error)?;
    if !removed {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(StatusCode::NO_CONTENT)
}
