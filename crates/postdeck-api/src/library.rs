use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};

use postdeck_types::api::Claims;
use postdeck_types::models::NewLibraryItem;

use crate::auth::AppState;
use crate::internal_error;

pub async fn list_items(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let items = state
        .storage
        .library_items(claims.sub)
        .await
        .map_err(internal_error)?;
    Ok(Json(items))
}

pub async fn create_item(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(mut data): Json<NewLibraryItem>,
) -> Result<impl IntoResponse, StatusCode> {
    data.user_id = claims.sub;
    let item = state
        .storage
        .create_library_item(data)
        .await
        .map_err(internal_error)?;
    Ok((StatusCode::CREATED, Json(item)))
}
