use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};

use postdeck_types::api::{Claims, PasswordChangeRequest, ProfileRequest};
use postdeck_types::models::UserProfileUpdate;

use crate::auth::{AppState, hash_password, verify_password};
use crate::internal_error;

pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let user = state
        .storage
        .get_user(claims.sub)
        .await
        .map_err(internal_error)?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(user))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ProfileRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    if req.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(StatusCode::BAD_REQUEST);
    }

    let user = state
        .storage
        .update_user_profile(
            claims.sub,
            UserProfileUpdate {
                name: req.name,
                avatar_url: req.avatar_url,
                password_hash: None,
            },
        )
        .await
        .map_err(internal_error)?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(user))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<PasswordChangeRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    if req.new_password.len() < 8 {
        return Err(StatusCode::BAD_REQUEST);
    }

    let user = state
        .storage
        .get_user(claims.sub)
        .await
        .map_err(internal_error)?
        .ok_or(StatusCode::NOT_FOUND)?;

    verify_password(&req.current_password, &user.password_hash)?;

    let password_hash = hash_password(&req.new_password)?;
    state
        .storage
        .update_user_profile(
            claims.sub,
            UserProfileUpdate {
                name: None,
                avatar_url: None,
                password_hash: Some(password_hash),
            },
        )
        .await
        .map_err(internal_error)?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(StatusCode::NO_CONTENT)
}
