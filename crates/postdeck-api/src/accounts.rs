use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use postdeck_types::api::{Claims, SetConnectedRequest};
use postdeck_types::models::{NewActivity, NewSocialAccount};

use crate::auth::AppState;
use crate::internal_error;

pub async fn list_accounts(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let accounts = state
        .storage
        .social_accounts(claims.sub)
        .await
        .map_err(internal_error)?;
    Ok(Json(accounts))
}

/// Connecting an account that already exists for this user/platform pair
/// refreshes the stored row instead of duplicating it.
pub async fn connect_account(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(mut data): Json<NewSocialAccount>,
) -> Result<impl IntoResponse, StatusCode> {
    data.user_id = claims.sub;
    let platform = data.platform.clone();
    let account_name = data.account_name.clone();

    let account = state
        .storage
        .upsert_social_account(data)
        .await
        .map_err(internal_error)?;

    // Audit-trail convention: account changes get an activity entry.
    state
        .storage
        .create_activity(NewActivity {
            user_id: claims.sub,
            kind: "account_connected".into(),
            description: format!("Connected {account_name} on {platform}"),
            platform: Some(platform),
            metadata: None,
        })
        .await
        .map_err(internal_error)?;

    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn set_connected(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<SetConnectedRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let account = state
        .storage
        .set_account_connected(id, req.is_connected)
        .await
        .map_err(internal_error)?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(account))
}

pub async fn delete_account(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, StatusCode> {
    let removed = state
        .storage
        .delete_social_account(id)
        .await
        .map_err(internal_error)?;
    if !removed {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(StatusCode::NO_CONTENT)
}
