use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use postdeck_types::api::Claims;
use postdeck_types::models::{AutomationUpdate, NewAutomation};

use crate::auth::AppState;
use crate::internal_error;

pub async fn list_automations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let automations = state
        .storage
        .automations(claims.sub)
        .await
        .map_err(internal_error)?;
    Ok(Json(automations))
}

pub async fn create_automation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(mut data): Json<NewAutomation>,
) -> Result<impl IntoResponse, StatusCode> {
    data.user_id = claims.sub;
    let automation = state
        .storage
        .create_automation(data)
        .await
        .map_err(internal_error)?;
    Ok((StatusCode::CREATED, Json(automation)))
}

pub async fn update_automation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<AutomationUpdate>,
) -> Result<impl IntoResponse, StatusCode> {
    let automation = state
        .storage
        .update_automation(id, update)
        .await
        .map_err(internal_error)?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(automation))
}

pub async fn toggle_automation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, StatusCode> {
    let automation = state
        .storage
        .toggle_automation(id)
        .await
        .map_err(internal_error)?
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(automation))
}
