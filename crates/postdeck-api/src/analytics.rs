use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use postdeck_types::api::Claims;
use postdeck_types::models::NewAnalyticsRow;

use crate::auth::AppState;
use crate::internal_error;

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub platform: Option<String>,
}

pub async fn list_analytics(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let rows = state
        .storage
        .analytics(claims.sub, query.platform.as_deref())
        .await
        .map_err(internal_error)?;
    Ok(Json(rows))
}

pub async fn record_analytics(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(mut data): Json<NewAnalyticsRow>,
) -> Result<impl IntoResponse, StatusCode> {
    data.user_id = claims.sub;
    let row = state
        .storage
        .create_analytics(data)
        .await
        .map_err(internal_error)?;
    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn summary(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let summary = state
        .storage
        .analytics_summary(claims.sub)
        .await
        .map_err(internal_error)?;
    Ok(Json(summary))
}
