use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use postdeck_types::api::Claims;

use crate::auth::AppState;
use crate::internal_error;

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    10
}

pub async fn recent(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ActivityQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let activities = state
        .storage
        .recent_activities(claims.sub, query.limit.min(100))
        .await
        .map_err(internal_error)?;
    Ok(Json(activities))
}
