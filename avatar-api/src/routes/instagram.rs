use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::app_state::AppState;

use super::ApiError;

pub fn router() -> Router<AppState> {
    Router::new().route("/instagram-profile", get(instagram_profile))
}

#[derive(Debug, Deserialize)]
struct InstagramQuery {
    username: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InstagramProfile {
    avatar_url: String,
}

/// Scrape-only Instagram lookup: no mirrors and no placeholder.
#[instrument(name = "GET /instagram-profile", skip(app_state))]
async fn instagram_profile(
    State(app_state): State<AppState>,
    Query(query): Query<InstagramQuery>,
) -> Result<Json<InstagramProfile>, ApiError> {
    let username = query
        .username
        .map(|username| username.trim().to_string())
        .filter(|username| !username.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing username parameter"))?;

    let avatar_url = app_state
        .instagram_lookup()
        .find(&username)
        .await
        .ok_or_else(|| ApiError::not_found("Could not find profile picture"))?;

    Ok(Json(InstagramProfile { avatar_url }))
}
