use avatar_chain::{
    file_name::avatar_file_name, parse_profile_url, Platform, RetrievalRequest,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::app_state::AppState;

use super::ApiError;

pub fn router() -> Router<AppState> {
    Router::new().route("/resolve", post(resolve_profile))
}

#[derive(Debug, Default, Deserialize)]
struct ResolveProfileBody {
    url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResolvedProfile {
    platform: Platform,
    username: String,
    avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<String>,
    file_name: String,
}

#[instrument(name = "POST /profiles/resolve", skip(app_state, body))]
async fn resolve_profile(
    State(app_state): State<AppState>,
    body: Result<Json<ResolveProfileBody>, JsonRejection>,
) -> Result<Json<ResolvedProfile>, ApiError> {
    let url = body
        .map(|Json(body)| body)
        .unwrap_or_default()
        .url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("URL is required"))?;

    let profile = parse_profile_url(&url)?;
    let request = RetrievalRequest::new(profile.platform, profile.username.as_str());
    let result = app_state.resolver.resolve_request(&request).await;

    let content_type = result
        .avatar_url
        .as_deref()
        .and_then(guess_content_type)
        .unwrap_or_default();

    Ok(Json(ResolvedProfile {
        file_name: avatar_file_name(profile.platform, &profile.username, &content_type),
        platform: profile.platform,
        username: profile.username,
        avatar_url: result.avatar_url,
        warning: result.warning,
    }))
}

/// Best guess from the URL path; the real type is only known after download.
fn guess_content_type(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next()?;
    mime_guess::from_path(path)
        .first()
        .map(|mime| mime.essence_str().to_string())
}
