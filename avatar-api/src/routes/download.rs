use avatar_chain::EgressOutcome;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::header,
    response::{IntoResponse, Redirect, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use tracing::instrument;

use crate::app_state::AppState;

use super::ApiError;

pub fn router() -> Router<AppState> {
    Router::new().route("/download-avatar", post(download_avatar))
}

#[derive(Debug, Default, Deserialize)]
struct DownloadBody {
    url: Option<String>,
}

#[instrument(name = "POST /download-avatar", skip(app_state, body))]
async fn download_avatar(
    State(app_state): State<AppState>,
    body: Result<Json<DownloadBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let url = body
        .map(|Json(body)| body)
        .unwrap_or_default()
        .url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("URL is required"))?;

    match app_state.egress.fetch_image(&url).await? {
        EgressOutcome::Image(image) => Ok((
            [
                (header::CONTENT_TYPE, image.content_type),
                (header::CACHE_CONTROL, "public, max-age=86400".to_string()),
            ],
            image.bytes,
        )
            .into_response()),
        EgressOutcome::Redirect(location) => Ok(Redirect::temporary(&location).into_response()),
    }
}
