use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use tracing::instrument;

use crate::app_state::AppState;

use super::ApiError;

pub fn router() -> Router<AppState> {
    Router::new().route("/proxy-image", get(proxy_image))
}

#[derive(Debug, Deserialize)]
struct ProxyQuery {
    url: Option<String>,
}

#[instrument(name = "GET /proxy-image", skip(app_state))]
async fn proxy_image(
    State(app_state): State<AppState>,
    Query(query): Query<ProxyQuery>,
) -> Result<Response, ApiError> {
    let url = query
        .url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing image URL"))?;

    let image = app_state.egress.passthrough(&url).await?;

    Ok((
        [
            (header::CONTENT_TYPE, image.content_type),
            (header::CACHE_CONTROL, "public, max-age=3600".to_string()),
        ],
        image.bytes,
    )
        .into_response())
}
