use avatar_chain::RetrievalResult;
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::app_state::AppState;

use super::ApiError;

pub fn router() -> Router<AppState> {
    Router::new().route("/:platform/:username", get(get_avatar))
}

#[instrument(name = "GET /avatars/:platform/:username", skip(app_state))]
async fn get_avatar(
    State(app_state): State<AppState>,
    Path((platform, username)): Path<(String, String)>,
) -> Result<Json<RetrievalResult>, ApiError> {
    let result = app_state.resolver.resolve(&platform, &username).await?;
    Ok(Json(result))
}
