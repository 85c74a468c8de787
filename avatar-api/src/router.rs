use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::{DefaultMakeSpan, TraceLayer},
};

use crate::{app_state::AppState, config::ApplicationSettings, routes};

pub fn create(app_state: AppState, application: &ApplicationSettings) -> Router<()> {
    Router::new()
        .route("/", get(|| async { "Avatar resolver is up" }))
        .nest("/avatars", routes::avatars::router())
        .nest("/profiles", routes::profiles::router())
        .merge(routes::download::router())
        .merge(routes::proxy::router())
        .merge(routes::instagram::router())
        .with_state(app_state)
        .layer(cors_layer(&application.allowed_origins))
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {origin}");
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_origin(allow_origin)
}
