use anyhow::Context;
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;
mod router;
mod routes;


use app_state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::from_filename(".env.local").ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,avatar_api=debug,avatar_chain=debug")),
        )
        .init();

    let config = config::read_config().context("Failed to read configuration")?;
    let app_state = AppState::from_settings(&config).context("Failed to build HTTP client")?;
    let app = router::create(app_state, &config.application);

    let addr = format!("{}:{}", config.application.host, config.application.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!("Listening on {addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
