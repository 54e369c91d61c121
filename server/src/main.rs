use anyhow::{Context, Result};
use formdrop_server::{app::build_router, config::ServerConfig, state::AppState, storage::init_temp_dir};
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    dotenvy::dotenv().ok();

    info!("Starting upload server...");

    let config = ServerConfig::from_env().context("Invalid server configuration")?;
    init_temp_dir(&config.temp_dir).context("Failed to initialize temp directory")?;

    let addr = format!("0.0.0.0:{}", config.port);
    let state = AppState::google(config)?;
    let app = build_router(state);

    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
