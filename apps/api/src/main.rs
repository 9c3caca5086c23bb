mod auth;
mod backend;
mod characters;
mod config;
mod errors;
mod game_data;
mod models;
mod routes;
mod sheet;
mod state;
#[cfg(test)]
mod test_support;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::{run_session_sweeper, SessionStore};
use crate::backend::BackendClient;
use crate::config::Config;
use crate::game_data::GameDataClient;
use crate::routes::build_router;
use crate::sheet::{SheetAssets, SheetOptions, SheetService, SheetTemplate};
use crate::state::AppState;

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Cavern API v{}", env!("CARGO_PKG_VERSION"));

    let timeout = Duration::from_secs(config.http_timeout_secs);

    let backend = BackendClient::new(&config.backend_url, timeout)
        .context("Failed to build backend HTTP client")?;
    info!("Backend client initialized ({})", config.backend_url);

    let game_data = GameDataClient::new(&config.game_data_url, timeout)
        .context("Failed to build game-data HTTP client")?;
    info!("Game-data client initialized ({})", config.game_data_url);

    // Sheet backgrounds are decoded up front; a broken template stops startup.
    let assets = SheetAssets::load_dir(&config.sheet_assets_dir).with_context(|| {
        format!(
            "Failed to load sheet templates from {}",
            config.sheet_assets_dir.display()
        )
    })?;
    let options = SheetOptions {
        overflow: config.sheet_overflow,
        font: config.sheet_font,
    };
    let sheets = SheetService::new(assets, SheetTemplate::default(), options);
    info!(
        "Sheet service ready: overflow={:?} font={:?}",
        options.overflow, options.font
    );

    let sessions = Arc::new(SessionStore::new(chrono::Duration::minutes(
        config.session_ttl_minutes,
    )));
    tokio::spawn(run_session_sweeper(sessions.clone(), SESSION_SWEEP_INTERVAL));
    info!("Session store initialized (ttl {} min)", config.session_ttl_minutes);

    // Build app state
    let state = AppState {
        backend: Arc::new(backend),
        game_data,
        sheets,
        sessions,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the front end has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
