//! HTTP server for the Timesheet Normalization Engine.
//!
//! Reads `TIMESHEET_ENGINE_CONFIG` (default `./config/default`) and
//! `TIMESHEET_ENGINE_ADDR` (default `0.0.0.0:3000`). Log filtering follows
//! `RUST_LOG`.

use std::env;
use std::error::Error;

use tracing::info;
use tracing_subscriber::EnvFilter;

use timesheet_engine::api::{AppState, create_router};
use timesheet_engine::config::ConfigLoader;

const DEFAULT_CONFIG_DIR: &str = "./config/default";
const DEFAULT_ADDR: &str = "0.0.0.0:3000";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_dir =
        env::var("TIMESHEET_ENGINE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_DIR.to_string());
    let addr = env::var("TIMESHEET_ENGINE_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());

    let config = ConfigLoader::load(&config_dir)?;
    info!(
        config_dir = %config_dir,
        policies = %config.config().metadata().name,
        version = %config.config().metadata().version,
        "Configuration loaded"
    );

    let router = create_router(AppState::new(config));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Timesheet engine listening");

    axum::serve(listener, router).await?;
    Ok(())
}
