use std::path::PathBuf;

use anyhow::Result;
use safesafar::{SafetyConfig, telemetry, web};

#[tokio::main]
async fn main() -> Result<()> {
    // optional path to a TOML config file
    let config = match std::env::args().nth(1) {
        Some(path) => SafetyConfig::load_from_path(Some(PathBuf::from(path)))?,
        None => SafetyConfig::load()?,
    };

    let _telemetry = telemetry::init(&config.logging)?;
    tracing::info!("Starting SafeSafar {}", safesafar::VERSION);

    let state = web::build_state(&config)?;
    web::run(&config, state).await
}
