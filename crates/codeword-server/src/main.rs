//! Runs a Codeword server.
//!
//! Environment:
//! - `CODEWORD_BIND`: listen address, default `0.0.0.0:8080`
//! - `CODEWORD_TURN_SECS`: turn length in seconds, default 60
//! - `RUST_LOG`: log filter, default `codeword=info,codeword_room=info`

use std::time::Duration;

use codeword::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_BIND: &str = "0.0.0.0:8080";
const DEFAULT_LOG_FILTER: &str = "codeword=info,codeword_room=info";

fn game_config() -> GameConfig {
    let mut config = GameConfig::default();
    if let Ok(raw) = std::env::var("CODEWORD_TURN_SECS") {
        match raw.trim().parse::<u64>() {
            Ok(secs) => config.turn_duration = Duration::from_secs(secs),
            Err(e) => warn!(value = %raw, error = %e, "ignoring invalid CODEWORD_TURN_SECS"),
        }
    }
    config
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let bind = std::env::var("CODEWORD_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
    let config = game_config();
    info!(%bind, turn_secs = config.turn_duration.as_secs(), "starting Codeword server");

    let server = CodewordServer::builder()
        .bind(&bind)
        .game_config(config)
        .build()
        .await?;
    server.run().await?;
    Ok(())
}
