//! oscline gateway
//!
//! - UDP listener on `socket.listen` (config path: first argument, default
//!   `oscline.yaml`)
//! - Every datagram is classified, bundles flattened, and messages logged
//! - Ctrl-C stops the receive loop after the current datagram

use tracing_subscriber::{fmt, EnvFilter};

use oscline_core::error::Result;
use oscline_gateway::{app_state::AppState, config, transport::OscSocket};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "oscline-gateway failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "oscline.yaml".to_string());
    let cfg = config::load_from_file(&path)?;
    let state = AppState::new(cfg)?;

    let socket = OscSocket::bind(&state.cfg().socket, state.dispatcher()).await?;
    tracing::info!(local = %socket.local_addr()?, "oscline-gateway listening");

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown requested");
    socket.stop().await?;

    tracing::debug!(metrics = %state.metrics().render(), "final counters");
    Ok(())
}
