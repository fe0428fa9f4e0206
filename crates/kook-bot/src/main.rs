//! KOOK bot entry point
//!
//! Run with:
//! ```bash
//! cargo run -p kook-bot
//! ```
//!
//! Configuration is loaded from `.env` and environment variables.

use kook_common::{try_init_tracing_with_config, AppConfig, TracingConfig};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config = AppConfig::from_env();

    let tracing_config = config
        .as_ref()
        .map_or_else(|_| TracingConfig::default(), |c| TracingConfig::for_environment(c.app.env));
    if let Err(e) = try_init_tracing_with_config(tracing_config) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            std::process::exit(2);
        }
    };

    info!(
        name = %config.app.name,
        env = ?config.app.env,
        llm_enabled = config.llm.is_enabled(),
        "Configuration loaded"
    );

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested");
            signal.cancel();
        }
    });

    if let Err(e) = kook_bot::run(config, shutdown).await {
        error!(error = %e, code = e.error_code(), "Bot stopped");
        std::process::exit(e.exit_code());
    }
}
