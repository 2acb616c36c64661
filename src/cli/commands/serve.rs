use clap::Args;
use tracing::info;

use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};

/// Starts the HTTP transport (spec §6.6): `PORT` (default `3000`)
/// configures the listening port; no network access is used at runtime
/// beyond accepting these connections.
#[derive(Args)]
#[command(author, version, about, long_about = None)]
pub struct ServeCommand {
    /// Overrides the configured port.
    #[arg(long)]
    pub port: Option<u16>,
}

impl ServeCommand {
    pub async fn run(&self) -> AppResult<()> {
        let app_config = AppConfig::load().unwrap_or_else(|_| AppConfig::get_defaults());
        let port = self.port.unwrap_or(app_config.server.port);

        info!("starting chain-lens HTTP transport on port {port}");
        crate::http::serve(port)
            .await
            .map_err(|e| AppError::Internal(format!("HTTP server failed: {e}")))
    }
}
