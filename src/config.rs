use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Application configuration loaded from `chainlens.toml` or environment
/// variables (spec §6.6: `PORT` configures the HTTP port, default `3000`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 3000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory the CLI writes `<txid>.json` / `<block_hash>.json` reports
    /// into (spec §6.6); created if missing.
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("out"),
        }
    }
}

impl AppConfig {
    /// Load configuration from `chainlens.toml` (if present) and
    /// environment variables. Environment variables take precedence over
    /// file configuration; a bare `PORT` variable overrides
    /// `CHAINLENS_SERVER_PORT` for compatibility with plain container
    /// deployments that only set `PORT`.
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = ServerConfig::default();
        let output_defaults = OutputConfig::default();

        let config = Config::builder()
            .set_default("server.port", defaults.port as i64)?
            .set_default(
                "output.dir",
                output_defaults.dir.to_string_lossy().into_owned(),
            )?
            .add_source(File::with_name("chainlens").required(false))
            .add_source(config::Environment::with_prefix("CHAINLENS").separator("_"))
            .build()?;

        let mut app_config: AppConfig = config.try_deserialize()?;

        if let Ok(port) = env::var("PORT") {
            if let Ok(port) = port.parse::<u16>() {
                app_config.server.port = port;
            }
        }

        Ok(app_config)
    }

    /// Configuration with built-in defaults, used when no `chainlens.toml`
    /// or environment overrides are present.
    pub fn get_defaults() -> Self {
        Self {
            server: ServerConfig::default(),
            output: OutputConfig::default(),
        }
    }
}
