use clap::Args;
use std::fs;
use std::path::PathBuf;
use tracing::info;

use crate::config::AppConfig;
use crate::core::report::{assemble_tx_report, match_prevouts};
use crate::core::tx::decode_standalone;
use crate::dto::{parse_prevouts, TxRequest};
use crate::errors::{AppError, AppResult};

/// Analyzes a single transaction request (spec §6.1): hex-encoded raw
/// transaction plus caller-supplied prevouts, matched by `(txid, vout)`.
#[derive(Args)]
#[command(author, version, about, long_about = None)]
pub struct AnalyzeTxCommand {
    /// Path to a JSON request file shaped `{ "network", "raw_tx", "prevouts" }`.
    #[arg(long)]
    pub input: PathBuf,

    /// Output directory (overrides config.toml / CHAINLENS_OUTPUT_DIR).
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

impl AnalyzeTxCommand {
    pub fn run(&self) -> AppResult<()> {
        let app_config = AppConfig::load().unwrap_or_else(|_| AppConfig::get_defaults());
        let output_dir = self
            .output_dir
            .clone()
            .unwrap_or(app_config.output.dir.clone());

        info!("Reading single-transaction request from {}", self.input.display());
        let body = fs::read_to_string(&self.input)?;
        let request: TxRequest = serde_json::from_str(&body)?;

        let raw_tx = hex::decode(&request.raw_tx)
            .map_err(|e| AppError::InvalidJson(format!("invalid raw_tx hex: {e}")))?;
        let tx = decode_standalone(&raw_tx)?;
        let supplied = parse_prevouts(&request)?;
        let prevouts = match_prevouts(&tx, &supplied)?;
        let report = assemble_tx_report(&tx, &prevouts);

        fs::create_dir_all(&output_dir)?;
        let json = serde_json::to_string_pretty(&report)?;
        let out_path = output_dir.join(format!("{}.json", report.txid));
        fs::write(&out_path, &json)?;

        println!("{json}");
        info!("Wrote transaction report to {}", out_path.display());
        Ok(())
    }
}
