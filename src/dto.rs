//! Request envelopes for the single-transaction and block external
//! interfaces (spec §6.1, §6.2), shared by the CLI and the HTTP transport.
//!
//! These are pure data-transfer shapes: parsing them into the core's
//! `Outpoint`/`PrevOut` types is the only logic here, everything else is
//! the core's job.

use serde::Deserialize;

use crate::core::tx::{Outpoint, PrevOut};
use crate::errors::{AppError, AppResult};

#[derive(Debug, Clone, Deserialize)]
pub struct PrevoutRequest {
    pub txid: String,
    pub vout: u32,
    pub value_sats: u64,
    pub script_pubkey_hex: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TxRequest {
    #[allow(dead_code)]
    pub network: String,
    pub raw_tx: String,
    #[serde(default)]
    pub prevouts: Vec<PrevoutRequest>,
}

/// Reverses a displayed txid hex string back to the internal byte order
/// every hash is decoded and hashed in (spec §3: "displayed hashes ... are
/// reverse-byte order of their internal 32-byte forms").
pub fn txid_hex_to_internal(s: &str) -> AppResult<[u8; 32]> {
    let mut bytes =
        hex::decode(s).map_err(|e| AppError::InvalidJson(format!("invalid txid hex: {e}")))?;
    if bytes.len() != 32 {
        return Err(AppError::InvalidJson(format!(
            "txid must decode to 32 bytes, got {}",
            bytes.len()
        )));
    }
    bytes.reverse();
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes);
    Ok(out)
}

/// Parses the request's `prevouts` array into `(Outpoint, PrevOut)` pairs
/// ready for `core::report::match_prevouts`.
pub fn parse_prevouts(request: &TxRequest) -> AppResult<Vec<(Outpoint, PrevOut)>> {
    request
        .prevouts
        .iter()
        .map(|p| {
            let txid = txid_hex_to_internal(&p.txid)?;
            let script_pubkey = hex::decode(&p.script_pubkey_hex).map_err(|e| {
                AppError::InvalidJson(format!("invalid script_pubkey_hex: {e}"))
            })?;
            Ok((
                Outpoint {
                    txid,
                    vout: p.vout,
                },
                PrevOut {
                    value_sats: p.value_sats,
                    script_pubkey,
                },
            ))
        })
        .collect()
}
