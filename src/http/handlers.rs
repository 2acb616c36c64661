//! Route handlers for the HTTP transport (spec §6: out-of-scope thin
//! collaborator that only calls the core and serializes its result).

use axum::extract::Multipart;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::core::block::decode_blk_file;
use crate::core::report::{assemble_block_report, assemble_tx_report, match_prevouts};
use crate::core::tx::decode_standalone;
use crate::dto::{parse_prevouts, TxRequest};
use crate::errors::{AppError, ErrorEnvelope};

pub async fn health() -> Json<Value> {
    Json(json!({ "ok": true, "status": "healthy" }))
}

/// `POST /api/analyze` (spec §6.1).
pub async fn analyze(Json(request): Json<TxRequest>) -> (StatusCode, Json<Value>) {
    match analyze_inner(request) {
        Ok(body) => (StatusCode::OK, Json(body)),
        Err(err) => {
            warn!("analyze request rejected: {err}");
            let envelope = ErrorEnvelope::from(&err);
            let body = serde_json::to_value(&envelope).unwrap_or_else(|_| {
                json!({ "ok": false, "error": { "code": "INTERNAL", "message": "failed to serialize error" } })
            });
            (StatusCode::BAD_REQUEST, Json(body))
        }
    }
}

fn analyze_inner(request: TxRequest) -> Result<Value, AppError> {
    let raw_tx = hex::decode(&request.raw_tx)
        .map_err(|e| AppError::InvalidJson(format!("invalid raw_tx hex: {e}")))?;
    let tx = decode_standalone(&raw_tx)?;
    let supplied = parse_prevouts(&request)?;
    let prevouts = match_prevouts(&tx, &supplied)?;
    let report = assemble_tx_report(&tx, &prevouts);
    Ok(serde_json::to_value(report)?)
}

/// `POST /api/analyze_block` (spec §6.2): a multipart body carrying the
/// `blk`, `rev`, and `xor` fields as binary parts.
pub async fn analyze_block(mut multipart: Multipart) -> (StatusCode, Json<Value>) {
    match analyze_block_inner(&mut multipart).await {
        Ok(body) => (StatusCode::OK, Json(body)),
        Err(err) => {
            warn!("analyze_block request rejected: {err}");
            let envelope = ErrorEnvelope::from(&err);
            let body = serde_json::to_value(&envelope).unwrap_or_else(|_| {
                json!({ "ok": false, "error": { "code": "INTERNAL", "message": "failed to serialize error" } })
            });
            (StatusCode::BAD_REQUEST, Json(body))
        }
    }
}

async fn analyze_block_inner(multipart: &mut Multipart) -> Result<Value, AppError> {
    let mut blk: Option<Vec<u8>> = None;
    let mut rev: Option<Vec<u8>> = None;
    let mut xor: Vec<u8> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidJson(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidJson(format!("failed reading part {name}: {e}")))?;
        match name.as_str() {
            "blk" => blk = Some(bytes.to_vec()),
            "rev" => rev = Some(bytes.to_vec()),
            "xor" => xor = bytes.to_vec(),
            other => info!("ignoring unrecognised multipart field {other}"),
        }
    }

    let blk = blk.ok_or_else(|| AppError::InvalidJson("missing blk part".into()))?;
    let rev = rev.ok_or_else(|| AppError::InvalidJson("missing rev part".into()))?;

    let blocks = decode_blk_file(&blk, &rev, &xor)?;
    let reports: Vec<_> = blocks.iter().map(assemble_block_report).collect();
    Ok(json!({ "ok": true, "mode": "block", "blocks": reports }))
}
