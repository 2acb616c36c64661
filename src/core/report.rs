//! Report assembler: wires the transaction decoder, script classifier,
//! accounting layer, and block decoder into the JSON-serializable report
//! schemas (spec §6.3, §6.4).

use std::collections::BTreeMap;

use serde::Serialize;

use super::accounting::{
    fee_rate_sat_vb, locktime_type, op_return_payload, rbf_signaling, relative_timelock,
    segwit_savings, warnings, DUST_THRESHOLD_SATS,
};
use super::block::DecodedBlock;
use super::hashes::reverse32;
use super::script::{classify_input, classify_output, derive_output_address, disassemble, OutputScriptType};
use super::tx::{Outpoint, PrevOut, Transaction, TxInput, TxOutput};
use super::{CoreError, CoreResult};

/// Address encoding and script-type tables are mainnet-only (spec §1).
pub const NETWORK: &str = "mainnet";

#[derive(Debug, Clone, Serialize)]
pub struct Warning {
    pub code: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelativeTimelockJson {
    pub enabled: bool,
    pub blocks: Option<u32>,
    pub seconds: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrevoutSummary {
    pub value_sats: u64,
    pub script_pubkey_hex: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VinReport {
    pub txid: String,
    pub vout: u32,
    pub sequence: u32,
    pub script_sig_hex: String,
    pub script_asm: String,
    pub witness: Vec<String>,
    pub script_type: String,
    pub address: Option<String>,
    pub prevout: PrevoutSummary,
    pub relative_timelock: RelativeTimelockJson,
    /// Only present for `p2wsh` / `p2sh-p2wsh` inputs (spec §6.3).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub witness_script_asm: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OpReturnFields {
    pub op_return_data_hex: String,
    pub op_return_data_utf8: Option<String>,
    pub op_return_protocol: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct VoutReport {
    pub n: u32,
    pub value_sats: u64,
    pub script_pubkey_hex: String,
    pub script_asm: String,
    pub script_type: String,
    pub address: Option<String>,
    /// Flattens to nothing for non-`op_return` outputs (spec §6.3).
    #[serde(flatten)]
    pub op_return: Option<OpReturnFields>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SegwitSavingsJson {
    pub witness_bytes: usize,
    pub non_witness_bytes: usize,
    pub total_bytes: usize,
    pub weight_actual: u64,
    pub weight_if_legacy: u64,
    pub savings_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TxReport {
    pub ok: bool,
    pub network: &'static str,
    pub segwit: bool,
    pub txid: String,
    pub wtxid: Option<String>,
    pub version: i32,
    pub locktime: u32,
    pub size_bytes: usize,
    pub weight: u64,
    pub vbytes: u64,
    pub total_input_sats: u64,
    pub total_output_sats: u64,
    pub fee_sats: Option<u64>,
    pub fee_rate_sat_vb: Option<f64>,
    pub rbf_signaling: bool,
    pub locktime_type: &'static str,
    pub locktime_value: u32,
    pub segwit_savings: Option<SegwitSavingsJson>,
    pub vin: Vec<VinReport>,
    pub vout: Vec<VoutReport>,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlockHeaderJson {
    pub version: i32,
    pub prev_block_hash: String,
    pub merkle_root: String,
    pub merkle_root_valid: bool,
    pub timestamp: u32,
    /// 8 hex characters of the 4 on-wire header bytes, not a formatted
    /// integer (spec §6.4).
    pub bits: String,
    pub nonce: u32,
    pub block_hash: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoinbaseJson {
    pub bip34_height: Option<i64>,
    pub coinbase_script_hex: String,
    pub total_output_sats: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlockStatsJson {
    pub total_fees_sats: u64,
    pub total_weight: u64,
    pub avg_fee_rate_sat_vb: f64,
    pub script_type_summary: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlockReport {
    pub ok: bool,
    pub mode: &'static str,
    pub block_header: BlockHeaderJson,
    pub tx_count: usize,
    pub coinbase: CoinbaseJson,
    pub transactions: Vec<TxReport>,
    pub block_stats: BlockStatsJson,
}

/// Matches caller-supplied prevouts to `tx`'s inputs by `(txid, vout)`
/// (spec §6.1). A coinbase input needs no supplied prevout. Every other
/// input must match exactly one supplied entry and every supplied entry
/// must be used, or the request is rejected as `INCONSISTENT_PREVOUTS`
/// (this also catches duplicate prevouts for the same outpoint: only the
/// first match consumes it, so the second is left over).
pub fn match_prevouts(tx: &Transaction, supplied: &[(Outpoint, PrevOut)]) -> CoreResult<Vec<PrevOut>> {
    let mut used = vec![false; supplied.len()];
    let mut matched = Vec::with_capacity(tx.inputs.len());

    for input in &tx.inputs {
        if input.outpoint.is_coinbase() {
            matched.push(PrevOut {
                value_sats: 0,
                script_pubkey: Vec::new(),
            });
            continue;
        }

        let mut found = None;
        for (i, (op, prevout)) in supplied.iter().enumerate() {
            if !used[i] && *op == input.outpoint {
                found = Some((i, prevout.clone()));
                break;
            }
        }

        match found {
            Some((i, prevout)) => {
                used[i] = true;
                matched.push(prevout);
            }
            None => {
                return Err(CoreError::InconsistentPrevouts(format!(
                    "no prevout supplied for input {}:{}",
                    hex::encode(reverse32(&input.outpoint.txid)),
                    input.outpoint.vout
                )));
            }
        }
    }

    if used.iter().any(|&u| !u) {
        return Err(CoreError::InconsistentPrevouts(
            "prevouts supplied that do not match any input".into(),
        ));
    }

    Ok(matched)
}

fn build_vin(input: &TxInput, prevout: &PrevOut) -> VinReport {
    let prevout_type = classify_output(&prevout.script_pubkey);
    let classification = classify_input(prevout_type, &input.script_sig, &input.witness);
    let script_asm = disassemble(&input.script_sig).map(|d| d.asm).unwrap_or_default();
    let address = derive_output_address(prevout_type, &prevout.script_pubkey);
    let rt = relative_timelock(input.sequence);

    VinReport {
        txid: hex::encode(reverse32(&input.outpoint.txid)),
        vout: input.outpoint.vout,
        sequence: input.sequence,
        script_sig_hex: hex::encode(&input.script_sig),
        script_asm,
        witness: input.witness.iter().map(hex::encode).collect(),
        script_type: classification.script_type.as_str().to_string(),
        address,
        prevout: PrevoutSummary {
            value_sats: prevout.value_sats,
            script_pubkey_hex: hex::encode(&prevout.script_pubkey),
        },
        relative_timelock: RelativeTimelockJson {
            enabled: rt.enabled,
            blocks: rt.blocks,
            seconds: rt.seconds,
        },
        witness_script_asm: classification.witness_script_asm,
    }
}

fn build_vout(output: &TxOutput) -> VoutReport {
    let ty = classify_output(&output.script_pubkey);
    let script_asm = disassemble(&output.script_pubkey).map(|d| d.asm).unwrap_or_default();
    let address = derive_output_address(ty, &output.script_pubkey);
    let op_return = (ty == OutputScriptType::OpReturn).then(|| {
        let payload = op_return_payload(&output.script_pubkey);
        OpReturnFields {
            op_return_data_hex: payload.data_hex,
            op_return_data_utf8: payload.data_utf8,
            op_return_protocol: payload.protocol,
        }
    });

    VoutReport {
        n: output.n,
        value_sats: output.value_sats,
        script_pubkey_hex: hex::encode(&output.script_pubkey),
        script_asm,
        script_type: ty.as_str().to_string(),
        address,
        op_return,
    }
}

/// Assembles a full transaction report given the transaction and one
/// already-matched prevout per input, in input order (spec §6.3).
pub fn assemble_tx_report(tx: &Transaction, prevouts: &[PrevOut]) -> TxReport {
    let is_coinbase = tx.is_coinbase();

    let total_input_sats: u64 = if is_coinbase {
        0
    } else {
        prevouts.iter().map(|p| p.value_sats).sum()
    };
    let total_output_sats: u64 = tx.outputs.iter().map(|o| o.value_sats).sum();

    let fee_sats = (!is_coinbase).then(|| total_input_sats.saturating_sub(total_output_sats));
    let fee_rate_sat_vb_val = fee_sats.map(|f| fee_rate_sat_vb(f, tx.vbytes));

    let vin: Vec<VinReport> = tx
        .inputs
        .iter()
        .zip(prevouts.iter())
        .map(|(input, prevout)| build_vin(input, prevout))
        .collect();
    let vout: Vec<VoutReport> = tx.outputs.iter().map(build_vout).collect();

    let rbf = rbf_signaling(tx.inputs.iter().map(|i| i.sequence));
    let any_dust_output = vout
        .iter()
        .any(|o| o.script_type != OutputScriptType::OpReturn.as_str() && o.value_sats < DUST_THRESHOLD_SATS);
    let any_unknown_output = vout
        .iter()
        .any(|o| o.script_type == OutputScriptType::Unknown.as_str());
    let warning_codes = warnings(fee_sats, fee_rate_sat_vb_val, any_dust_output, any_unknown_output, rbf);

    let segwit_savings_json = tx.segwit.then(|| {
        let s = segwit_savings(tx.witness_bytes, tx.non_witness_bytes, tx.total_bytes, tx.weight);
        SegwitSavingsJson {
            witness_bytes: s.witness_bytes,
            non_witness_bytes: s.non_witness_bytes,
            total_bytes: s.total_bytes,
            weight_actual: s.weight_actual,
            weight_if_legacy: s.weight_if_legacy,
            savings_pct: s.savings_pct,
        }
    });

    TxReport {
        ok: true,
        network: NETWORK,
        segwit: tx.segwit,
        txid: hex::encode(reverse32(&tx.txid)),
        wtxid: tx.wtxid.map(|w| hex::encode(reverse32(&w))),
        version: tx.version,
        locktime: tx.locktime,
        size_bytes: tx.total_bytes,
        weight: tx.weight,
        vbytes: tx.vbytes,
        total_input_sats,
        total_output_sats,
        fee_sats,
        fee_rate_sat_vb: fee_rate_sat_vb_val,
        rbf_signaling: rbf,
        locktime_type: locktime_type(tx.locktime),
        locktime_value: tx.locktime,
        segwit_savings: segwit_savings_json,
        vin,
        vout,
        warnings: warning_codes.into_iter().map(|code| Warning { code }).collect(),
    }
}

/// Assembles the block-mode report (spec §6.4): one `TxReport` per
/// transaction (coinbase included, with its placeholder prevout), plus
/// block-level header and aggregate stats.
pub fn assemble_block_report(block: &DecodedBlock) -> BlockReport {
    let transactions: Vec<TxReport> = block
        .transactions
        .iter()
        .zip(block.prevouts.iter())
        .map(|(tx, prevouts)| assemble_tx_report(tx, prevouts))
        .collect();

    let total_fees_sats: u64 = transactions.iter().filter_map(|t| t.fee_sats).sum();
    let total_weight: u64 = transactions.iter().map(|t| t.weight).sum();
    let non_coinbase_vbytes: u64 = transactions.iter().skip(1).map(|t| t.vbytes).sum();
    let avg_fee_rate_sat_vb = fee_rate_sat_vb(total_fees_sats, non_coinbase_vbytes);

    let mut script_type_summary: BTreeMap<String, u64> = BTreeMap::new();
    for tx in &transactions {
        for vout in &tx.vout {
            *script_type_summary.entry(vout.script_type.clone()).or_insert(0) += 1;
        }
    }

    BlockReport {
        ok: true,
        mode: "block",
        block_header: BlockHeaderJson {
            version: block.header.version,
            prev_block_hash: hex::encode(reverse32(&block.header.prev_block_hash)),
            merkle_root: hex::encode(reverse32(&block.header.merkle_root)),
            merkle_root_valid: block.merkle_root_valid,
            timestamp: block.header.timestamp,
            bits: hex::encode(block.header.bits.to_le_bytes()),
            nonce: block.header.nonce,
            block_hash: hex::encode(reverse32(&block.block_hash)),
        },
        tx_count: block.transactions.len(),
        coinbase: CoinbaseJson {
            bip34_height: block.bip34_height,
            coinbase_script_hex: hex::encode(&block.coinbase_script),
            total_output_sats: block.coinbase_total_output_sats,
        },
        transactions,
        block_stats: BlockStatsJson {
            total_fees_sats,
            total_weight,
            avg_fee_rate_sat_vb,
            script_type_summary,
        },
    }
}
