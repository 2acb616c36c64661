//! Fee/weight accounting and policy labelling: timelocks, RBF, SegWit
//! savings, OP_RETURN payload extraction, and warning codes (spec §4.6).

use super::script::disasm::{disassemble, Instruction};

/// `locktime == 0` / `< 500_000_000` / otherwise.
pub fn locktime_type(locktime: u32) -> &'static str {
    if locktime == 0 {
        "none"
    } else if locktime < 500_000_000 {
        "block_height"
    } else {
        "unix_timestamp"
    }
}

pub fn rbf_signaling(sequences: impl IntoIterator<Item = u32>) -> bool {
    sequences.into_iter().any(|s| s < 0xFFFF_FFFE)
}

/// BIP68 relative timelock decoded from one input's `sequence` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelativeTimelock {
    pub enabled: bool,
    /// Present (and `seconds` absent) when the timelock is block-denominated.
    pub blocks: Option<u32>,
    /// Present (and `blocks` absent) when the timelock is time-denominated
    /// (`value * 512` seconds).
    pub seconds: Option<u32>,
}

pub fn relative_timelock(sequence: u32) -> RelativeTimelock {
    if sequence & 0x8000_0000 != 0 {
        return RelativeTimelock {
            enabled: false,
            blocks: None,
            seconds: None,
        };
    }
    let value = sequence & 0xFFFF;
    if sequence & (1 << 22) != 0 {
        RelativeTimelock {
            enabled: true,
            blocks: None,
            seconds: Some(value * 512),
        }
    } else {
        RelativeTimelock {
            enabled: true,
            blocks: Some(value),
            seconds: None,
        }
    }
}

/// Rounds `value` to 2 decimal places using the same "round half away from
/// zero" behaviour as typical fee-rate display.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn fee_rate_sat_vb(fee_sats: u64, vbytes: u64) -> f64 {
    if vbytes == 0 {
        return 0.0;
    }
    round2(fee_sats as f64 / vbytes as f64)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegwitSavings {
    pub witness_bytes: usize,
    pub non_witness_bytes: usize,
    pub total_bytes: usize,
    pub weight_actual: u64,
    pub weight_if_legacy: u64,
    pub savings_pct: f64,
}

pub fn segwit_savings(
    witness_bytes: usize,
    non_witness_bytes: usize,
    total_bytes: usize,
    weight_actual: u64,
) -> SegwitSavings {
    let weight_if_legacy = 4 * total_bytes as u64;
    let savings_pct = if weight_if_legacy == 0 {
        0.0
    } else {
        round2((1.0 - weight_actual as f64 / weight_if_legacy as f64) * 100.0)
    };
    SegwitSavings {
        witness_bytes,
        non_witness_bytes,
        total_bytes,
        weight_actual,
        weight_if_legacy,
        savings_pct,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpReturnPayload {
    pub data_hex: String,
    pub data_utf8: Option<String>,
    pub protocol: &'static str,
}

/// Extracts and tags an `OP_RETURN` output's data payload (spec §4.6).
pub fn op_return_payload(script_pubkey: &[u8]) -> OpReturnPayload {
    let disasm = disassemble(script_pubkey).unwrap_or_default();
    let mut data = Vec::new();
    for instruction in disasm.instructions.iter().skip(1) {
        if let Instruction::Push(bytes) = instruction {
            data.extend_from_slice(bytes);
        }
    }

    let data_hex = hex::encode(&data);
    let data_utf8 = String::from_utf8(data).ok();
    let protocol = if data_hex.starts_with("6f6d6e69") {
        "omni"
    } else if data_hex.starts_with("0109f91102") {
        "opentimestamps"
    } else {
        "unknown"
    };

    OpReturnPayload {
        data_hex,
        data_utf8,
        protocol,
    }
}

/// The closed set of warning codes (spec §4.6), each independently toggled
/// by its own condition ("warning monotonicity", spec §8).
pub fn warnings(
    fee_sats: Option<u64>,
    fee_rate_sat_vb: Option<f64>,
    any_dust_output: bool,
    any_unknown_output: bool,
    rbf: bool,
) -> Vec<&'static str> {
    let mut out = Vec::new();
    let high_fee = fee_sats.map(|f| f > 1_000_000).unwrap_or(false)
        || fee_rate_sat_vb.map(|r| r > 200.0).unwrap_or(false);
    if high_fee {
        out.push("HIGH_FEE");
    }
    if any_dust_output {
        out.push("DUST_OUTPUT");
    }
    if any_unknown_output {
        out.push("UNKNOWN_OUTPUT_SCRIPT");
    }
    if rbf {
        out.push("RBF_SIGNALING");
    }
    out
}

pub const DUST_THRESHOLD_SATS: u64 = 546;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locktime_type_boundaries() {
        assert_eq!(locktime_type(0), "none");
        assert_eq!(locktime_type(499_999_999), "block_height");
        assert_eq!(locktime_type(500_000_000), "unix_timestamp");
    }

    #[test]
    fn rbf_true_when_any_sequence_below_max_minus_one() {
        assert!(rbf_signaling([0xFFFF_FFFD]));
        assert!(!rbf_signaling([0xFFFF_FFFE, 0xFFFF_FFFF]));
    }

    #[test]
    fn relative_timelock_disabled_when_top_bit_set() {
        let t = relative_timelock(0x8000_0000);
        assert!(!t.enabled);
    }

    #[test]
    fn relative_timelock_blocks_when_bit22_clear() {
        let t = relative_timelock(10);
        assert!(t.enabled);
        assert_eq!(t.blocks, Some(10));
        assert_eq!(t.seconds, None);
    }

    #[test]
    fn relative_timelock_time_when_bit22_set() {
        let t = relative_timelock(1 << 22 | 2);
        assert!(t.enabled);
        assert_eq!(t.seconds, Some(1024));
        assert_eq!(t.blocks, None);
    }

    #[test]
    fn fee_rate_rounds_to_two_decimals() {
        assert_eq!(fee_rate_sat_vb(100, 3), 33.33);
    }

    #[test]
    fn op_return_extracts_and_tags_unknown_protocol() {
        // OP_RETURN OP_PUSHBYTES_8 "sob-2026"
        let mut script = vec![0x6a, 0x08];
        script.extend_from_slice(b"sob-2026");
        let payload = op_return_payload(&script);
        assert_eq!(payload.data_hex, "736f622d32303236");
        assert_eq!(payload.data_utf8.as_deref(), Some("sob-2026"));
        assert_eq!(payload.protocol, "unknown");
    }

    #[test]
    fn op_return_detects_omni_protocol() {
        let data = hex::decode("6f6d6e69000000").unwrap();
        let mut script = vec![0x6a, data.len() as u8];
        script.extend_from_slice(&data);
        assert_eq!(op_return_payload(&script).protocol, "omni");
    }

    #[test]
    fn op_return_with_pushdata1_concatenates() {
        let mut script = vec![0x6a, 0x4c, 0x03];
        script.extend_from_slice(b"abc");
        let payload = op_return_payload(&script);
        assert_eq!(payload.data_hex, hex::encode(b"abc"));
    }

    #[test]
    fn warnings_toggle_independently() {
        assert_eq!(
            warnings(Some(2_000_000), Some(1.0), false, false, false),
            vec!["HIGH_FEE"]
        );
        assert_eq!(
            warnings(Some(1), Some(1.0), true, false, false),
            vec!["DUST_OUTPUT"]
        );
        assert_eq!(
            warnings(Some(1), Some(1.0), false, false, true),
            vec!["RBF_SIGNALING"]
        );
    }
}
