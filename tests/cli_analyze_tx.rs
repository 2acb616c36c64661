//! End-to-end coverage of `chain-lens analyze-tx` (spec §6.1, §6.3, §6.6):
//! a JSON request file in, a `<txid>.json` report file out.

#[path = "support.rs"]
mod support;

use std::fs;

use chain_lens::cli::commands::analyze_tx::AnalyzeTxCommand;
use chain_lens::errors::AppError;
use support::{build_legacy_tx, build_taproot_keypath_tx, p2pkh_script, TxInputSpec, TxOutputSpec};

fn write_request(dir: &std::path::Path, raw_tx: &[u8], prevouts: serde_json::Value) -> std::path::PathBuf {
    let request = serde_json::json!({
        "network": "mainnet",
        "raw_tx": hex::encode(raw_tx),
        "prevouts": prevouts,
    });
    let path = dir.join("request.json");
    fs::write(&path, serde_json::to_vec(&request).unwrap()).unwrap();
    path
}

#[test]
fn analyzes_legacy_p2pkh_transaction_with_locktime() {
    let tmp = tempfile::tempdir().unwrap();
    let prev_txid = [0xAB; 32];
    let raw_tx = build_legacy_tx(
        &[TxInputSpec {
            prev_txid,
            vout: 0,
            script_sig: Vec::new(),
            sequence: 0xFFFF_FFFF,
        }],
        &[TxOutputSpec {
            value_sats: 900,
            script_pubkey: p2pkh_script(0x22),
        }],
        800_000,
    );
    let mut displayed_txid = prev_txid;
    displayed_txid.reverse();

    let prevouts = serde_json::json!([{
        "txid": hex::encode(displayed_txid),
        "vout": 0,
        "value_sats": 1000,
        "script_pubkey_hex": hex::encode(p2pkh_script(0x11)),
    }]);
    let input = write_request(tmp.path(), &raw_tx, prevouts);

    let command = AnalyzeTxCommand {
        input,
        output_dir: Some(tmp.path().join("out")),
    };
    command.run().expect("analysis succeeds");

    let entries: Vec<_> = fs::read_dir(tmp.path().join("out")).unwrap().collect();
    assert_eq!(entries.len(), 1);
    let report_path = entries[0].as_ref().unwrap().path();
    let report: serde_json::Value =
        serde_json::from_slice(&fs::read(&report_path).unwrap()).unwrap();
    assert_eq!(report["ok"], true);
    assert_eq!(report["locktime_type"], "block_height");
    assert_eq!(report["fee_sats"], 100);
    assert_eq!(report["vin"][0]["script_type"], "p2pkh");
}

#[test]
fn analyzes_taproot_keypath_spend() {
    let tmp = tempfile::tempdir().unwrap();
    let prev_txid = [0xCD; 32];
    let mut taproot_script = vec![0x51, 0x20];
    taproot_script.extend_from_slice(&[0x99; 32]);
    let raw_tx = build_taproot_keypath_tx(
        prev_txid,
        TxOutputSpec {
            value_sats: 5000,
            script_pubkey: p2pkh_script(0x44),
        },
        0,
    );
    let mut displayed_txid = prev_txid;
    displayed_txid.reverse();

    let prevouts = serde_json::json!([{
        "txid": hex::encode(displayed_txid),
        "vout": 0,
        "value_sats": 6000,
        "script_pubkey_hex": hex::encode(&taproot_script),
    }]);
    let input = write_request(tmp.path(), &raw_tx, prevouts);

    let command = AnalyzeTxCommand {
        input,
        output_dir: Some(tmp.path().join("out")),
    };
    command.run().expect("analysis succeeds");

    let entries: Vec<_> = fs::read_dir(tmp.path().join("out")).unwrap().collect();
    let report_path = entries[0].as_ref().unwrap().path();
    let report: serde_json::Value =
        serde_json::from_slice(&fs::read(&report_path).unwrap()).unwrap();
    assert!(report["segwit"].as_bool().unwrap());
    assert_eq!(report["vin"][0]["script_type"], "p2tr_keypath");
    assert!(report["segwit_savings"].is_object());
}

#[test]
fn rbf_signaling_sequence_is_reported() {
    let tmp = tempfile::tempdir().unwrap();
    let prev_txid = [0xEE; 32];
    let raw_tx = build_legacy_tx(
        &[TxInputSpec {
            prev_txid,
            vout: 2,
            script_sig: Vec::new(),
            sequence: 0xFFFF_FFFD, // < 0xFFFFFFFE: RBF-signaling (BIP125)
        }],
        &[TxOutputSpec {
            value_sats: 1000,
            script_pubkey: p2pkh_script(0x55),
        }],
        0,
    );
    let mut displayed_txid = prev_txid;
    displayed_txid.reverse();
    let prevouts = serde_json::json!([{
        "txid": hex::encode(displayed_txid),
        "vout": 2,
        "value_sats": 1100,
        "script_pubkey_hex": hex::encode(p2pkh_script(0x66)),
    }]);
    let input = write_request(tmp.path(), &raw_tx, prevouts);

    let command = AnalyzeTxCommand {
        input,
        output_dir: Some(tmp.path().join("out")),
    };
    command.run().unwrap();

    let entries: Vec<_> = fs::read_dir(tmp.path().join("out")).unwrap().collect();
    let report: serde_json::Value =
        serde_json::from_slice(&fs::read(entries[0].as_ref().unwrap().path()).unwrap()).unwrap();
    assert_eq!(report["rbf_signaling"], true);
}

#[test]
fn op_return_output_is_reported_without_address() {
    let tmp = tempfile::tempdir().unwrap();
    let prev_txid = [0x12; 32];
    let raw_tx = build_legacy_tx(
        &[TxInputSpec {
            prev_txid,
            vout: 0,
            script_sig: Vec::new(),
            sequence: 0xFFFF_FFFF,
        }],
        &[support::TxOutputSpec {
            value_sats: 0,
            script_pubkey: support::op_return_script(b"sob-2026"),
        }],
        0,
    );
    let mut displayed_txid = prev_txid;
    displayed_txid.reverse();
    let prevouts = serde_json::json!([{
        "txid": hex::encode(displayed_txid),
        "vout": 0,
        "value_sats": 1000,
        "script_pubkey_hex": hex::encode(p2pkh_script(0x77)),
    }]);
    let input = write_request(tmp.path(), &raw_tx, prevouts);

    let command = AnalyzeTxCommand {
        input,
        output_dir: Some(tmp.path().join("out")),
    };
    command.run().unwrap();

    let entries: Vec<_> = fs::read_dir(tmp.path().join("out")).unwrap().collect();
    let report: serde_json::Value =
        serde_json::from_slice(&fs::read(entries[0].as_ref().unwrap().path()).unwrap()).unwrap();
    assert_eq!(report["vout"][0]["script_type"], "op_return");
    assert!(report["vout"][0]["address"].is_null());
    assert_eq!(report["vout"][0]["op_return_data_utf8"], "sob-2026");
}

#[test]
fn dust_output_below_threshold_emits_warning() {
    let tmp = tempfile::tempdir().unwrap();
    let prev_txid = [0x13; 32];
    let raw_tx = build_legacy_tx(
        &[TxInputSpec {
            prev_txid,
            vout: 0,
            script_sig: Vec::new(),
            sequence: 0xFFFF_FFFF,
        }],
        &[TxOutputSpec {
            value_sats: 100, // below the 546-sat dust threshold
            script_pubkey: p2pkh_script(0x88),
        }],
        0,
    );
    let mut displayed_txid = prev_txid;
    displayed_txid.reverse();
    let prevouts = serde_json::json!([{
        "txid": hex::encode(displayed_txid),
        "vout": 0,
        "value_sats": 200,
        "script_pubkey_hex": hex::encode(p2pkh_script(0x99)),
    }]);
    let input = write_request(tmp.path(), &raw_tx, prevouts);

    let command = AnalyzeTxCommand {
        input,
        output_dir: Some(tmp.path().join("out")),
    };
    command.run().unwrap();

    let entries: Vec<_> = fs::read_dir(tmp.path().join("out")).unwrap().collect();
    let report: serde_json::Value =
        serde_json::from_slice(&fs::read(entries[0].as_ref().unwrap().path()).unwrap()).unwrap();
    let warnings: Vec<String> = report["warnings"]
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w["code"].as_str().unwrap().to_string())
        .collect();
    assert!(warnings.contains(&"DUST_OUTPUT".to_string()));
}

#[test]
fn missing_prevout_is_rejected_as_inconsistent_prevouts() {
    let tmp = tempfile::tempdir().unwrap();
    let raw_tx = build_legacy_tx(
        &[TxInputSpec {
            prev_txid: [0x14; 32],
            vout: 0,
            script_sig: Vec::new(),
            sequence: 0xFFFF_FFFF,
        }],
        &[TxOutputSpec {
            value_sats: 1000,
            script_pubkey: p2pkh_script(0x01),
        }],
        0,
    );
    let input = write_request(tmp.path(), &raw_tx, serde_json::json!([]));

    let command = AnalyzeTxCommand {
        input,
        output_dir: Some(tmp.path().join("out")),
    };
    let err = command.run().unwrap_err();
    assert_eq!(err.code(), "INCONSISTENT_PREVOUTS");
    match err {
        AppError::Core(_) => {}
        other => panic!("expected a wrapped CoreError, got {other:?}"),
    }
}

#[test]
fn malformed_request_json_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("bad_request.json");
    fs::write(&input, b"{not valid json").unwrap();

    let command = AnalyzeTxCommand {
        input,
        output_dir: Some(tmp.path().join("out")),
    };
    let err = command.run().unwrap_err();
    assert_eq!(err.code(), "INVALID_JSON");
}
