//! End-to-end coverage of the HTTP transport (spec §6.1, §6.2, §6.5,
//! §6.6): drives the real `axum` router in-process via `tower::Service`,
//! no socket involved.

#[path = "support.rs"]
mod support;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use chain_lens::http::router;
use support::{build_legacy_tx, p2pkh_script, TxInputSpec, TxOutputSpec};

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let app = router();
    let response = app
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn analyze_endpoint_returns_tx_report() {
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
        0,
    );
    let mut displayed_txid = prev_txid;
    displayed_txid.reverse();
    let request_body = serde_json::json!({
        "network": "mainnet",
        "raw_tx": hex::encode(&raw_tx),
        "prevouts": [{
            "txid": hex::encode(displayed_txid),
            "vout": 0,
            "value_sats": 1000,
            "script_pubkey_hex": hex::encode(p2pkh_script(0x11)),
        }],
    });

    let app = router();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/analyze")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&request_body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["fee_sats"], 100);
}

#[tokio::test]
async fn analyze_endpoint_rejects_malformed_hex_with_error_envelope() {
    let request_body = serde_json::json!({
        "network": "mainnet",
        "raw_tx": "not-hex",
        "prevouts": [],
    });

    let app = router();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/analyze")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&request_body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"]["code"], "INVALID_JSON");
}

#[tokio::test]
async fn analyze_block_endpoint_accepts_multipart_triple() {
    let (blk, rev) = support::build_single_block(710_000);

    let boundary = "chainlens-test-boundary";
    let mut body = Vec::new();
    for (name, bytes) in [("blk", blk.as_slice()), ("rev", rev.as_slice()), ("xor", &[])] {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"; filename=\"{name}.dat\"\r\n").as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    let app = router();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/analyze_block")
                .header("content-type", format!("multipart/form-data; boundary={boundary}"))
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["blocks"].as_array().unwrap().len(), 1);
    assert_eq!(body["blocks"][0]["block_header"]["merkle_root_valid"], true);
}

#[tokio::test]
async fn analyze_block_endpoint_rejects_missing_rev_part() {
    let boundary = "chainlens-test-boundary-2";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Disposition: form-data; name=\"blk\"; filename=\"blk.dat\"\r\n");
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(&[0u8; 4]);
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    let app = router();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/analyze_block")
                .header("content-type", format!("multipart/form-data; boundary={boundary}"))
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "INVALID_JSON");
}
