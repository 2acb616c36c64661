//! Shared byte-level fixture builders for the CLI / HTTP integration tests.
//!
//! Every helper here hand-assembles wire bytes field by field, the same
//! way the core decoder's own `#[cfg(test)]` fixtures do, just at a
//! larger granularity (whole transactions and blocks rather than single
//! records).

use chain_lens::core::hashes::sha256d;

pub fn p2pkh_script(byte: u8) -> Vec<u8> {
    let mut s = vec![0x76, 0xa9, 0x14];
    s.extend_from_slice(&[byte; 20]);
    s.extend_from_slice(&[0x88, 0xac]);
    s
}

pub fn op_return_script(data: &[u8]) -> Vec<u8> {
    let mut s = vec![0x6a, data.len() as u8];
    s.extend_from_slice(data);
    s
}

fn write_varint(out: &mut Vec<u8>, n: u64) {
    if n < 0xFD {
        out.push(n as u8);
    } else if n <= u16::MAX as u64 {
        out.push(0xFD);
        out.extend_from_slice(&(n as u16).to_le_bytes());
    } else {
        out.push(0xFE);
        out.extend_from_slice(&(n as u32).to_le_bytes());
    }
}

pub struct TxInputSpec {
    pub prev_txid: [u8; 32],
    pub vout: u32,
    pub script_sig: Vec<u8>,
    pub sequence: u32,
}

pub struct TxOutputSpec {
    pub value_sats: u64,
    pub script_pubkey: Vec<u8>,
}

/// Assembles a legacy (non-SegWit) transaction from explicit inputs/outputs.
pub fn build_legacy_tx(inputs: &[TxInputSpec], outputs: &[TxOutputSpec], locktime: u32) -> Vec<u8> {
    let mut tx = Vec::new();
    tx.extend_from_slice(&1i32.to_le_bytes());
    write_varint(&mut tx, inputs.len() as u64);
    for input in inputs {
        tx.extend_from_slice(&input.prev_txid);
        tx.extend_from_slice(&input.vout.to_le_bytes());
        write_varint(&mut tx, input.script_sig.len() as u64);
        tx.extend_from_slice(&input.script_sig);
        tx.extend_from_slice(&input.sequence.to_le_bytes());
    }
    write_varint(&mut tx, outputs.len() as u64);
    for output in outputs {
        tx.extend_from_slice(&output.value_sats.to_le_bytes());
        write_varint(&mut tx, output.script_pubkey.len() as u64);
        tx.extend_from_slice(&output.script_pubkey);
    }
    tx.extend_from_slice(&locktime.to_le_bytes());
    tx
}

/// Assembles a single-input, single-output SegWit v1 (Taproot keypath)
/// spending transaction: the witness carries one 64-byte Schnorr signature.
pub fn build_taproot_keypath_tx(prev_txid: [u8; 32], output: TxOutputSpec, locktime: u32) -> Vec<u8> {
    let mut tx = Vec::new();
    tx.extend_from_slice(&2i32.to_le_bytes());
    tx.push(0x00); // marker
    tx.push(0x01); // flag
    tx.push(1); // vin_count
    tx.extend_from_slice(&prev_txid);
    tx.extend_from_slice(&0u32.to_le_bytes());
    tx.push(0); // empty script_sig
    tx.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
    tx.push(1); // vout_count
    tx.extend_from_slice(&output.value_sats.to_le_bytes());
    write_varint(&mut tx, output.script_pubkey.len() as u64);
    tx.extend_from_slice(&output.script_pubkey);
    tx.push(1); // witness item count
    tx.push(64);
    tx.extend_from_slice(&[0x7A; 64]);
    tx.extend_from_slice(&locktime.to_le_bytes());
    tx
}

/// A Bitcoin Core 7-bit-continuation VarInt, as used inside undo records
/// (spec §4.5); the inverse of the core's private `read_compressed_varint`.
pub fn write_compressed_varint(n: u64) -> Vec<u8> {
    let mut tmp: Vec<u8> = Vec::new();
    let mut n = n;
    loop {
        let flag = if tmp.is_empty() { 0x00 } else { 0x80 };
        tmp.push((n & 0x7F) as u8 | flag);
        if n <= 0x7F {
            break;
        }
        n = (n >> 7) - 1;
    }
    tmp.reverse();
    tmp
}

/// Builds one undo record for a P2PKH prevout (`nSize == 0`) with
/// `value_sats == 0`, optionally including the first-in-parent version field.
pub fn build_undo_record(is_first_in_parent: bool, pubkey_hash: u8) -> Vec<u8> {
    let mut rec = Vec::new();
    rec.extend_from_slice(&write_compressed_varint(0)); // height_code = 0 (not coinbase, height 0)
    if is_first_in_parent {
        rec.extend_from_slice(&write_compressed_varint(0)); // tx version
    }
    rec.extend_from_slice(&write_compressed_varint(0)); // compressed amount 0 -> decompresses to 0
    rec.push(0x00); // nSize 0: p2pkh
    rec.extend_from_slice(&[pubkey_hash; 20]);
    rec
}

/// Builds the undo bytes for one non-coinbase transaction with `input_count`
/// inputs, each a P2PKH prevout.
pub fn build_tx_undo(input_count: usize, pubkey_hash: u8) -> Vec<u8> {
    let mut out = Vec::new();
    write_varint(&mut out, input_count as u64);
    for i in 0..input_count {
        out.extend_from_slice(&build_undo_record(i == 0, pubkey_hash));
    }
    out
}

fn encode_header(
    version: i32,
    prev_block_hash: [u8; 32],
    merkle_root: [u8; 32],
    timestamp: u32,
    bits: u32,
    nonce: u32,
) -> [u8; 80] {
    let mut out = [0u8; 80];
    out[0..4].copy_from_slice(&version.to_le_bytes());
    out[4..36].copy_from_slice(&prev_block_hash);
    out[36..68].copy_from_slice(&merkle_root);
    out[68..72].copy_from_slice(&timestamp.to_le_bytes());
    out[72..76].copy_from_slice(&bits.to_le_bytes());
    out[76..80].copy_from_slice(&nonce.to_le_bytes());
    out
}

fn compute_merkle_root(txids: &[[u8; 32]]) -> [u8; 32] {
    let mut layer: Vec<[u8; 32]> = txids.to_vec();
    while layer.len() > 1 {
        if layer.len() % 2 == 1 {
            let last = *layer.last().unwrap();
            layer.push(last);
        }
        layer = layer
            .chunks_exact(2)
            .map(|pair| {
                let mut concat = Vec::with_capacity(64);
                concat.extend_from_slice(&pair[0]);
                concat.extend_from_slice(&pair[1]);
                sha256d(&concat)
            })
            .collect();
    }
    layer[0]
}

fn txid_of(non_witness_legacy_bytes: &[u8]) -> [u8; 32] {
    sha256d(non_witness_legacy_bytes)
}

/// A self-consistent one-block fixture: a coinbase plus one P2PKH-spending
/// transaction, a correctly computed merkle root, and a matching undo
/// buffer. Returns `(blk_bytes, rev_bytes)`; `xor_key` is left to the
/// caller since it's applied orthogonally.
pub fn build_single_block(bip34_height: u32) -> (Vec<u8>, Vec<u8>) {
    let mut coinbase_script_sig = Vec::new();
    coinbase_script_sig.push(3); // push 3 bytes (little-endian height)
    let h = bip34_height.to_le_bytes();
    coinbase_script_sig.extend_from_slice(&h[0..3]);

    let coinbase = build_legacy_tx(
        &[TxInputSpec {
            prev_txid: [0u8; 32],
            vout: 0xFFFF_FFFF,
            script_sig: coinbase_script_sig,
            sequence: 0xFFFF_FFFF,
        }],
        &[TxOutputSpec {
            value_sats: 5_000_000_000,
            script_pubkey: p2pkh_script(0xAA),
        }],
        0,
    );

    let spend = build_legacy_tx(
        &[TxInputSpec {
            prev_txid: [0x11; 32],
            vout: 0,
            script_sig: Vec::new(),
            sequence: 0xFFFF_FFFF,
        }],
        &[TxOutputSpec {
            value_sats: 900,
            script_pubkey: p2pkh_script(0xBB),
        }],
        0,
    );

    let coinbase_txid = txid_of(&coinbase);
    let spend_txid = txid_of(&spend);
    let merkle_root = compute_merkle_root(&[coinbase_txid, spend_txid]);

    let header = encode_header(1, [0u8; 32], merkle_root, 1_700_000_000, 0x1d00ffff, 0);

    let mut blk = Vec::new();
    blk.extend_from_slice(&[0xF9, 0xBE, 0xB4, 0xD9]); // magic (not enforced)
    let mut body = Vec::new();
    body.extend_from_slice(&header);
    write_varint(&mut body, 2); // tx_count
    body.extend_from_slice(&coinbase);
    body.extend_from_slice(&spend);
    blk.extend_from_slice(&(body.len() as u32).to_le_bytes());
    blk.extend_from_slice(&body);

    let rev = build_tx_undo(1, 0x11);

    (blk, rev)
}
