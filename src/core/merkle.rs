//! Merkle root computation (spec §4.7, §8 "Merkle determinism").

use super::hashes::sha256d;

/// Computes the merkle root of a list of txids given in internal
/// (non-reversed) byte order, per Bitcoin's pairwise double-SHA256
/// reduction with last-element duplication on odd layers.
///
/// A single-transaction block's merkle root is that transaction's txid.
pub fn compute_root(txids: &[[u8; 32]]) -> [u8; 32] {
    assert!(!txids.is_empty(), "merkle root requires at least one txid");

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
