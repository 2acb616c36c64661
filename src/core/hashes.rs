//! Shared hash primitives used by the transaction decoder, merkle
//! computation, and address derivation.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// Single SHA-256.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Bitcoin's double SHA-256 (`SHA256(SHA256(x))`), used for txid/wtxid,
/// block hashes, merkle nodes, and Base58Check checksums.
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// `RIPEMD160(SHA256(x))`, used to derive P2PKH/P2SH hashes from keys and
/// redeem scripts.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let sha = sha256(data);
    let mut hasher = Ripemd160::new();
    hasher.update(sha);
    hasher.finalize().into()
}

/// Reverses a 32-byte hash for display (internal byte order -> big-endian
/// hex order used by every `txid`/`block_hash` shown to callers).
pub fn reverse32(hash: &[u8; 32]) -> [u8; 32] {
    let mut out = *hash;
    out.reverse();
    out
}
