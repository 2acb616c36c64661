//! Mainnet address encoding: Base58Check (P2PKH/P2SH) and Bech32/Bech32m
//! (P2WPKH/P2WSH/P2TR), hand-implemented per BIP173/BIP350 — like the
//! undo-record compression scheme, these are wire-level codecs this crate
//! owns rather than delegates.

use crate::core::hashes::sha256d;

const BASE58_ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Base58Check-encodes `version_byte || payload`, appending a 4-byte
/// double-SHA256 checksum.
pub fn base58check_encode(version_byte: u8, payload: &[u8]) -> String {
    let mut data = Vec::with_capacity(1 + payload.len() + 4);
    data.push(version_byte);
    data.extend_from_slice(payload);
    let checksum = sha256d(&data);
    data.extend_from_slice(&checksum[..4]);

    let leading_zeros = data.iter().take_while(|&&b| b == 0).count();

    // Big-endian base-256 -> base-58 via repeated long division.
    let mut digits: Vec<u8> = vec![0];
    for &byte in &data {
        let mut carry = byte as u32;
        for digit in digits.iter_mut() {
            carry += (*digit as u32) << 8;
            *digit = (carry % 58) as u8;
            carry /= 58;
        }
        while carry > 0 {
            digits.push((carry % 58) as u8);
            carry /= 58;
        }
    }

    let mut out = String::with_capacity(leading_zeros + digits.len());
    out.extend(std::iter::repeat('1').take(leading_zeros));
    for &d in digits.iter().rev() {
        out.push(BASE58_ALPHABET[d as usize] as char);
    }
    out
}

const BECH32_CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";
const BECH32_CONST: u32 = 1;
const BECH32M_CONST: u32 = 0x2bc8_30a3;

fn polymod(values: &[u8]) -> u32 {
    const GEN: [u32; 5] = [
        0x3b6a_57b2,
        0x2650_8e6d,
        0x1ea1_19fa,
        0x3d42_33dd,
        0x2a14_62b3,
    ];
    let mut chk: u32 = 1;
    for &v in values {
        let top = chk >> 25;
        chk = ((chk & 0x1ff_ffff) << 5) ^ (v as u32);
        for (i, g) in GEN.iter().enumerate() {
            if (top >> i) & 1 == 1 {
                chk ^= g;
            }
        }
    }
    chk
}

fn hrp_expand(hrp: &str) -> Vec<u8> {
    let mut v = Vec::with_capacity(hrp.len() * 2 + 1);
    v.extend(hrp.bytes().map(|b| b >> 5));
    v.push(0);
    v.extend(hrp.bytes().map(|b| b & 31));
    v
}

fn create_checksum(hrp: &str, data: &[u8], const_value: u32) -> Vec<u8> {
    let mut values = hrp_expand(hrp);
    values.extend_from_slice(data);
    values.extend_from_slice(&[0u8; 6]);
    let poly = polymod(&values) ^ const_value;
    (0..6).map(|i| ((poly >> (5 * (5 - i))) & 31) as u8).collect()
}

/// Regroups a byte slice from 8-bit to 5-bit words, with padding (used by
/// both SegWit program encoding directions via `from_bits=true`).
fn convert_bits_8_to_5(data: &[u8]) -> Vec<u8> {
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let mut out = Vec::with_capacity(data.len() * 8 / 5 + 1);
    for &b in data {
        acc = (acc << 8) | b as u32;
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(((acc >> bits) & 31) as u8);
        }
    }
    if bits > 0 {
        out.push(((acc << (5 - bits)) & 31) as u8);
    }
    out
}

/// Encodes a SegWit program as Bech32 (witness version 0) or Bech32m
/// (witness version >= 1), per BIP173/BIP350.
pub fn segwit_encode(hrp: &str, witness_version: u8, program: &[u8]) -> String {
    let const_value = if witness_version == 0 {
        BECH32_CONST
    } else {
        BECH32M_CONST
    };

    let mut data = Vec::with_capacity(1 + program.len() * 8 / 5 + 1);
    data.push(witness_version);
    data.extend(convert_bits_8_to_5(program));

    let checksum = create_checksum(hrp, &data, const_value);

    let mut out = String::with_capacity(hrp.len() + 1 + data.len() + checksum.len());
    out.push_str(hrp);
    out.push('1');
    for &d in data.iter().chain(checksum.iter()) {
        out.push(BECH32_CHARSET[d as usize] as char);
    }
    out
}

pub fn p2pkh_address(hash160: &[u8; 20]) -> String {
    base58check_encode(0x00, hash160)
}

pub fn p2sh_address(hash160: &[u8; 20]) -> String {
    base58check_encode(0x05, hash160)
}

pub fn p2wpkh_address(hash160: &[u8; 20]) -> String {
    segwit_encode("bc", 0, hash160)
}

pub fn p2wsh_address(hash32: &[u8; 32]) -> String {
    segwit_encode("bc", 0, hash32)
}

pub fn p2tr_address(xonly: &[u8; 32]) -> String {
    segwit_encode("bc", 1, xonly)
}
