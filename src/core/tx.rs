//! Transaction decoder: legacy and segregated-witness formats (spec §4.4).

use super::reader::ByteReader;
use super::{reader_err_tx, CoreError, CoreResult};

/// A transaction input's previous output reference. The coinbase
/// invariant (all-zero txid, `vout == 0xFFFFFFFF`) is checked by callers
/// that need to distinguish coinbase inputs, not enforced here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outpoint {
    /// Internal (non-reversed) byte order.
    pub txid: [u8; 32],
    pub vout: u32,
}

impl Outpoint {
    pub fn is_coinbase(&self) -> bool {
        self.txid == [0u8; 32] && self.vout == 0xFFFF_FFFF
    }
}

/// A prevout supplied by the caller (single-tx mode) or decoded from an
/// undo record (block mode).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrevOut {
    pub value_sats: u64,
    pub script_pubkey: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxInput {
    pub outpoint: Outpoint,
    pub script_sig: Vec<u8>,
    pub sequence: u32,
    /// Empty when the transaction is not SegWit; one entry per input
    /// (each possibly an empty stack) when it is.
    pub witness: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutput {
    pub n: u32,
    pub value_sats: u64,
    pub script_pubkey: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub version: i32,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub locktime: u32,
    pub segwit: bool,
    /// Internal (non-reversed) byte order double-SHA256 of the
    /// non-witness serialization.
    pub txid: [u8; 32],
    /// Internal byte order double-SHA256 of the full serialization;
    /// `None` when not SegWit.
    pub wtxid: Option<[u8; 32]>,
    pub non_witness_bytes: usize,
    pub witness_bytes: usize,
    pub total_bytes: usize,
    pub weight: u64,
    pub vbytes: u64,
}

impl Transaction {
    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].outpoint.is_coinbase()
    }
}

/// Decodes one transaction starting at the reader's current position,
/// advancing it past the transaction. Used both for single-tx requests
/// (the reader wraps exactly one transaction's bytes) and for block mode
/// (the reader walks a shared buffer across many transactions).
pub fn decode(reader: &mut ByteReader) -> CoreResult<Transaction> {
    let start = reader.position();
    let version = reader.read_i32_le().map_err(reader_err_tx)?;

    let mut segwit = false;
    if reader.remaining() >= 2 {
        let marker_flag = reader.peek(2).map_err(reader_err_tx)?;
        if marker_flag[0] == 0x00 && marker_flag[1] == 0x01 {
            segwit = true;
            reader.read_u8().map_err(reader_err_tx)?;
            reader.read_u8().map_err(reader_err_tx)?;
        }
    }

    let vin_count = reader.read_varint().map_err(reader_err_tx)?;
    if vin_count == 0 {
        return Err(CoreError::InvalidTx("transaction has zero inputs".into()));
    }
    let mut inputs = Vec::with_capacity(vin_count as usize);
    for _ in 0..vin_count {
        let txid = reader.read_hash32().map_err(reader_err_tx)?;
        let vout = reader.read_u32_le().map_err(reader_err_tx)?;
        let script_sig = reader.read_varint_bytes().map_err(reader_err_tx)?;
        let sequence = reader.read_u32_le().map_err(reader_err_tx)?;
        inputs.push(TxInput {
            outpoint: Outpoint { txid, vout },
            script_sig,
            sequence,
            witness: Vec::new(),
        });
    }

    let vout_count = reader.read_varint().map_err(reader_err_tx)?;
    if vout_count == 0 {
        return Err(CoreError::InvalidTx("transaction has zero outputs".into()));
    }
    let mut outputs = Vec::with_capacity(vout_count as usize);
    for n in 0..vout_count {
        let value_sats = reader.read_u64_le().map_err(reader_err_tx)?;
        let script_pubkey = reader.read_varint_bytes().map_err(reader_err_tx)?;
        outputs.push(TxOutput {
            n: n as u32,
            value_sats,
            script_pubkey,
        });
    }

    if segwit {
        for input in inputs.iter_mut() {
            let item_count = reader.read_varint().map_err(reader_err_tx)?;
            let mut stack = Vec::with_capacity(item_count as usize);
            for _ in 0..item_count {
                stack.push(reader.read_varint_bytes().map_err(reader_err_tx)?);
            }
            input.witness = stack;
        }
    }

    let locktime = reader.read_u32_le().map_err(reader_err_tx)?;
    let total_bytes = reader.position() - start;

    let non_witness = encode_non_witness(version, &inputs, &outputs, locktime);
    let non_witness_bytes = non_witness.len();
    let txid = super::hashes::sha256d(&non_witness);

    let wtxid = if segwit {
        let full = encode_full(version, &inputs, &outputs, locktime);
        Some(super::hashes::sha256d(&full))
    } else {
        None
    };

    let witness_bytes = total_bytes - non_witness_bytes;
    let weight = 3 * non_witness_bytes as u64 + total_bytes as u64;
    let vbytes = weight.div_ceil(4);

    Ok(Transaction {
        version,
        inputs,
        outputs,
        locktime,
        segwit,
        txid,
        wtxid,
        non_witness_bytes,
        witness_bytes,
        total_bytes,
        weight,
        vbytes,
    })
}

/// Decodes a transaction from a standalone byte slice (single-tx mode).
pub fn decode_standalone(bytes: &[u8]) -> CoreResult<Transaction> {
    let mut reader = ByteReader::new(bytes);
    decode(&mut reader)
}

fn write_varint(out: &mut Vec<u8>, n: u64) {
    if n < 0xFD {
        out.push(n as u8);
    } else if n <= u16::MAX as u64 {
        out.push(0xFD);
        out.extend_from_slice(&(n as u16).to_le_bytes());
    } else if n <= u32::MAX as u64 {
        out.push(0xFE);
        out.extend_from_slice(&(n as u32).to_le_bytes());
    } else {
        out.push(0xFF);
        out.extend_from_slice(&n.to_le_bytes());
    }
}

fn encode_non_witness(version: i32, inputs: &[TxInput], outputs: &[TxOutput], locktime: u32) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&version.to_le_bytes());
    write_varint(&mut out, inputs.len() as u64);
    for input in inputs {
        out.extend_from_slice(&input.outpoint.txid);
        out.extend_from_slice(&input.outpoint.vout.to_le_bytes());
        write_varint(&mut out, input.script_sig.len() as u64);
        out.extend_from_slice(&input.script_sig);
        out.extend_from_slice(&input.sequence.to_le_bytes());
    }
    write_varint(&mut out, outputs.len() as u64);
    for output in outputs {
        out.extend_from_slice(&output.value_sats.to_le_bytes());
        write_varint(&mut out, output.script_pubkey.len() as u64);
        out.extend_from_slice(&output.script_pubkey);
    }
    out.extend_from_slice(&locktime.to_le_bytes());
    out
}

fn encode_full(version: i32, inputs: &[TxInput], outputs: &[TxOutput], locktime: u32) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&version.to_le_bytes());
    out.push(0x00);
    out.push(0x01);
    write_varint(&mut out, inputs.len() as u64);
    for input in inputs {
        out.extend_from_slice(&input.outpoint.txid);
        out.extend_from_slice(&input.outpoint.vout.to_le_bytes());
        write_varint(&mut out, input.script_sig.len() as u64);
        out.extend_from_slice(&input.script_sig);
        out.extend_from_slice(&input.sequence.to_le_bytes());
    }
    write_varint(&mut out, outputs.len() as u64);
    for output in outputs {
        out.extend_from_slice(&output.value_sats.to_le_bytes());
        write_varint(&mut out, output.script_pubkey.len() as u64);
        out.extend_from_slice(&output.script_pubkey);
    }
    for input in inputs {
        write_varint(&mut out, input.witness.len() as u64);
        for item in &input.witness {
            write_varint(&mut out, item.len() as u64);
            out.extend_from_slice(item);
        }
    }
    out.extend_from_slice(&locktime.to_le_bytes());
    out
}
