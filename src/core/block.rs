//! Block-file and undo-file decoding: XOR de-obfuscation, header/tx
//! walking, merkle verification, undo pairing, and coinbase analysis
//! (spec §4.7).

use super::hashes::sha256d;
use super::merkle::compute_root;
use super::reader::ByteReader;
use super::tx::{PrevOut, Transaction};
use super::{reader_err_block, tx, undo, CoreError, CoreResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    pub version: i32,
    /// Internal (non-reversed) byte order.
    pub prev_block_hash: [u8; 32],
    /// Internal (non-reversed) byte order, as read from the wire.
    pub merkle_root: [u8; 32],
    pub timestamp: u32,
    pub bits: u32,
    pub nonce: u32,
}

fn encode_header(h: &BlockHeader) -> [u8; 80] {
    let mut out = [0u8; 80];
    out[0..4].copy_from_slice(&h.version.to_le_bytes());
    out[4..36].copy_from_slice(&h.prev_block_hash);
    out[36..68].copy_from_slice(&h.merkle_root);
    out[68..72].copy_from_slice(&h.timestamp.to_le_bytes());
    out[72..76].copy_from_slice(&h.bits.to_le_bytes());
    out[76..80].copy_from_slice(&h.nonce.to_le_bytes());
    out
}

fn decode_header(reader: &mut ByteReader) -> CoreResult<BlockHeader> {
    Ok(BlockHeader {
        version: reader.read_i32_le().map_err(reader_err_block)?,
        prev_block_hash: reader.read_hash32().map_err(reader_err_block)?,
        merkle_root: reader.read_hash32().map_err(reader_err_block)?,
        timestamp: reader.read_u32_le().map_err(reader_err_block)?,
        bits: reader.read_u32_le().map_err(reader_err_block)?,
        nonce: reader.read_u32_le().map_err(reader_err_block)?,
    })
}

/// A fully decoded block paired with its undo records.
pub struct DecodedBlock {
    pub header: BlockHeader,
    /// Internal (non-reversed) byte order.
    pub block_hash: [u8; 32],
    pub merkle_root_valid: bool,
    pub transactions: Vec<Transaction>,
    /// One entry per transaction, each with one `PrevOut` per input in
    /// input order; the coinbase's single entry is a zero-value placeholder.
    pub prevouts: Vec<Vec<PrevOut>>,
    pub bip34_height: Option<i64>,
    pub coinbase_script: Vec<u8>,
    pub coinbase_total_output_sats: u64,
}

/// XORs `buf` in place with `key` repeated, skipping entirely when `key`
/// is empty or all-zero (spec §4.7).
pub fn xor_unmask(buf: &mut [u8], key: &[u8]) {
    if key.is_empty() || key.iter().all(|&b| b == 0) {
        return;
    }
    for (i, b) in buf.iter_mut().enumerate() {
        *b ^= key[i % key.len()];
    }
}

/// Decodes every block in `blk`, pairing each against the matching entry
/// in `rev`, after XOR-unmasking both with `xor_key`.
pub fn decode_blk_file(blk: &[u8], rev: &[u8], xor_key: &[u8]) -> CoreResult<Vec<DecodedBlock>> {
    let mut blk_buf = blk.to_vec();
    let mut rev_buf = rev.to_vec();
    xor_unmask(&mut blk_buf, xor_key);
    xor_unmask(&mut rev_buf, xor_key);

    let mut blk_reader = ByteReader::new(&blk_buf);
    let mut rev_reader = ByteReader::new(&rev_buf);
    let mut blocks = Vec::new();

    loop {
        if blk_reader.remaining() < 8 {
            break;
        }
        let magic = blk_reader.peek(4).map_err(reader_err_block)?;
        if magic == [0, 0, 0, 0] {
            break;
        }
        blk_reader.read_bytes(4).map_err(reader_err_block)?; // magic, not enforced
        let _length = blk_reader.read_u32_le().map_err(reader_err_block)?;

        let header = decode_header(&mut blk_reader)?;
        let tx_count = blk_reader.read_varint().map_err(reader_err_block)?;
        if tx_count == 0 {
            return Err(CoreError::InvalidBlock("block has zero transactions".into()));
        }
        let mut transactions = Vec::with_capacity(tx_count as usize);
        for _ in 0..tx_count {
            transactions.push(tx::decode(&mut blk_reader)?);
        }

        let txids: Vec<[u8; 32]> = transactions.iter().map(|t| t.txid).collect();
        let computed_root = compute_root(&txids);
        let merkle_root_valid = computed_root == header.merkle_root;
        let block_hash = sha256d(&encode_header(&header));

        let mut prevouts = Vec::with_capacity(transactions.len());
        // Coinbase has no real prevout; a single placeholder keeps this
        // vector's shape (one entry per input) uniform for the assembler.
        prevouts.push(vec![PrevOut {
            value_sats: 0,
            script_pubkey: Vec::new(),
        }]);
        for t in transactions.iter().skip(1) {
            undo::ensure_not_empty(&rev_reader)?;
            let records = undo::decode_tx_undo(&mut rev_reader)?;
            if records.len() != t.inputs.len() {
                return Err(CoreError::InvalidUndo(format!(
                    "undo record count {} does not match input count {} for txid {}",
                    records.len(),
                    t.inputs.len(),
                    hex::encode(t.txid)
                )));
            }
            prevouts.push(records);
        }

        let (bip34_height, coinbase_script) = decode_coinbase(&transactions[0])?;
        let coinbase_total_output_sats: u64 =
            transactions[0].outputs.iter().map(|o| o.value_sats).sum();

        blocks.push(DecodedBlock {
            header,
            block_hash,
            merkle_root_valid,
            transactions,
            prevouts,
            bip34_height,
            coinbase_script,
            coinbase_total_output_sats,
        });
    }

    Ok(blocks)
}

/// Decodes the BIP34 height push from a coinbase transaction's
/// `script_sig`, and validates the coinbase outpoint shape (spec §4.7).
fn decode_coinbase(tx: &Transaction) -> CoreResult<(Option<i64>, Vec<u8>)> {
    if !tx.is_coinbase() {
        return Err(CoreError::InvalidCoinbase(
            "transaction does not have the required single all-zero outpoint".into(),
        ));
    }
    let script_sig = &tx.inputs[0].script_sig;
    let disasm = super::script::disasm::disassemble(script_sig)
        .map_err(|e| CoreError::InvalidCoinbase(e.to_string()))?;

    let height = match disasm.instructions.first() {
        Some(super::script::Instruction::Op(0x00)) => Some(0i64),
        Some(super::script::Instruction::Op(op)) if (0x51..=0x60).contains(op) => {
            Some((*op - 0x50) as i64)
        }
        Some(super::script::Instruction::Push(bytes)) if bytes.len() <= 8 => {
            Some(decode_script_num(bytes))
        }
        _ => None,
    };

    Ok((height, script_sig.clone()))
}

/// Minimal CScriptNum decode: little-endian magnitude with the MSB of the
/// final byte as the sign flag.
fn decode_script_num(bytes: &[u8]) -> i64 {
    if bytes.is_empty() {
        return 0;
    }
    let mut result: i64 = 0;
    for (i, &b) in bytes.iter().enumerate() {
        result |= (b as i64) << (8 * i);
    }
    let last = bytes.len() - 1;
    if bytes[last] & 0x80 != 0 {
        result &= !(0x80i64 << (8 * last));
        result = -result;
    }
    result
}
