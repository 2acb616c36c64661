//! Cursor over an immutable byte buffer with Bitcoin's primitive wire decoders.

use byteorder::{ByteOrder, LittleEndian};
use std::fmt;

/// Failure reading a primitive from the underlying buffer.
///
/// Deliberately free of any "which decoder" context — callers attach the
/// right stable error code (`INVALID_TX`, `INVALID_BLOCK`, `INVALID_UNDO`)
/// for the routine they're inside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderError {
    /// Fewer bytes remained than the read required.
    Truncated { wanted: usize, remaining: usize },
    /// A VarInt used a longer prefix than its value required.
    NonCanonicalVarInt,
}

impl fmt::Display for ReaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReaderError::Truncated { wanted, remaining } => write!(
                f,
                "unexpected end of buffer: wanted {wanted} bytes, {remaining} remaining"
            ),
            ReaderError::NonCanonicalVarInt => write!(f, "non-canonical VarInt encoding"),
        }
    }
}

impl std::error::Error for ReaderError {}

pub type ReaderResult<T> = Result<T, ReaderError>;

/// Cursor over a borrowed byte slice. Never copies the underlying buffer.
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        ByteReader { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> ReaderResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(ReaderError::Truncated {
                wanted: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Returns the next `n` bytes without advancing the cursor.
    pub fn peek(&self, n: usize) -> ReaderResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(ReaderError::Truncated {
                wanted: n,
                remaining: self.remaining(),
            });
        }
        Ok(&self.buf[self.pos..self.pos + n])
    }

    pub fn read_u8(&mut self) -> ReaderResult<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16_le(&mut self) -> ReaderResult<u16> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    pub fn read_u32_le(&mut self) -> ReaderResult<u32> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    pub fn read_u64_le(&mut self) -> ReaderResult<u64> {
        Ok(LittleEndian::read_u64(self.take(8)?))
    }

    pub fn read_i32_le(&mut self) -> ReaderResult<i32> {
        Ok(LittleEndian::read_i32(self.take(4)?))
    }

    /// Reads exactly `n` bytes and returns an owned copy.
    pub fn read_bytes(&mut self, n: usize) -> ReaderResult<Vec<u8>> {
        Ok(self.take(n)?.to_vec())
    }

    /// Reads a fixed 32-byte hash (txid, block hash, merkle root, ...).
    pub fn read_hash32(&mut self) -> ReaderResult<[u8; 32]> {
        let slice = self.take(32)?;
        let mut out = [0u8; 32];
        out.copy_from_slice(slice);
        Ok(out)
    }

    /// Bitcoin "compact size" VarInt: 0x00-0xFC direct, 0xFD+u16, 0xFE+u32, 0xFF+u64.
    /// Rejects non-canonical encodings (a value that fit in a shorter prefix).
    pub fn read_varint(&mut self) -> ReaderResult<u64> {
        let prefix = self.read_u8()?;
        match prefix {
            0xFD => {
                let v = self.read_u16_le()? as u64;
                if v < 0xFD {
                    return Err(ReaderError::NonCanonicalVarInt);
                }
                Ok(v)
            }
            0xFE => {
                let v = self.read_u32_le()? as u64;
                if v <= u16::MAX as u64 {
                    return Err(ReaderError::NonCanonicalVarInt);
                }
                Ok(v)
            }
            0xFF => {
                let v = self.read_u64_le()?;
                if v <= u32::MAX as u64 {
                    return Err(ReaderError::NonCanonicalVarInt);
                }
                Ok(v)
            }
            n => Ok(n as u64),
        }
    }

    /// Reads a VarInt-prefixed byte string.
    pub fn read_varint_bytes(&mut self) -> ReaderResult<Vec<u8>> {
        let len = self.read_varint()? as usize;
        self.read_bytes(len)
    }
}
