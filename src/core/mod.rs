//! The binary analysis engine: a pure function from bytes to a report.
//!
//! Nothing under this module touches the filesystem, the network, or an
//! async runtime — every routine here is a synchronous, deterministic
//! transform over borrowed or owned byte buffers (spec §5).

pub mod accounting;
pub mod block;
pub mod hashes;
pub mod merkle;
pub mod reader;
pub mod report;
pub mod script;
pub mod tx;
pub mod undo;

use reader::ReaderError;
use std::fmt;

/// Errors the core can raise, one variant per stable code in spec §7 that
/// the core itself is responsible for (the presentation-facing `AppError`
/// in `crate::errors` wraps these plus the two envelope-level codes that
/// only the CLI/HTTP layer can detect).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    InvalidTx(String),
    InconsistentPrevouts(String),
    InvalidBlock(String),
    InvalidUndo(String),
    InvalidCoinbase(String),
}

impl CoreError {
    /// The stable identifier from spec §7.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::InvalidTx(_) => "INVALID_TX",
            CoreError::InconsistentPrevouts(_) => "INCONSISTENT_PREVOUTS",
            CoreError::InvalidBlock(_) => "INVALID_BLOCK",
            CoreError::InvalidUndo(_) => "INVALID_UNDO",
            CoreError::InvalidCoinbase(_) => "INVALID_COINBASE",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            CoreError::InvalidTx(m)
            | CoreError::InconsistentPrevouts(m)
            | CoreError::InvalidBlock(m)
            | CoreError::InvalidUndo(m)
            | CoreError::InvalidCoinbase(m) => m,
        }
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

impl std::error::Error for CoreError {}

pub type CoreResult<T> = Result<T, CoreError>;

/// Attaches the `INVALID_TX` code to a reader failure.
pub fn reader_err_tx(e: ReaderError) -> CoreError {
    CoreError::InvalidTx(e.to_string())
}

/// Attaches the `INVALID_BLOCK` code to a reader failure.
pub fn reader_err_block(e: ReaderError) -> CoreError {
    CoreError::InvalidBlock(e.to_string())
}

/// Attaches the `INVALID_UNDO` code to a reader failure.
pub fn reader_err_undo(e: ReaderError) -> CoreError {
    CoreError::InvalidUndo(e.to_string())
}
