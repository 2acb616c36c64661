#![allow(dead_code)]

//! Application-wide error type - single point of truth.
//!
//! `AppError` is the presentation-facing wrapper: it adds the two
//! envelope-only codes the core cannot detect (`INVALID_JSON`,
//! `INVALID_FIXTURE`) to the core's own `CoreError` codes, and renders the
//! `{ "ok": false, "error": {...} }` envelope (spec §6.5, §7).

use crate::core::CoreError;
use serde::Serialize;
use thiserror::Error;

/// Application-wide error type - single point of truth
#[derive(Error, Debug)]
pub enum AppError {
    /// The analysis engine itself rejected the input.
    #[error("{0}")]
    Core(#[from] CoreError),

    /// The request envelope (JSON body) was malformed or had the wrong shape.
    #[error("invalid request: {0}")]
    InvalidJson(String),

    /// A fixture referenced by a fixture-driven test was missing or malformed.
    #[error("invalid fixture: {0}")]
    InvalidFixture(String),

    /// `--strict` block-mode post-check: at least one decoded block's
    /// merkle root did not match its header (spec §9, §10).
    #[error("merkle root mismatch: {0}")]
    MerkleMismatch(String),

    /// Reading/writing the CLI's output files failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),

    /// Any other failure that does not fit a stable code above.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// The stable identifier from spec §7.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Core(e) => e.code(),
            AppError::InvalidJson(_) => "INVALID_JSON",
            AppError::InvalidFixture(_) => "INVALID_FIXTURE",
            AppError::MerkleMismatch(_) => "MERKLE_MISMATCH",
            AppError::Io(_) => "INTERNAL",
            AppError::Config(_) => "INTERNAL",
            AppError::Internal(_) => "INTERNAL",
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidJson(err.to_string())
    }
}

/// Application-wide result type - single point of truth
pub type AppResult<T> = Result<T, AppError>;

/// The wire shape of `{ "ok": false, "error": {...} }` (spec §6.5): both
/// fields are always non-empty strings.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub ok: bool,
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl From<&AppError> for ErrorEnvelope {
    fn from(err: &AppError) -> Self {
        ErrorEnvelope {
            ok: false,
            error: ErrorBody {
                code: err.code(),
                message: err.to_string(),
            },
        }
    }
}
