//! Chain Lens: a Bitcoin wire-format analysis engine.
//!
//! `core` is the pure binary analysis engine (spec §1-§5); everything
//! else is a thin collaborator around it (CLI, HTTP transport, config,
//! error envelope, request DTOs).

pub mod cli;
pub mod config;
pub mod core;
pub mod dto;
pub mod errors;
pub mod http;
