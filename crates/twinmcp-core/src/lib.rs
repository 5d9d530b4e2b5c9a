//! Core types shared by every twinmcp crate.
//!
//! This crate provides:
//! - The protocol error taxonomy ([`McpError`], [`McpErrorCode`])
//! - The logging facade plumbing ([`logging`])
//!
//! # Design Principles
//!
//! - Errors carry the JSON-RPC code they map to at the wire boundary
//! - No logger is ever installed here; applications pick their backend
//! - All types support `Send + Sync`

#![forbid(unsafe_code)]

mod error;
pub mod logging;

pub use error::{McpError, McpErrorCode, McpResult};
