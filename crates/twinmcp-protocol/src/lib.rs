//! MCP protocol types and JSON-RPC implementation.
//!
//! This crate provides:
//! - The three-variant JSON-RPC 2.0 message envelope
//! - Frame classification (request / response / notification)
//! - The closed method registry with direction annotations
//! - MCP-specific data types (tools, prompts, resources, sampling)
//!
//! # Wire Format
//!
//! All messages are newline-delimited JSON (NDJSON). Each frame is exactly
//! one JSON object with `jsonrpc` fixed to `"2.0"`; null fields are omitted.

#![forbid(unsafe_code)]

mod codec;
mod jsonrpc;
mod messages;
mod method;
mod types;

pub use codec::FrameError;
pub use jsonrpc::{
    ErrorObject, Message, Notification, Request, RequestId, Response, JSONRPC_VERSION,
};
pub use messages::*;
pub use method::{Direction, NotificationMessage, RequestMethod};
pub use types::*;
