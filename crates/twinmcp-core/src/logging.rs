//! Structured logging for twinmcp.
//!
//! All crates log through the standard [`log`] facade; the runtime never
//! installs an implementation. Applications initialize whatever backend they
//! prefer (env_logger, simple_logger, ...).
//!
//! # Log Levels
//!
//! - **error**: transport failures, unrecoverable peer errors
//! - **warn**: dropped frames, responses for unknown ids
//! - **info**: peer lifecycle (connect, close)
//! - **debug**: request/notification dispatch
//! - **trace**: wire-level frame contents
//!
//! # Log Targets
//!
//! Hierarchical targets allow filtering, e.g.
//! `RUST_LOG=twinmcp::peer=debug,twinmcp::transport=trace`.

// Re-export log macros for ergonomic use
pub use log::{debug, error, info, trace, warn};

// Re-export log level types for programmatic use
pub use log::{Level, LevelFilter};

/// Log targets used by twinmcp components.
///
/// Use these constants with the `target:` argument to log macros
/// for consistent filtering.
pub mod targets {
    /// Root target for all twinmcp logs.
    pub const TWINMCP: &str = "twinmcp";

    /// Peer lifecycle, dispatch, and correlation.
    pub const PEER: &str = "twinmcp::peer";

    /// Transport layer (stdio, TCP, in-memory).
    pub const TRANSPORT: &str = "twinmcp::transport";

    /// Frame encoding/decoding.
    pub const CODEC: &str = "twinmcp::codec";

    /// Prompt and tool handler execution.
    pub const HANDLER: &str = "twinmcp::handler";
}
