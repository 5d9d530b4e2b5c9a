//! The symmetric MCP peer.
//!
//! A [`Peer`] is a bidirectional JSON-RPC participant: the same code path
//! serves the client and the server role. It owns a framed transport,
//! correlates outgoing requests with responses through monotonic ids,
//! dispatches incoming requests to a typed [`RequestHandler`], and feeds
//! notifications to a [`NotificationHandler`].
//!
//! # Example
//!
//! ```ignore
//! use twinmcp_peer::{Peer, PeerBuilder};
//! use twinmcp_transport::StdioTransport;
//!
//! #[tokio::main]
//! async fn main() {
//!     let peer = PeerBuilder::server("demo", "1.0.0")
//!         .tool(Add)
//!         .prompt(Greet)
//!         .connect(StdioTransport::stdio())
//!         .await
//!         .expect("connect");
//!     peer.closed().await;
//! }
//! ```

#![forbid(unsafe_code)]

mod builder;
mod client;
mod handler;
mod pagination;
mod peer;
mod pending;
mod registry;

pub use builder::PeerBuilder;
pub use handler::{
    DefaultHandlers, IntoCallToolResult, IntoPromptResult, NotificationHandler, PromptHandler,
    RequestHandler, ToolHandler,
};
pub use pagination::{
    PageQuery, Pages, PromptPages, ResourcePages, ResourceTemplatePages, ToolPages,
};
pub use peer::{Peer, PeerRole};
pub use registry::{HandlerRegistry, RegistryError, RegistryHandler};

use twinmcp_core::McpError;
use twinmcp_transport::TransportError;

/// Error surfaced by the typed peer API.
///
/// The low-level peer raises [`TransportError`] only; remote protocol errors
/// travel inside the returned response. The typed wrappers unwrap them into
/// [`PeerError::Rpc`] so callers can treat them as failures.
#[derive(Debug)]
pub enum PeerError {
    /// The transport failed or closed before the response arrived.
    Transport(TransportError),
    /// The remote peer answered with an error response.
    Rpc(McpError),
    /// Handler registration failed before the peer started.
    Registry(RegistryError),
}

impl std::fmt::Display for PeerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PeerError::Transport(e) => write!(f, "transport error: {e}"),
            PeerError::Rpc(e) => write!(f, "rpc error: {e}"),
            PeerError::Registry(e) => write!(f, "registry error: {e}"),
        }
    }
}

impl std::error::Error for PeerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PeerError::Transport(e) => Some(e),
            PeerError::Rpc(e) => Some(e),
            PeerError::Registry(e) => Some(e),
        }
    }
}

impl From<TransportError> for PeerError {
    fn from(err: TransportError) -> Self {
        PeerError::Transport(err)
    }
}

impl From<McpError> for PeerError {
    fn from(err: McpError) -> Self {
        PeerError::Rpc(err)
    }
}
