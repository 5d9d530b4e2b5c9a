//! twinmcp: a symmetric Model Context Protocol runtime.
//!
//! One [`Peer`] type serves both the client and the server role over any
//! newline-framed byte transport. The `#[prompt]` and `#[tool]` attribute
//! macros turn plain functions into validated handlers registered on a
//! [`PeerBuilder`].
//!
//! # Example
//!
//! ```ignore
//! use twinmcp::prelude::*;
//!
//! #[tool(description = "Add two numbers")]
//! fn add(a: f64, b: f64) -> String {
//!     format!("{}", a + b)
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let peer = PeerBuilder::server("adder", "1.0.0")
//!         .tool(Add)
//!         .connect(StdioTransport::stdio())
//!         .await
//!         .expect("connect");
//!     peer.closed().await;
//! }
//! ```

#![forbid(unsafe_code)]

pub use twinmcp_core::{logging, McpError, McpErrorCode, McpResult};
pub use twinmcp_macros::{prompt, tool};
pub use twinmcp_peer::{
    DefaultHandlers, HandlerRegistry, IntoCallToolResult, IntoPromptResult, NotificationHandler,
    PageQuery, Pages, Peer, PeerBuilder, PeerError, PeerRole, PromptHandler, PromptPages,
    RegistryError, RegistryHandler, RequestHandler, ResourcePages, ResourceTemplatePages,
    ToolHandler, ToolPages,
};
pub use twinmcp_protocol::*;
pub use twinmcp_transport::{
    LineReader, LineSink, LineSource, LineWriter, StdioTransport, StreamTransport, Transport,
    TransportError, DEFAULT_MAX_FRAME_LEN,
};

// Generated code references these through the facade.
pub use serde;
pub use serde_json;

/// Everything a typical application needs.
pub mod prelude {
    pub use crate::{
        prompt, tool, CallToolResult, ClientCapabilities, ClientInfo, Content, McpError,
        McpResult, NotificationHandler, Peer, PeerBuilder, PeerError, Prompt, PromptMessage,
        RequestHandler, Role, StdioTransport, StreamTransport, Tool,
    };
}
