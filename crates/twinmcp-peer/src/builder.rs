//! Peer builder.

use std::sync::Arc;

use twinmcp_protocol::ServerInfo;
use twinmcp_transport::Transport;

use crate::handler::{
    DefaultHandlers, NotificationHandler, PromptHandler, RequestHandler, ToolHandler,
};
use crate::peer::{Peer, PeerRole};
use crate::registry::{HandlerRegistry, RegistryError, RegistryHandler};
use crate::PeerError;

/// Configures and connects a [`Peer`].
///
/// Handlers are registered on the builder and become read-only once the peer
/// starts. A custom [`RequestHandler`] replaces the registry-backed one.
pub struct PeerBuilder {
    role: PeerRole,
    info: ServerInfo,
    instructions: Option<String>,
    registry: HandlerRegistry,
    registry_error: Option<RegistryError>,
    requests: Option<Arc<dyn RequestHandler>>,
    notifications: Option<Arc<dyn NotificationHandler>>,
}

impl PeerBuilder {
    fn new(role: PeerRole, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            role,
            info: ServerInfo {
                name: name.into(),
                version: version.into(),
            },
            instructions: None,
            registry: HandlerRegistry::new(),
            registry_error: None,
            requests: None,
            notifications: None,
        }
    }

    /// Starts building a client-role peer.
    #[must_use]
    pub fn client() -> Self {
        Self::new(PeerRole::Client, "twinmcp-client", env!("CARGO_PKG_VERSION"))
    }

    /// Starts building a server-role peer with the given identity.
    #[must_use]
    pub fn server(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self::new(PeerRole::Server, name, version)
    }

    /// Sets the usage instructions returned from `initialize`.
    #[must_use]
    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Registers a prompt handler. Duplicate names fail at connect time.
    #[must_use]
    pub fn prompt<H: PromptHandler + 'static>(mut self, handler: H) -> Self {
        if let Err(e) = self.registry.add_prompt(handler) {
            self.registry_error.get_or_insert(e);
        }
        self
    }

    /// Registers a tool handler. Duplicate names fail at connect time.
    #[must_use]
    pub fn tool<H: ToolHandler + 'static>(mut self, handler: H) -> Self {
        if let Err(e) = self.registry.add_tool(handler) {
            self.registry_error.get_or_insert(e);
        }
        self
    }

    /// Installs a custom request handler, replacing the registry-backed one.
    #[must_use]
    pub fn request_handler<H: RequestHandler + 'static>(mut self, handler: H) -> Self {
        self.requests = Some(Arc::new(handler));
        self
    }

    /// Installs a notification handler.
    #[must_use]
    pub fn notification_handler<H: NotificationHandler + 'static>(mut self, handler: H) -> Self {
        self.notifications = Some(Arc::new(handler));
        self
    }

    /// Connects over the given transport and spawns the peer's read loop.
    pub async fn connect<T: Transport + 'static>(self, transport: T) -> Result<Peer, PeerError> {
        if let Some(e) = self.registry_error {
            return Err(PeerError::Registry(e));
        }

        let requests: Arc<dyn RequestHandler> = match self.requests {
            Some(requests) => requests,
            None => match self.role {
                PeerRole::Server => Arc::new(RegistryHandler::new(
                    self.info,
                    self.instructions,
                    self.registry,
                )),
                PeerRole::Client => Arc::new(DefaultHandlers),
            },
        };
        let notifications = self
            .notifications
            .unwrap_or_else(|| Arc::new(DefaultHandlers));

        Peer::start(transport, self.role, requests, notifications)
            .await
            .map_err(PeerError::Transport)
    }
}
