//! The peer core.
//!
//! Owns the transport, allocates correlation ids, runs the background read
//! loop, and dispatches incoming frames. Incoming frames are processed
//! serially on the read-loop task; handlers are awaited inline, so a peer
//! never races its own handlers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::watch;
use tokio::task::AbortHandle;

use twinmcp_core::logging::{debug, error, info, targets, warn};
use twinmcp_core::{McpError, McpResult};
use twinmcp_protocol::{
    Direction, ErrorObject, FrameError, Message, Notification, NotificationMessage, Request,
    RequestId, RequestMethod, Response,
};
use twinmcp_transport::{LineSink, LineSource, Transport, TransportError};

use crate::handler::{NotificationHandler, RequestHandler};
use crate::pending::PendingRequests;

/// Which role this peer plays in the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerRole {
    /// The connecting side: calls tools and prompts, serves roots/sampling.
    Client,
    /// The serving side: serves tools and prompts, may call back for
    /// roots/sampling.
    Server,
}

impl PeerRole {
    /// Returns true if a request traveling in `direction` may be served by
    /// this role.
    fn serves(self, direction: Direction) -> bool {
        match direction {
            Direction::Either => true,
            Direction::ClientToServer => self == PeerRole::Server,
            Direction::ServerToClient => self == PeerRole::Client,
        }
    }
}

pub(crate) struct PeerInner {
    role: PeerRole,
    next_id: AtomicU64,
    pending: PendingRequests,
    sink: tokio::sync::Mutex<Box<dyn LineSink>>,
    requests: Arc<dyn RequestHandler>,
    notifications: Arc<dyn NotificationHandler>,
    closed: watch::Sender<bool>,
}

/// A symmetric MCP peer.
///
/// Cloning is cheap; clones share the underlying connection.
#[derive(Clone)]
pub struct Peer {
    inner: Arc<PeerInner>,
    read_loop: AbortHandle,
}

impl Peer {
    /// Connects a peer over the given transport and spawns its read loop.
    pub(crate) async fn start<T: Transport + 'static>(
        mut transport: T,
        role: PeerRole,
        requests: Arc<dyn RequestHandler>,
        notifications: Arc<dyn NotificationHandler>,
    ) -> Result<Peer, TransportError> {
        transport.connect().await?;
        let (source, sink) = transport.into_split();

        let inner = Arc::new(PeerInner {
            role,
            next_id: AtomicU64::new(1),
            pending: PendingRequests::new(),
            sink: tokio::sync::Mutex::new(sink),
            requests,
            notifications,
            closed: watch::channel(false).0,
        });

        let loop_inner = Arc::clone(&inner);
        let handle = tokio::spawn(read_loop(source, loop_inner));

        Ok(Peer {
            inner,
            read_loop: handle.abort_handle(),
        })
    }

    /// Returns this peer's role.
    #[must_use]
    pub fn role(&self) -> PeerRole {
        self.inner.role
    }

    /// Returns true once the transport has closed or failed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        *self.inner.closed.borrow()
    }

    /// Sends a request and awaits its response.
    ///
    /// The returned [`Response`] may itself carry an `error` member; only
    /// transport failures surface as `Err`. Dropping the returned future
    /// before completion abandons the pending entry.
    pub async fn send_request(&self, method: RequestMethod) -> Result<Response, TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }

        let id = RequestId::String(
            self.inner
                .next_id
                .fetch_add(1, Ordering::Relaxed)
                .to_string(),
        );

        // Register before writing: a response racing the writer must find
        // its awaiter.
        let receiver = self.inner.pending.register(id.clone());
        let mut guard = PendingGuard {
            pending: &self.inner.pending,
            id: Some(id.clone()),
        };

        let request = method
            .into_request(id)
            .map_err(TransportError::Encode)?;
        let line = Message::Request(request)
            .encode()
            .map_err(TransportError::Encode)?;

        self.inner.write_line(&line).await?;

        match receiver.await {
            Ok(response) => {
                guard.disarm();
                Ok(response)
            }
            Err(_) => {
                guard.disarm();
                Err(TransportError::Closed)
            }
        }
    }

    /// Sends a notification. Fire-and-forget.
    pub async fn send_notification(
        &self,
        notification: NotificationMessage,
    ) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        let message = Message::Notification(Notification {
            method: notification.name().to_owned(),
            params: notification.params_value().map_err(TransportError::Encode)?,
        });
        let line = message.encode().map_err(TransportError::Encode)?;
        self.inner.write_line(&line).await
    }

    /// Closes the peer: fails all pending requests, closes the transport,
    /// and stops the read loop.
    pub async fn close(&self) {
        if self.inner.closed.send_replace(true) {
            return;
        }
        info!(target: targets::PEER, "Closing peer");
        self.inner.pending.fail_all();
        self.read_loop.abort();
        let mut sink = self.inner.sink.lock().await;
        if let Err(e) = sink.close().await {
            debug!(target: targets::PEER, "Transport close failed: {e}");
        }
    }

    /// Resolves once the peer has closed (locally or because the transport
    /// ended).
    pub async fn closed(&self) {
        let mut rx = self.inner.closed.subscribe();
        let _ = rx.wait_for(|closed| *closed).await;
    }
}

/// Removes the pending entry when the caller's future is dropped before a
/// response arrives.
struct PendingGuard<'a> {
    pending: &'a PendingRequests,
    id: Option<RequestId>,
}

impl PendingGuard<'_> {
    fn disarm(&mut self) {
        self.id = None;
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            self.pending.forget(&id);
        }
    }
}

/// Reads frames until end-of-stream or error, handing each to the peer.
///
/// Handler failures never stop the loop; only transport-level failures do.
async fn read_loop(mut source: Box<dyn LineSource>, inner: Arc<PeerInner>) {
    loop {
        match source.read_line().await {
            Ok(Some(line)) => {
                inner.handle_line(&line).await;
            }
            Ok(None) => {
                info!(target: targets::TRANSPORT, "Transport reached end-of-stream");
                break;
            }
            Err(e) => {
                error!(target: targets::TRANSPORT, "Transport error: {e}");
                break;
            }
        }
        if *inner.closed.borrow() {
            break;
        }
    }
    inner.shutdown();
}

impl PeerInner {
    async fn write_line(&self, line: &str) -> Result<(), TransportError> {
        let mut sink = self.sink.lock().await;
        sink.write_line(line).await
    }

    fn shutdown(&self) {
        self.closed.send_replace(true);
        self.pending.fail_all();
    }

    /// Classifies and dispatches one incoming frame. Never fails.
    async fn handle_line(&self, line: &str) {
        match Message::decode(line) {
            Ok(Message::Response(response)) => {
                if !self.pending.complete(response) {
                    warn!(target: targets::PEER, "Response for unknown request id dropped");
                }
            }
            Ok(Message::Request(request)) => self.handle_request(request).await,
            Ok(Message::Notification(notification)) => {
                self.handle_notification(notification).await;
            }
            Err(FrameError::ResultAndError { .. }) => {
                warn!(
                    target: targets::CODEC,
                    "Frame with both result and error dropped"
                );
            }
            Err(err @ FrameError::Malformed { .. }) => {
                warn!(target: targets::CODEC, "Malformed frame dropped: {err}");
            }
            Err(err) => {
                // Parse error: reply -32700 when an id could be extracted,
                // drop otherwise.
                match err.id().cloned() {
                    Some(id) => {
                        warn!(target: targets::CODEC, "Unparseable frame with id {id}: {err}");
                        let response = Response::error(
                            id,
                            ErrorObject::from(McpError::parse_error(err.to_string())),
                        );
                        self.reply(response).await;
                    }
                    None => {
                        warn!(target: targets::CODEC, "Unparseable frame dropped: {err}");
                    }
                }
            }
        }
    }

    /// Invokes the typed handler and always replies, even on error.
    async fn handle_request(&self, request: Request) {
        debug!(target: targets::PEER, "Handling request: {}", request.method);
        let id = request.id.clone();
        let result = self.dispatch_request(request).await;
        let response = match result {
            Ok(value) => Response::success(id, value),
            Err(e) => Response::error(id, ErrorObject::from(e)),
        };
        self.reply(response).await;
    }

    async fn reply(&self, response: Response) {
        match Message::Response(response).encode() {
            Ok(line) => {
                if let Err(e) = self.write_line(&line).await {
                    error!(target: targets::TRANSPORT, "Failed to send response: {e}");
                }
            }
            Err(e) => {
                error!(target: targets::CODEC, "Failed to encode response: {e}");
            }
        }
    }

    async fn dispatch_request(&self, request: Request) -> McpResult<serde_json::Value> {
        let method = RequestMethod::parse(&request.method, request.params)?;

        // Wrong-direction requests are indistinguishable from unknown
        // methods at this peer.
        if !self.role.serves(method.direction()) {
            return Err(McpError::method_not_found(method.name()));
        }

        let invocation = std::panic::AssertUnwindSafe(self.invoke(method));
        match invocation.catch_unwind().await {
            Ok(result) => result,
            Err(payload) => Err(McpError::internal_error(panic_message(&payload))),
        }
    }

    async fn invoke(&self, method: RequestMethod) -> McpResult<serde_json::Value> {
        let handler = &self.requests;
        match method {
            RequestMethod::Initialize(p) => to_value(handler.initialize(p).await?),
            RequestMethod::Ping => {
                handler.ping().await?;
                Ok(serde_json::json!({}))
            }
            RequestMethod::ToolsList(p) => to_value(handler.list_tools(p).await?),
            RequestMethod::ToolsCall(p) => to_value(handler.call_tool(p).await?),
            RequestMethod::PromptsList(p) => to_value(handler.list_prompts(p).await?),
            RequestMethod::PromptsGet(p) => to_value(handler.get_prompt(p).await?),
            RequestMethod::ResourcesList(p) => to_value(handler.list_resources(p).await?),
            RequestMethod::ResourceTemplatesList(p) => {
                to_value(handler.list_resource_templates(p).await?)
            }
            RequestMethod::ResourcesRead(p) => to_value(handler.read_resource(p).await?),
            RequestMethod::ResourcesSubscribe(p) => {
                handler.subscribe_resource(p).await?;
                Ok(serde_json::json!({}))
            }
            RequestMethod::ResourcesUnsubscribe(p) => {
                handler.unsubscribe_resource(p).await?;
                Ok(serde_json::json!({}))
            }
            RequestMethod::RootsList => to_value(handler.list_roots().await?),
            RequestMethod::SamplingCreateMessage(p) => to_value(handler.create_message(p).await?),
            RequestMethod::LoggingSetLevel(p) => {
                handler.set_logging_level(p).await?;
                Ok(serde_json::json!({}))
            }
            RequestMethod::CompletionComplete(p) => to_value(handler.complete(p).await?),
        }
    }

    /// Invokes the notification handler; failures are logged and swallowed.
    async fn handle_notification(&self, notification: Notification) {
        let parsed = match NotificationMessage::parse(&notification.method, notification.params) {
            Ok(parsed) => parsed,
            Err(e) => {
                // JSON-RPC rule: notifications never reply.
                debug!(
                    target: targets::PEER,
                    "Ignoring notification '{}': {e}", notification.method
                );
                return;
            }
        };

        let handlers = &self.notifications;
        let result = match parsed {
            NotificationMessage::Initialized => handlers.on_initialized().await,
            NotificationMessage::Cancelled(p) => handlers.on_cancelled(p).await,
            NotificationMessage::Progress(p) => handlers.on_progress(p).await,
            NotificationMessage::LogMessage(p) => handlers.on_log_message(p).await,
            NotificationMessage::PromptsListChanged => handlers.on_prompts_list_changed().await,
            NotificationMessage::ResourcesListChanged => {
                handlers.on_resources_list_changed().await
            }
            NotificationMessage::ResourceUpdated(p) => handlers.on_resource_updated(p).await,
            NotificationMessage::RootsListChanged => handlers.on_roots_list_changed().await,
            NotificationMessage::ToolsListChanged => handlers.on_tools_list_changed().await,
        };

        if let Err(e) = result {
            error!(
                target: targets::HANDLER,
                "Notification handler failed: {e}"
            );
        }
    }
}

fn to_value<T: serde::Serialize>(value: T) -> McpResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| McpError::internal_error(e.to_string()))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    eprintln!("DEBUG payload type_id = {:?}", payload.type_id());
    eprintln!("DEBUG is &str = {}", payload.is::<&str>());
    eprintln!("DEBUG is String = {}", payload.is::<String>());
    eprintln!("DEBUG is Box<str> = {}", payload.is::<Box<str>>());
    eprintln!(
        "DEBUG is Box<dyn Any+Send> = {}",
        payload.is::<Box<dyn std::any::Any + Send>>()
    );
    eprintln!(
        "DEBUG is std::boxed::Box<String> = {}",
        payload.is::<Box<String>>()
    );
    eprintln!(
        "DEBUG is std::string::String type_id cmp {:?} vs {:?}",
        std::any::TypeId::of::<String>(),
        payload.type_id()
    );
    if let Some(inner) = payload.downcast_ref::<Box<dyn std::any::Any + Send>>() {
        eprintln!("DEBUG inner is &str = {}", inner.is::<&str>());
        eprintln!("DEBUG inner is String = {}", inner.is::<String>());
        if let Some(s) = inner.downcast_ref::<&str>() {
            eprintln!("DEBUG inner &str value = {s}");
        }
    }
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("handler panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("handler panicked: {s}")
    } else {
        "handler panicked".to_owned()
    }
}
