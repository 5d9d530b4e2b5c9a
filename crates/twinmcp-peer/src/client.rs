//! Typed request and notification helpers.
//!
//! Thin wrappers over [`Peer::send_request`] that build the typed method
//! envelope, unwrap the response's error member into [`PeerError::Rpc`], and
//! deserialize the result. Both roles use the same peer; the server-initiated
//! calls (`roots/list`, `sampling/createMessage`) live here too.

use serde::de::DeserializeOwned;

use twinmcp_core::McpError;
use twinmcp_protocol::{
    CallToolParams, CallToolResult, CancelledParams, ClientCapabilities, ClientInfo,
    CompleteArgument, CompleteParams, CompleteResult, CreateMessageParams, CreateMessageResult,
    GetPromptParams, GetPromptResult, InitializeParams, InitializeResult, JsonObject,
    ListPromptsParams, ListPromptsResult, ListResourceTemplatesParams,
    ListResourceTemplatesResult, ListResourcesParams, ListResourcesResult, ListRootsResult,
    ListToolsParams, ListToolsResult, LogLevel, LogMessageParams, NotificationMessage,
    ProgressParams, ReadResourceParams, ReadResourceResult, Reference, RequestId, RequestMethod,
    ResourceUpdatedParams, SetLogLevelParams, SubscribeResourceParams, UnsubscribeResourceParams,
    PROTOCOL_VERSION,
};

use crate::peer::Peer;
use crate::PeerError;

impl Peer {
    /// Sends a request and deserializes its successful result.
    async fn request<T: DeserializeOwned>(&self, method: RequestMethod) -> Result<T, PeerError> {
        let response = self.send_request(method).await?;
        eprintln!("DEBUG response = {response:?}");
        let value = response.into_result().map_err(McpError::from)?;
        serde_json::from_value(value)
            .map_err(|e| PeerError::Rpc(McpError::internal_error(format!("malformed result: {e}"))))
    }

    /// Sends a request whose result carries no data.
    async fn request_empty(&self, method: RequestMethod) -> Result<(), PeerError> {
        let response = self.send_request(method).await?;
        response.into_result().map_err(McpError::from)?;
        Ok(())
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Sends `initialize` with this protocol version.
    pub async fn initialize(
        &self,
        client_info: ClientInfo,
        capabilities: ClientCapabilities,
    ) -> Result<InitializeResult, PeerError> {
        self.request(RequestMethod::Initialize(InitializeParams {
            protocol_version: PROTOCOL_VERSION.to_owned(),
            capabilities,
            client_info,
        }))
        .await
    }

    /// Performs the full handshake: `initialize` followed by the
    /// `notifications/initialized` notification.
    pub async fn handshake(
        &self,
        client_info: ClientInfo,
        capabilities: ClientCapabilities,
    ) -> Result<InitializeResult, PeerError> {
        let result = self.initialize(client_info, capabilities).await?;
        self.send_notification(NotificationMessage::Initialized)
            .await?;
        Ok(result)
    }

    /// Sends `ping`.
    pub async fn ping(&self) -> Result<(), PeerError> {
        self.request_empty(RequestMethod::Ping).await
    }

    // ========================================================================
    // Tools
    // ========================================================================

    /// Sends `tools/list` for one page.
    pub async fn list_tools(&self, cursor: Option<String>) -> Result<ListToolsResult, PeerError> {
        self.request(RequestMethod::ToolsList(ListToolsParams { cursor }))
            .await
    }

    /// Sends `tools/call`.
    pub async fn call_tool(
        &self,
        name: impl Into<String>,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, PeerError> {
        self.request(RequestMethod::ToolsCall(CallToolParams {
            name: name.into(),
            arguments,
        }))
        .await
    }

    // ========================================================================
    // Prompts
    // ========================================================================

    /// Sends `prompts/list` for one page.
    pub async fn list_prompts(
        &self,
        cursor: Option<String>,
    ) -> Result<ListPromptsResult, PeerError> {
        self.request(RequestMethod::PromptsList(ListPromptsParams { cursor }))
            .await
    }

    /// Sends `prompts/get`.
    pub async fn get_prompt(
        &self,
        name: impl Into<String>,
        arguments: Option<JsonObject>,
    ) -> Result<GetPromptResult, PeerError> {
        self.request(RequestMethod::PromptsGet(GetPromptParams {
            name: name.into(),
            arguments,
        }))
        .await
    }

    // ========================================================================
    // Resources
    // ========================================================================

    /// Sends `resources/list` for one page.
    pub async fn list_resources(
        &self,
        cursor: Option<String>,
    ) -> Result<ListResourcesResult, PeerError> {
        self.request(RequestMethod::ResourcesList(ListResourcesParams { cursor }))
            .await
    }

    /// Sends `resources/templates/list` for one page.
    pub async fn list_resource_templates(
        &self,
        cursor: Option<String>,
    ) -> Result<ListResourceTemplatesResult, PeerError> {
        self.request(RequestMethod::ResourceTemplatesList(
            ListResourceTemplatesParams { cursor },
        ))
        .await
    }

    /// Sends `resources/read`.
    pub async fn read_resource(
        &self,
        uri: impl Into<String>,
    ) -> Result<ReadResourceResult, PeerError> {
        self.request(RequestMethod::ResourcesRead(ReadResourceParams {
            uri: uri.into(),
        }))
        .await
    }

    /// Sends `resources/subscribe`.
    pub async fn subscribe_resource(&self, uri: impl Into<String>) -> Result<(), PeerError> {
        self.request_empty(RequestMethod::ResourcesSubscribe(SubscribeResourceParams {
            uri: uri.into(),
        }))
        .await
    }

    /// Sends `resources/unsubscribe`.
    pub async fn unsubscribe_resource(&self, uri: impl Into<String>) -> Result<(), PeerError> {
        self.request_empty(RequestMethod::ResourcesUnsubscribe(
            UnsubscribeResourceParams { uri: uri.into() },
        ))
        .await
    }

    // ========================================================================
    // Logging, completion, server-initiated calls
    // ========================================================================

    /// Sends `logging/setLevel`.
    pub async fn set_logging_level(&self, level: LogLevel) -> Result<(), PeerError> {
        self.request_empty(RequestMethod::LoggingSetLevel(SetLogLevelParams { level }))
            .await
    }

    /// Sends `completion/complete`.
    pub async fn complete(
        &self,
        reference: Reference,
        argument_name: impl Into<String>,
        partial_value: impl Into<String>,
    ) -> Result<CompleteResult, PeerError> {
        self.request(RequestMethod::CompletionComplete(CompleteParams {
            reference,
            argument: CompleteArgument {
                name: argument_name.into(),
                value: partial_value.into(),
            },
        }))
        .await
    }

    /// Sends `roots/list` (server role).
    pub async fn list_roots(&self) -> Result<ListRootsResult, PeerError> {
        self.request(RequestMethod::RootsList).await
    }

    /// Sends `sampling/createMessage` (server role).
    pub async fn create_message(
        &self,
        params: CreateMessageParams,
    ) -> Result<CreateMessageResult, PeerError> {
        self.request(RequestMethod::SamplingCreateMessage(params)).await
    }

    // ========================================================================
    // Notifications
    // ========================================================================

    /// Sends `notifications/progress`.
    pub async fn notify_progress(&self, params: ProgressParams) -> Result<(), PeerError> {
        Ok(self
            .send_notification(NotificationMessage::Progress(params))
            .await?)
    }

    /// Sends `notifications/cancelled` for an in-flight request.
    ///
    /// Never sent automatically; cancelling an awaited request locally does
    /// not notify the remote peer.
    pub async fn notify_cancelled(
        &self,
        request_id: RequestId,
        reason: Option<String>,
    ) -> Result<(), PeerError> {
        Ok(self
            .send_notification(NotificationMessage::Cancelled(CancelledParams {
                request_id,
                reason,
            }))
            .await?)
    }

    /// Sends `notifications/message`.
    pub async fn notify_log_message(&self, params: LogMessageParams) -> Result<(), PeerError> {
        Ok(self
            .send_notification(NotificationMessage::LogMessage(params))
            .await?)
    }

    /// Sends `notifications/prompts/list_changed`.
    pub async fn notify_prompts_list_changed(&self) -> Result<(), PeerError> {
        Ok(self
            .send_notification(NotificationMessage::PromptsListChanged)
            .await?)
    }

    /// Sends `notifications/resources/list_changed`.
    pub async fn notify_resources_list_changed(&self) -> Result<(), PeerError> {
        Ok(self
            .send_notification(NotificationMessage::ResourcesListChanged)
            .await?)
    }

    /// Sends `notifications/resources/updated`.
    pub async fn notify_resource_updated(&self, uri: impl Into<String>) -> Result<(), PeerError> {
        Ok(self
            .send_notification(NotificationMessage::ResourceUpdated(ResourceUpdatedParams {
                uri: uri.into(),
            }))
            .await?)
    }

    /// Sends `notifications/roots/list_changed`.
    pub async fn notify_roots_list_changed(&self) -> Result<(), PeerError> {
        Ok(self
            .send_notification(NotificationMessage::RootsListChanged)
            .await?)
    }

    /// Sends `notifications/tools/list_changed`.
    pub async fn notify_tools_list_changed(&self) -> Result<(), PeerError> {
        Ok(self
            .send_notification(NotificationMessage::ToolsListChanged)
            .await?)
    }
}
