//! The closed method registry.
//!
//! [`RequestMethod`] and [`NotificationMessage`] are the exhaustive unions of
//! every MCP method, binding each method string to its parameter type and
//! initiating direction. Dispatch is an exact, case-sensitive string match;
//! namespaces are `/`-delimited.

use serde::de::DeserializeOwned;
use serde_json::Value;

use twinmcp_core::{McpError, McpResult};

use crate::jsonrpc::{Request, RequestId};
use crate::messages::{
    CallToolParams, CancelledParams, CompleteParams, CreateMessageParams, GetPromptParams,
    InitializeParams, ListPromptsParams, ListResourceTemplatesParams, ListResourcesParams,
    ListToolsParams, LogMessageParams, ProgressParams, ReadResourceParams, ResourceUpdatedParams,
    SetLogLevelParams, SubscribeResourceParams, UnsubscribeResourceParams,
};

/// Which peer may initiate a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Sent by the client, served by the server.
    ClientToServer,
    /// Sent by the server, served by the client.
    ServerToClient,
    /// Sent by either peer.
    Either,
}

/// Parses required parameters.
fn params<T: DeserializeOwned>(value: Option<Value>) -> McpResult<T> {
    let value = value.ok_or_else(|| McpError::invalid_params("missing parameters"))?;
    serde_json::from_value(value).map_err(|e| McpError::invalid_params(e.to_string()))
}

/// Parses optional parameters, falling back to the default when absent.
fn params_or_default<T: DeserializeOwned + Default>(value: Option<Value>) -> McpResult<T> {
    match value {
        Some(value) => {
            serde_json::from_value(value).map_err(|e| McpError::invalid_params(e.to_string()))
        }
        None => Ok(T::default()),
    }
}

fn to_params<T: serde::Serialize>(value: &T) -> Result<Option<Value>, serde_json::Error> {
    serde_json::to_value(value).map(Some)
}

/// A request, parsed into its typed envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestMethod {
    /// `initialize`
    Initialize(InitializeParams),
    /// `ping`
    Ping,
    /// `tools/list`
    ToolsList(ListToolsParams),
    /// `tools/call`
    ToolsCall(CallToolParams),
    /// `prompts/list`
    PromptsList(ListPromptsParams),
    /// `prompts/get`
    PromptsGet(GetPromptParams),
    /// `resources/list`
    ResourcesList(ListResourcesParams),
    /// `resources/templates/list`
    ResourceTemplatesList(ListResourceTemplatesParams),
    /// `resources/read`
    ResourcesRead(ReadResourceParams),
    /// `resources/subscribe`
    ResourcesSubscribe(SubscribeResourceParams),
    /// `resources/unsubscribe`
    ResourcesUnsubscribe(UnsubscribeResourceParams),
    /// `roots/list`
    RootsList,
    /// `sampling/createMessage`
    SamplingCreateMessage(CreateMessageParams),
    /// `logging/setLevel`
    LoggingSetLevel(SetLogLevelParams),
    /// `completion/complete`
    CompletionComplete(CompleteParams),
}

impl RequestMethod {
    /// Returns the wire-level method string.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            RequestMethod::Initialize(_) => "initialize",
            RequestMethod::Ping => "ping",
            RequestMethod::ToolsList(_) => "tools/list",
            RequestMethod::ToolsCall(_) => "tools/call",
            RequestMethod::PromptsList(_) => "prompts/list",
            RequestMethod::PromptsGet(_) => "prompts/get",
            RequestMethod::ResourcesList(_) => "resources/list",
            RequestMethod::ResourceTemplatesList(_) => "resources/templates/list",
            RequestMethod::ResourcesRead(_) => "resources/read",
            RequestMethod::ResourcesSubscribe(_) => "resources/subscribe",
            RequestMethod::ResourcesUnsubscribe(_) => "resources/unsubscribe",
            RequestMethod::RootsList => "roots/list",
            RequestMethod::SamplingCreateMessage(_) => "sampling/createMessage",
            RequestMethod::LoggingSetLevel(_) => "logging/setLevel",
            RequestMethod::CompletionComplete(_) => "completion/complete",
        }
    }

    /// Returns which peer may initiate this method.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        match self {
            RequestMethod::Ping => Direction::Either,
            RequestMethod::RootsList | RequestMethod::SamplingCreateMessage(_) => {
                Direction::ServerToClient
            }
            _ => Direction::ClientToServer,
        }
    }

    /// Parses an incoming method string and raw params into a typed envelope.
    ///
    /// Unknown methods map to MethodNotFound; params of the wrong shape map
    /// to InvalidParams.
    pub fn parse(method: &str, raw: Option<Value>) -> McpResult<Self> {
        match method {
            "initialize" => Ok(RequestMethod::Initialize(params(raw)?)),
            "ping" => Ok(RequestMethod::Ping),
            "tools/list" => Ok(RequestMethod::ToolsList(params_or_default(raw)?)),
            "tools/call" => Ok(RequestMethod::ToolsCall(params(raw)?)),
            "prompts/list" => Ok(RequestMethod::PromptsList(params_or_default(raw)?)),
            "prompts/get" => Ok(RequestMethod::PromptsGet(params(raw)?)),
            "resources/list" => Ok(RequestMethod::ResourcesList(params_or_default(raw)?)),
            "resources/templates/list" => Ok(RequestMethod::ResourceTemplatesList(
                params_or_default(raw)?,
            )),
            "resources/read" => Ok(RequestMethod::ResourcesRead(params(raw)?)),
            "resources/subscribe" => Ok(RequestMethod::ResourcesSubscribe(params(raw)?)),
            "resources/unsubscribe" => Ok(RequestMethod::ResourcesUnsubscribe(params(raw)?)),
            "roots/list" => Ok(RequestMethod::RootsList),
            "sampling/createMessage" => Ok(RequestMethod::SamplingCreateMessage(params(raw)?)),
            "logging/setLevel" => Ok(RequestMethod::LoggingSetLevel(params(raw)?)),
            "completion/complete" => Ok(RequestMethod::CompletionComplete(params(raw)?)),
            other => Err(McpError::method_not_found(other)),
        }
    }

    /// Serializes the typed params back to a raw value.
    pub fn params_value(&self) -> Result<Option<Value>, serde_json::Error> {
        match self {
            RequestMethod::Initialize(p) => to_params(p),
            RequestMethod::Ping | RequestMethod::RootsList => Ok(None),
            RequestMethod::ToolsList(p) => to_params(p),
            RequestMethod::ToolsCall(p) => to_params(p),
            RequestMethod::PromptsList(p) => to_params(p),
            RequestMethod::PromptsGet(p) => to_params(p),
            RequestMethod::ResourcesList(p) => to_params(p),
            RequestMethod::ResourceTemplatesList(p) => to_params(p),
            RequestMethod::ResourcesRead(p) => to_params(p),
            RequestMethod::ResourcesSubscribe(p) => to_params(p),
            RequestMethod::ResourcesUnsubscribe(p) => to_params(p),
            RequestMethod::SamplingCreateMessage(p) => to_params(p),
            RequestMethod::LoggingSetLevel(p) => to_params(p),
            RequestMethod::CompletionComplete(p) => to_params(p),
        }
    }

    /// Builds the wire request for this method under the given id.
    pub fn into_request(self, id: RequestId) -> Result<Request, serde_json::Error> {
        Ok(Request {
            id,
            method: self.name().to_owned(),
            params: self.params_value()?,
        })
    }
}

/// A notification, parsed into its typed envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationMessage {
    /// `notifications/initialized`
    Initialized,
    /// `notifications/cancelled`
    Cancelled(CancelledParams),
    /// `notifications/progress`
    Progress(ProgressParams),
    /// `notifications/message`
    LogMessage(LogMessageParams),
    /// `notifications/prompts/list_changed`
    PromptsListChanged,
    /// `notifications/resources/list_changed`
    ResourcesListChanged,
    /// `notifications/resources/updated`
    ResourceUpdated(ResourceUpdatedParams),
    /// `notifications/roots/list_changed`
    RootsListChanged,
    /// `notifications/tools/list_changed`
    ToolsListChanged,
}

impl NotificationMessage {
    /// Returns the wire-level method string.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            NotificationMessage::Initialized => "notifications/initialized",
            NotificationMessage::Cancelled(_) => "notifications/cancelled",
            NotificationMessage::Progress(_) => "notifications/progress",
            NotificationMessage::LogMessage(_) => "notifications/message",
            NotificationMessage::PromptsListChanged => "notifications/prompts/list_changed",
            NotificationMessage::ResourcesListChanged => "notifications/resources/list_changed",
            NotificationMessage::ResourceUpdated(_) => "notifications/resources/updated",
            NotificationMessage::RootsListChanged => "notifications/roots/list_changed",
            NotificationMessage::ToolsListChanged => "notifications/tools/list_changed",
        }
    }

    /// Parses an incoming notification method and raw params.
    ///
    /// Unknown notification methods map to MethodNotFound; per the JSON-RPC
    /// rule the peer logs and ignores them (notifications never reply).
    pub fn parse(method: &str, raw: Option<Value>) -> McpResult<Self> {
        match method {
            "notifications/initialized" => Ok(NotificationMessage::Initialized),
            "notifications/cancelled" => Ok(NotificationMessage::Cancelled(params(raw)?)),
            "notifications/progress" => Ok(NotificationMessage::Progress(params(raw)?)),
            "notifications/message" => Ok(NotificationMessage::LogMessage(params(raw)?)),
            "notifications/prompts/list_changed" => Ok(NotificationMessage::PromptsListChanged),
            "notifications/resources/list_changed" => {
                Ok(NotificationMessage::ResourcesListChanged)
            }
            "notifications/resources/updated" => {
                Ok(NotificationMessage::ResourceUpdated(params(raw)?))
            }
            "notifications/roots/list_changed" => Ok(NotificationMessage::RootsListChanged),
            "notifications/tools/list_changed" => Ok(NotificationMessage::ToolsListChanged),
            other => Err(McpError::method_not_found(other)),
        }
    }

    /// Serializes the typed params back to a raw value.
    pub fn params_value(&self) -> Result<Option<Value>, serde_json::Error> {
        match self {
            NotificationMessage::Initialized
            | NotificationMessage::PromptsListChanged
            | NotificationMessage::ResourcesListChanged
            | NotificationMessage::RootsListChanged
            | NotificationMessage::ToolsListChanged => Ok(None),
            NotificationMessage::Cancelled(p) => to_params(p),
            NotificationMessage::Progress(p) => to_params(p),
            NotificationMessage::LogMessage(p) => to_params(p),
            NotificationMessage::ResourceUpdated(p) => to_params(p),
        }
    }
}
