//! Handler traits.
//!
//! [`RequestHandler`] exposes one overridable operation per MCP method; every
//! default returns NotImplemented, which the dispatcher maps to `-32601`
//! (`ping` is the exception and answers in both roles). A client typically
//! leaves most operations unimplemented; a server overrides the ones it
//! serves, or uses the registry-backed handler from [`crate::registry`].
//!
//! [`PromptHandler`] and [`ToolHandler`] are the invocation interfaces
//! implemented by generated code: they validate a JSON argument object and
//! call the user function.

use async_trait::async_trait;

use twinmcp_core::{McpError, McpResult};
use twinmcp_protocol::{
    CallToolParams, CallToolResult, CancelledParams, CompleteParams, CompleteResult, Content,
    CreateMessageParams, CreateMessageResult, GetPromptParams, GetPromptResult, InitializeParams,
    InitializeResult, JsonObject, ListPromptsParams, ListPromptsResult,
    ListResourceTemplatesParams, ListResourceTemplatesResult, ListResourcesParams,
    ListResourcesResult, ListRootsResult, ListToolsParams, ListToolsResult, LogMessageParams,
    ProgressParams, Prompt, PromptMessage, ReadResourceParams, ReadResourceResult,
    ResourceUpdatedParams, SetLogLevelParams, SubscribeResourceParams, Tool,
    UnsubscribeResourceParams,
};

/// Typed request operations, one per method in the registry.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    /// Handles `initialize`.
    async fn initialize(&self, params: InitializeParams) -> McpResult<InitializeResult> {
        let _ = params;
        Err(McpError::not_implemented())
    }

    /// Handles `ping`. Answered in both roles by default: liveness probes
    /// must succeed on peers that registered no handlers at all.
    async fn ping(&self) -> McpResult<()> {
        Ok(())
    }

    /// Handles `tools/list`.
    async fn list_tools(&self, params: ListToolsParams) -> McpResult<ListToolsResult> {
        let _ = params;
        Err(McpError::not_implemented())
    }

    /// Handles `tools/call`.
    async fn call_tool(&self, params: CallToolParams) -> McpResult<CallToolResult> {
        let _ = params;
        Err(McpError::not_implemented())
    }

    /// Handles `prompts/list`.
    async fn list_prompts(&self, params: ListPromptsParams) -> McpResult<ListPromptsResult> {
        let _ = params;
        Err(McpError::not_implemented())
    }

    /// Handles `prompts/get`.
    async fn get_prompt(&self, params: GetPromptParams) -> McpResult<GetPromptResult> {
        let _ = params;
        Err(McpError::not_implemented())
    }

    /// Handles `resources/list`.
    async fn list_resources(&self, params: ListResourcesParams) -> McpResult<ListResourcesResult> {
        let _ = params;
        Err(McpError::not_implemented())
    }

    /// Handles `resources/templates/list`.
    async fn list_resource_templates(
        &self,
        params: ListResourceTemplatesParams,
    ) -> McpResult<ListResourceTemplatesResult> {
        let _ = params;
        Err(McpError::not_implemented())
    }

    /// Handles `resources/read`.
    async fn read_resource(&self, params: ReadResourceParams) -> McpResult<ReadResourceResult> {
        let _ = params;
        Err(McpError::not_implemented())
    }

    /// Handles `resources/subscribe`.
    async fn subscribe_resource(&self, params: SubscribeResourceParams) -> McpResult<()> {
        let _ = params;
        Err(McpError::not_implemented())
    }

    /// Handles `resources/unsubscribe`.
    async fn unsubscribe_resource(&self, params: UnsubscribeResourceParams) -> McpResult<()> {
        let _ = params;
        Err(McpError::not_implemented())
    }

    /// Handles `roots/list` (served by the client).
    async fn list_roots(&self) -> McpResult<ListRootsResult> {
        Err(McpError::not_implemented())
    }

    /// Handles `sampling/createMessage` (served by the client).
    async fn create_message(&self, params: CreateMessageParams) -> McpResult<CreateMessageResult> {
        let _ = params;
        Err(McpError::not_implemented())
    }

    /// Handles `logging/setLevel`.
    async fn set_logging_level(&self, params: SetLogLevelParams) -> McpResult<()> {
        let _ = params;
        Err(McpError::not_implemented())
    }

    /// Handles `completion/complete`.
    async fn complete(&self, params: CompleteParams) -> McpResult<CompleteResult> {
        let _ = params;
        Err(McpError::not_implemented())
    }
}

/// Typed notification operations.
///
/// Failures returned here are logged and swallowed: notifications never
/// reply.
#[async_trait]
pub trait NotificationHandler: Send + Sync {
    /// `notifications/initialized`
    async fn on_initialized(&self) -> McpResult<()> {
        Ok(())
    }

    /// `notifications/cancelled`
    async fn on_cancelled(&self, params: CancelledParams) -> McpResult<()> {
        let _ = params;
        Ok(())
    }

    /// `notifications/progress`
    async fn on_progress(&self, params: ProgressParams) -> McpResult<()> {
        let _ = params;
        Ok(())
    }

    /// `notifications/message`
    async fn on_log_message(&self, params: LogMessageParams) -> McpResult<()> {
        let _ = params;
        Ok(())
    }

    /// `notifications/prompts/list_changed`
    async fn on_prompts_list_changed(&self) -> McpResult<()> {
        Ok(())
    }

    /// `notifications/resources/list_changed`
    async fn on_resources_list_changed(&self) -> McpResult<()> {
        Ok(())
    }

    /// `notifications/resources/updated`
    async fn on_resource_updated(&self, params: ResourceUpdatedParams) -> McpResult<()> {
        let _ = params;
        Ok(())
    }

    /// `notifications/roots/list_changed`
    async fn on_roots_list_changed(&self) -> McpResult<()> {
        Ok(())
    }

    /// `notifications/tools/list_changed`
    async fn on_tools_list_changed(&self) -> McpResult<()> {
        Ok(())
    }
}

/// The all-defaults handler pair: every request answers NotImplemented
/// (except ping), every notification is accepted silently.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultHandlers;

#[async_trait]
impl RequestHandler for DefaultHandlers {}

#[async_trait]
impl NotificationHandler for DefaultHandlers {}

// ============================================================================
// Prompt and tool invocation
// ============================================================================

/// Handler for a prompt. Implemented by `#[prompt]`-generated code.
pub trait PromptHandler: Send + Sync {
    /// Returns the prompt definition.
    fn definition(&self) -> Prompt;

    /// Validates the argument object and invokes the target function.
    fn get(&self, arguments: &JsonObject) -> McpResult<Vec<PromptMessage>>;
}

/// Handler for a tool. Implemented by `#[tool]`-generated code.
pub trait ToolHandler: Send + Sync {
    /// Returns the tool definition.
    fn definition(&self) -> Tool;

    /// Validates the argument object and invokes the target function.
    fn call(&self, arguments: &JsonObject) -> McpResult<CallToolResult>;
}

/// Conversion from a prompt function's return type to the wire result.
pub trait IntoPromptResult {
    /// Converts into the prompt message list.
    fn into_prompt_result(self) -> McpResult<Vec<PromptMessage>>;
}

impl IntoPromptResult for Vec<PromptMessage> {
    fn into_prompt_result(self) -> McpResult<Vec<PromptMessage>> {
        Ok(self)
    }
}

impl IntoPromptResult for PromptMessage {
    fn into_prompt_result(self) -> McpResult<Vec<PromptMessage>> {
        Ok(vec![self])
    }
}

impl<T: IntoPromptResult> IntoPromptResult for McpResult<T> {
    fn into_prompt_result(self) -> McpResult<Vec<PromptMessage>> {
        self.and_then(IntoPromptResult::into_prompt_result)
    }
}

/// Conversion from a tool function's declared return type to the wire
/// result. The declared type is enforced at the call site; no JSON coercion
/// happens at this edge.
pub trait IntoCallToolResult {
    /// Converts into the tool call result.
    fn into_call_tool_result(self) -> McpResult<CallToolResult>;
}

impl IntoCallToolResult for CallToolResult {
    fn into_call_tool_result(self) -> McpResult<CallToolResult> {
        Ok(self)
    }
}

impl IntoCallToolResult for Vec<Content> {
    fn into_call_tool_result(self) -> McpResult<CallToolResult> {
        Ok(CallToolResult {
            content: self,
            is_error: false,
        })
    }
}

impl IntoCallToolResult for Content {
    fn into_call_tool_result(self) -> McpResult<CallToolResult> {
        vec![self].into_call_tool_result()
    }
}

impl IntoCallToolResult for String {
    fn into_call_tool_result(self) -> McpResult<CallToolResult> {
        Content::text(self).into_call_tool_result()
    }
}

impl<T: IntoCallToolResult> IntoCallToolResult for McpResult<T> {
    fn into_call_tool_result(self) -> McpResult<CallToolResult> {
        self.and_then(IntoCallToolResult::into_call_tool_result)
    }
}
