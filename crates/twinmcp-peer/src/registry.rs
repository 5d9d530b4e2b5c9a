//! Handler registries.
//!
//! [`HandlerRegistry`] holds the prompt and tool namespaces; both are
//! populated before the peer starts and read-only afterwards. Names must be
//! unique within their namespace.
//!
//! [`RegistryHandler`] is the server-role [`RequestHandler`] that serves
//! initialize, the list endpoints, `prompts/get`, and `tools/call` straight
//! out of the registries.

use std::collections::HashMap;

use async_trait::async_trait;

use twinmcp_core::logging::{debug, info, targets};
use twinmcp_core::{McpError, McpErrorCode, McpResult};
use twinmcp_protocol::{
    CallToolParams, CallToolResult, Content, GetPromptParams, GetPromptResult, InitializeParams,
    InitializeResult, ListPromptsParams, ListPromptsResult, ListToolsParams, ListToolsResult,
    LogLevel, LoggingCapability, Prompt, PromptsCapability, ServerCapabilities, ServerInfo,
    SetLogLevelParams, Tool, ToolsCapability, PROTOCOL_VERSION,
};

use crate::handler::{PromptHandler, RequestHandler, ToolHandler};

/// Registration failure.
#[derive(Debug)]
pub enum RegistryError {
    /// A prompt with this name is already registered.
    DuplicatePrompt(String),
    /// A tool with this name is already registered.
    DuplicateTool(String),
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::DuplicatePrompt(name) => write!(f, "duplicate prompt: {name}"),
            RegistryError::DuplicateTool(name) => write!(f, "duplicate tool: {name}"),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Name-keyed prompt and tool handlers, two disjoint namespaces.
#[derive(Default)]
pub struct HandlerRegistry {
    prompts: HashMap<String, Box<dyn PromptHandler>>,
    tools: HashMap<String, Box<dyn ToolHandler>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a prompt handler under its definition name.
    pub fn add_prompt<H: PromptHandler + 'static>(&mut self, handler: H) -> Result<(), RegistryError> {
        let name = handler.definition().name;
        if self.prompts.contains_key(&name) {
            return Err(RegistryError::DuplicatePrompt(name));
        }
        self.prompts.insert(name, Box::new(handler));
        Ok(())
    }

    /// Registers a tool handler under its definition name.
    pub fn add_tool<H: ToolHandler + 'static>(&mut self, handler: H) -> Result<(), RegistryError> {
        let name = handler.definition().name;
        if self.tools.contains_key(&name) {
            return Err(RegistryError::DuplicateTool(name));
        }
        self.tools.insert(name, Box::new(handler));
        Ok(())
    }

    /// Looks up a prompt handler by name.
    #[must_use]
    pub fn prompt(&self, name: &str) -> Option<&dyn PromptHandler> {
        self.prompts.get(name).map(Box::as_ref)
    }

    /// Looks up a tool handler by name.
    #[must_use]
    pub fn tool(&self, name: &str) -> Option<&dyn ToolHandler> {
        self.tools.get(name).map(Box::as_ref)
    }

    /// Lists all prompt definitions, ordered by name.
    #[must_use]
    pub fn prompts(&self) -> Vec<Prompt> {
        let mut prompts: Vec<Prompt> = self.prompts.values().map(|h| h.definition()).collect();
        prompts.sort_by(|a, b| a.name.cmp(&b.name));
        prompts
    }

    /// Lists all tool definitions, ordered by name.
    #[must_use]
    pub fn tools(&self) -> Vec<Tool> {
        let mut tools: Vec<Tool> = self.tools.values().map(|h| h.definition()).collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    /// Returns the number of registered prompts.
    #[must_use]
    pub fn prompt_count(&self) -> usize {
        self.prompts.len()
    }

    /// Returns the number of registered tools.
    #[must_use]
    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }
}

/// Server-role request handler backed by a [`HandlerRegistry`].
pub struct RegistryHandler {
    info: ServerInfo,
    instructions: Option<String>,
    registry: HandlerRegistry,
}

impl RegistryHandler {
    /// Creates a handler serving the given registry.
    #[must_use]
    pub fn new(info: ServerInfo, instructions: Option<String>, registry: HandlerRegistry) -> Self {
        Self {
            info,
            instructions,
            registry,
        }
    }

    /// Capabilities advertised during initialize, derived from what is
    /// registered.
    fn capabilities(&self) -> ServerCapabilities {
        ServerCapabilities {
            tools: (self.registry.tool_count() > 0).then(ToolsCapability::default),
            prompts: (self.registry.prompt_count() > 0).then(PromptsCapability::default),
            logging: Some(LoggingCapability::default()),
            ..ServerCapabilities::default()
        }
    }
}

#[async_trait]
impl RequestHandler for RegistryHandler {
    async fn initialize(&self, params: InitializeParams) -> McpResult<InitializeResult> {
        debug!(
            target: targets::PEER,
            "Initializing session with client: {}", params.client_info.name
        );
        // Version mismatches do not fail the handshake; the client decides.
        Ok(InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_owned(),
            capabilities: self.capabilities(),
            server_info: self.info.clone(),
            instructions: self.instructions.clone(),
        })
    }

    async fn list_tools(&self, _params: ListToolsParams) -> McpResult<ListToolsResult> {
        Ok(ListToolsResult {
            tools: self.registry.tools(),
            next_cursor: None,
        })
    }

    async fn call_tool(&self, params: CallToolParams) -> McpResult<CallToolResult> {
        debug!(target: targets::HANDLER, "Calling tool: {}", params.name);
        let handler = self
            .registry
            .tool(&params.name)
            .ok_or_else(|| McpError::method_not_found(format!("tool: {}", params.name)))?;

        let arguments = params.arguments.unwrap_or_default();
        match handler.call(&arguments) {
            Ok(result) => Ok(result),
            // Validation failures stay JSON-RPC errors; everything else is
            // reported in-band as a failed tool call.
            Err(e) if matches!(e.code, McpErrorCode::InvalidParams | McpErrorCode::MethodNotFound) => {
                Err(e)
            }
            Err(e) => Ok(CallToolResult {
                content: vec![Content::text(e.message)],
                is_error: true,
            }),
        }
    }

    async fn list_prompts(&self, _params: ListPromptsParams) -> McpResult<ListPromptsResult> {
        Ok(ListPromptsResult {
            prompts: self.registry.prompts(),
            next_cursor: None,
        })
    }

    async fn get_prompt(&self, params: GetPromptParams) -> McpResult<GetPromptResult> {
        debug!(target: targets::HANDLER, "Getting prompt: {}", params.name);
        let handler = self
            .registry
            .prompt(&params.name)
            .ok_or_else(|| McpError::method_not_found(format!("prompt: {}", params.name)))?;

        let arguments = params.arguments.unwrap_or_default();
        let messages = handler.get(&arguments)?;
        Ok(GetPromptResult {
            description: handler.definition().description,
            messages,
        })
    }

    async fn set_logging_level(&self, params: SetLogLevelParams) -> McpResult<()> {
        let filter = match params.level {
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warning => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        };
        log::set_max_level(filter);
        info!(target: targets::PEER, "Log level set to {:?}", params.level);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use twinmcp_protocol::{JsonObject, PromptMessage};

    struct FixedPrompt(&'static str);

    impl PromptHandler for FixedPrompt {
        fn definition(&self) -> Prompt {
            Prompt {
                name: self.0.to_owned(),
                description: Some("a fixed prompt".to_owned()),
                arguments: Vec::new(),
            }
        }

        fn get(&self, _arguments: &JsonObject) -> McpResult<Vec<PromptMessage>> {
            Ok(vec![PromptMessage::user("fixed")])
        }
    }

    struct FailingTool;

    impl ToolHandler for FailingTool {
        fn definition(&self) -> Tool {
            Tool {
                name: "failing".to_owned(),
                description: None,
                input_schema: serde_json::json!({"type": "object"}),
            }
        }

        fn call(&self, _arguments: &JsonObject) -> McpResult<CallToolResult> {
            Err(McpError::internal_error("tool blew up"))
        }
    }

    fn server_info() -> ServerInfo {
        ServerInfo {
            name: "test".to_owned(),
            version: "0.0.0".to_owned(),
        }
    }

    #[test]
    fn duplicate_prompt_is_an_error() {
        let mut registry = HandlerRegistry::new();
        registry.add_prompt(FixedPrompt("p")).unwrap();
        let err = registry.add_prompt(FixedPrompt("p")).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicatePrompt(name) if name == "p"));
    }

    #[test]
    fn namespaces_are_disjoint() {
        let mut registry = HandlerRegistry::new();
        registry.add_prompt(FixedPrompt("same")).unwrap();
        registry.add_tool(FailingTool).unwrap();
        assert_eq!(registry.prompt_count(), 1);
        assert_eq!(registry.tool_count(), 1);
    }

    #[tokio::test]
    async fn capabilities_reflect_registrations() {
        let mut registry = HandlerRegistry::new();
        registry.add_prompt(FixedPrompt("p")).unwrap();
        let handler = RegistryHandler::new(server_info(), None, registry);

        let caps = handler.capabilities();
        assert!(caps.prompts.is_some());
        assert!(caps.tools.is_none());
        assert!(caps.logging.is_some());
    }

    #[tokio::test]
    async fn tool_failures_surface_in_band() {
        let mut registry = HandlerRegistry::new();
        registry.add_tool(FailingTool).unwrap();
        let handler = RegistryHandler::new(server_info(), None, registry);

        let result = handler
            .call_tool(CallToolParams {
                name: "failing".to_owned(),
                arguments: None,
            })
            .await
            .unwrap();
        assert!(result.is_error);
        assert!(
            matches!(&result.content[0], Content::Text { text } if text.contains("tool blew up"))
        );
    }

    #[tokio::test]
    async fn unknown_tool_is_method_not_found() {
        let handler = RegistryHandler::new(server_info(), None, HandlerRegistry::new());
        let err = handler
            .call_tool(CallToolParams {
                name: "nope".to_owned(),
                arguments: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, McpErrorCode::MethodNotFound);
    }

    #[tokio::test]
    async fn get_prompt_carries_description() {
        let mut registry = HandlerRegistry::new();
        registry.add_prompt(FixedPrompt("p")).unwrap();
        let handler = RegistryHandler::new(server_info(), None, registry);

        let result = handler
            .get_prompt(GetPromptParams {
                name: "p".to_owned(),
                arguments: None,
            })
            .await
            .unwrap();
        assert_eq!(result.description.as_deref(), Some("a fixed prompt"));
        assert_eq!(result.messages.len(), 1);
    }
}
