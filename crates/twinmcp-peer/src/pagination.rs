//! Cursor-threaded pagination over the list endpoints.
//!
//! A [`Pages`] driver starts with a null cursor, threads each page's
//! `nextCursor` into the next request, and terminates when the cursor comes
//! back null. The first error (transport or remote) aborts the sequence and
//! keeps it terminated. Consumers may stop early; no state is persisted.

use std::marker::PhantomData;

use serde_json::Value;

use twinmcp_core::{McpError, McpResult};
use twinmcp_protocol::{
    ListPromptsParams, ListPromptsResult, ListResourceTemplatesParams,
    ListResourceTemplatesResult, ListResourcesParams, ListResourcesResult, ListToolsParams,
    ListToolsResult, Prompt, RequestMethod, Resource, ResourceTemplate, Tool,
};

use crate::peer::Peer;
use crate::PeerError;

/// A paginated list endpoint: how to build its request and split its result.
pub trait PageQuery {
    /// The item type one page yields.
    type Item;

    /// Builds the request carrying the given cursor.
    fn request(cursor: Option<String>) -> RequestMethod;

    /// Splits a raw result into its items and the next cursor.
    fn page(result: Value) -> McpResult<(Vec<Self::Item>, Option<String>)>;
}

fn decode_page<R: serde::de::DeserializeOwned>(result: Value) -> McpResult<R> {
    serde_json::from_value(result).map_err(|e| McpError::internal_error(e.to_string()))
}

/// Page query for `tools/list`.
pub struct ToolPages;

impl PageQuery for ToolPages {
    type Item = Tool;

    fn request(cursor: Option<String>) -> RequestMethod {
        RequestMethod::ToolsList(ListToolsParams { cursor })
    }

    fn page(result: Value) -> McpResult<(Vec<Tool>, Option<String>)> {
        let result: ListToolsResult = decode_page(result)?;
        Ok((result.tools, result.next_cursor))
    }
}

/// Page query for `prompts/list`.
pub struct PromptPages;

impl PageQuery for PromptPages {
    type Item = Prompt;

    fn request(cursor: Option<String>) -> RequestMethod {
        RequestMethod::PromptsList(ListPromptsParams { cursor })
    }

    fn page(result: Value) -> McpResult<(Vec<Prompt>, Option<String>)> {
        let result: ListPromptsResult = decode_page(result)?;
        Ok((result.prompts, result.next_cursor))
    }
}

/// Page query for `resources/list`.
pub struct ResourcePages;

impl PageQuery for ResourcePages {
    type Item = Resource;

    fn request(cursor: Option<String>) -> RequestMethod {
        RequestMethod::ResourcesList(ListResourcesParams { cursor })
    }

    fn page(result: Value) -> McpResult<(Vec<Resource>, Option<String>)> {
        let result: ListResourcesResult = decode_page(result)?;
        Ok((result.resources, result.next_cursor))
    }
}

/// Page query for `resources/templates/list`.
pub struct ResourceTemplatePages;

impl PageQuery for ResourceTemplatePages {
    type Item = ResourceTemplate;

    fn request(cursor: Option<String>) -> RequestMethod {
        RequestMethod::ResourceTemplatesList(ListResourceTemplatesParams { cursor })
    }

    fn page(result: Value) -> McpResult<(Vec<ResourceTemplate>, Option<String>)> {
        let result: ListResourceTemplatesResult = decode_page(result)?;
        Ok((result.resource_templates, result.next_cursor))
    }
}

/// Lazy page sequence over one list endpoint.
pub struct Pages<'a, Q: PageQuery> {
    peer: &'a Peer,
    cursor: Option<String>,
    done: bool,
    _query: PhantomData<Q>,
}

impl<'a, Q: PageQuery> Pages<'a, Q> {
    pub(crate) fn new(peer: &'a Peer) -> Self {
        Self {
            peer,
            cursor: None,
            done: false,
            _query: PhantomData,
        }
    }

    /// Fetches the next page of items.
    ///
    /// Returns `None` after the final page (null cursor) or after an error.
    pub async fn next(&mut self) -> Option<Result<Vec<Q::Item>, PeerError>> {
        if self.done {
            return None;
        }

        let response = match self.peer.send_request(Q::request(self.cursor.take())).await {
            Ok(response) => response,
            Err(e) => {
                self.done = true;
                return Some(Err(PeerError::Transport(e)));
            }
        };

        let value = match response.into_result() {
            Ok(value) => value,
            Err(e) => {
                self.done = true;
                return Some(Err(PeerError::Rpc(e.into())));
            }
        };

        match Q::page(value) {
            Ok((items, next_cursor)) => {
                match next_cursor {
                    Some(cursor) => self.cursor = Some(cursor),
                    None => self.done = true,
                }
                Some(Ok(items))
            }
            Err(e) => {
                self.done = true;
                Some(Err(PeerError::Rpc(e)))
            }
        }
    }

    /// Drains the remaining pages into one flat item list.
    pub async fn collect_all(mut self) -> Result<Vec<Q::Item>, PeerError> {
        let mut items = Vec::new();
        while let Some(page) = self.next().await {
            items.extend(page?);
        }
        Ok(items)
    }
}

impl Peer {
    /// Iterates `tools/list` pages.
    #[must_use]
    pub fn tool_pages(&self) -> Pages<'_, ToolPages> {
        Pages::new(self)
    }

    /// Iterates `prompts/list` pages.
    #[must_use]
    pub fn prompt_pages(&self) -> Pages<'_, PromptPages> {
        Pages::new(self)
    }

    /// Iterates `resources/list` pages.
    #[must_use]
    pub fn resource_pages(&self) -> Pages<'_, ResourcePages> {
        Pages::new(self)
    }

    /// Iterates `resources/templates/list` pages.
    #[must_use]
    pub fn resource_template_pages(&self) -> Pages<'_, ResourceTemplatePages> {
        Pages::new(self)
    }
}
