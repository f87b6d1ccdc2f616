//! Serving a registry over MCP with the rmcp SDK.

use std::sync::Arc;

use rmcp::model::{
    CallToolRequestParams, CallToolResult, Content, Implementation, ListResourceTemplatesResult,
    ListResourcesResult, ListToolsResult, PaginatedRequestParams, ProtocolVersion,
    ReadResourceRequestParams, ReadResourceResult, Resource, ResourceTemplate,
    ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData as McpError, RoleServer, ServerHandler};
use serde::de::DeserializeOwned;
use serde_json::{Value as Json, json};
use tracing::{debug, info};

use crate::error::InvocationError;
use crate::operation::Operation;
use crate::registry::Registry;

impl Registry {
    /// Tool definitions in registration order.
    pub fn tools(&self) -> Vec<Tool> {
        self.operations()
            .iter()
            .filter(|op| op.is_tool())
            .map(|op| {
                let sig = op.signature();
                let mut tool = Tool::new(sig.name, sig.description, Arc::new(sig.input_schema()));
                tool.output_schema = Some(Arc::new(sig.output_schema()));
                tool
            })
            .collect()
    }

    /// Concrete resources. Every resource here is templated, so this is empty.
    pub fn resources(&self) -> Vec<Resource> {
        Vec::new()
    }

    /// Resource templates in registration order.
    pub fn resource_templates(&self) -> Result<Vec<ResourceTemplate>, McpError> {
        self.operations()
            .iter()
            .filter_map(|op| match op {
                Operation::Resource {
                    signature,
                    template,
                    mime_type,
                    ..
                } => Some(json!({
                    "uriTemplate": template.as_str(),
                    "name": signature.name,
                    "description": signature.description,
                    "mimeType": mime_type,
                })),
                Operation::Tool { .. } => None,
            })
            .map(from_json)
            .collect()
    }

    /// Run a tool call and shape the outcome for the wire.
    ///
    /// An unknown tool is a protocol error. Every other failure is reported
    /// in-band with `isError` set.
    pub fn call_tool_result(
        &self,
        name: &str,
        arguments: Option<&Json>,
    ) -> Result<CallToolResult, McpError> {
        match self.call(name, arguments) {
            Ok(value) => {
                debug!(tool = %name, result = %value, "tool call succeeded");
                let mut result = CallToolResult::success(vec![Content::text(value.to_string())]);
                result.structured_content = Some(json!({ "result": value.to_json() }));
                Ok(result)
            }
            Err(e @ InvocationError::UnknownTool(_)) => {
                info!(tool = %name, "unknown tool");
                Err(McpError::invalid_params(e.to_string(), None))
            }
            Err(e) => {
                info!(tool = %name, error = %e, "tool call failed");
                Ok(CallToolResult::error(vec![Content::text(e.to_string())]))
            }
        }
    }

    /// Read `uri` and shape the contents for the wire.
    pub fn read_resource_result(&self, uri: &str) -> Result<ReadResourceResult, McpError> {
        match self.read(uri) {
            Ok((value, mime_type)) => {
                debug!(%uri, "resource read");
                from_json(json!({
                    "contents": [{
                        "uri": uri,
                        "mimeType": mime_type,
                        "text": value.to_string(),
                    }],
                }))
            }
            Err(e @ InvocationError::UnknownResource(_)) => {
                info!(%uri, "unknown resource");
                Err(McpError::resource_not_found(e.to_string(), Some(json!({ "uri": uri }))))
            }
            Err(e) => Err(McpError::invalid_params(e.to_string(), None)),
        }
    }
}

// Payloads with optional protocol fields are built as JSON and checked by
// the SDK's own deserializers.
fn from_json<T: DeserializeOwned>(value: Json) -> Result<T, McpError> {
    serde_json::from_value(value).map_err(|e| McpError::internal_error(e.to_string(), None))
}

impl ServerHandler for Registry {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation {
                name: self.name().to_string(),
                version: self.version().to_string(),
                ..Implementation::from_build_env()
            },
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult::with_all_items(self.tools()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let arguments = request.arguments.map(Json::Object);
        self.call_tool_result(&request.name, arguments.as_ref())
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        Ok(ListResourcesResult::with_all_items(self.resources()))
    }

    async fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourceTemplatesResult, McpError> {
        Ok(ListResourceTemplatesResult::with_all_items(self.resource_templates()?))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        self.read_resource_result(&request.uri)
    }
}
