//! MCP (Model Context Protocol) over stdio.
//!
//! This crate provides a [`Client`] that spawns a server process and talks
//! newline-delimited JSON-RPC 2.0 to it over its stdin/stdout, together with
//! the wire types for the initialize, tools and resources methods.
//!
//! # Example
//!
//! ```no_run
//! use mcp::{Client, ServerConfig};
//!
//! # async fn example() -> mcp::Result<()> {
//! let config = ServerConfig::new("calc", "/usr/local/bin/calc-server");
//!
//! let client = Client::spawn(config).await?;
//! client.initialize().await?;
//!
//! for tool in client.list_tools().await? {
//!     println!("Tool: {}", tool.name);
//! }
//!
//! let result = client
//!     .call_tool("add", Some(serde_json::json!({ "a": 1, "b": 7 })))
//!     .await?;
//! println!("{}", result.text_content());
//!
//! client.shutdown().await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod protocol;

pub use client::{Client, DEFAULT_TIMEOUT, MAX_OUTPUT_SIZE, SHUTDOWN_GRACE, ServerConfig};
pub use error::{Error, Result};
pub use protocol::{
    CallToolParams, CallToolResult, ClientCapabilities, ClientInfo, InitializeParams,
    InitializeResult, JsonRpcError, JsonRpcMessage, JsonRpcNotification, JsonRpcRequest,
    JsonRpcResponse, LATEST_PROTOCOL_VERSION, ListResourceTemplatesResult, ListResourcesResult,
    ListToolsResult, PromptsCapability, ReadResourceParams, ReadResourceResult, RequestId,
    Resource, ResourceContents, ResourceTemplate, ResourcesCapability,
    SUPPORTED_PROTOCOL_VERSIONS, ServerCapabilities, ServerInfo, Tool, ToolContent,
    ToolsCapability, codes,
};
