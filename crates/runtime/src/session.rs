//! Session management and the demo sequence.

use std::io::Write;

use mcp::{
    CallToolResult, Client, InitializeResult, Resource, ResourceTemplate, ServerConfig, Tool,
};
use serde_json::Value;
use tracing::{debug, info};

use crate::{Error, Result};

/// Resource read by the demo.
pub const GREETING_URI: &str = "greeting://hello";

/// Tool called by the demo.
pub const DEMO_TOOL: &str = "add";

/// A resource body with its declared MIME type.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceText {
    pub content: String,
    pub mime_type: Option<String>,
}

/// A handshake-scoped conversation with one server.
pub struct Session {
    client: Client,
    server: InitializeResult,
}

impl Session {
    /// Spawn the server and complete the initialize handshake.
    ///
    /// If the handshake fails the child is released before returning.
    pub async fn connect(config: ServerConfig) -> Result<Self> {
        let name = config.name.clone();
        let client = Client::spawn(config).await.map_err(|source| Error::Connect {
            server: name.clone(),
            source,
        })?;

        match client.initialize().await {
            Ok(server) => {
                info!(server = %name, protocol = %server.protocol_version, "session established");
                Ok(Self { client, server })
            }
            Err(source) => {
                if let Err(e) = client.shutdown().await {
                    debug!(error = %e, "release after failed handshake");
                }
                Err(Error::Handshake {
                    server: name,
                    source,
                })
            }
        }
    }

    /// What the server announced during the handshake.
    pub fn server(&self) -> &InitializeResult {
        &self.server
    }

    pub async fn list_resources(&self) -> Result<Vec<Resource>> {
        self.client
            .list_resources()
            .await
            .map_err(invocation("list_resources"))
    }

    pub async fn list_resource_templates(&self) -> Result<Vec<ResourceTemplate>> {
        self.client
            .list_resource_templates()
            .await
            .map_err(invocation("list_resource_templates"))
    }

    pub async fn list_tools(&self) -> Result<Vec<Tool>> {
        self.client
            .list_tools()
            .await
            .map_err(invocation("list_tools"))
    }

    /// Read a text resource.
    pub async fn read_resource(&self, uri: &str) -> Result<ResourceText> {
        let operation = format!("read_resource {uri}");
        let result = self
            .client
            .read_resource(uri)
            .await
            .map_err(invocation(&operation))?;

        let contents = result
            .contents
            .into_iter()
            .next()
            .ok_or_else(|| Error::UnexpectedReply {
                operation: operation.clone(),
                detail: "no contents".to_string(),
            })?;
        let content = contents.text.ok_or_else(|| Error::UnexpectedReply {
            operation,
            detail: "contents are not text".to_string(),
        })?;

        Ok(ResourceText {
            content,
            mime_type: contents.mime_type,
        })
    }

    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult> {
        self.client
            .call_tool(name, Some(arguments))
            .await
            .map_err(invocation(&format!("call_tool {name}")))
    }

    /// Release the channel and reap the server.
    pub async fn close(self) -> Result<()> {
        self.client.shutdown().await.map_err(Error::Close)
    }
}

fn invocation(operation: &str) -> impl FnOnce(mcp::Error) -> Error + '_ {
    move |source| Error::Invocation {
        operation: operation.to_string(),
        source,
    }
}

/// Everything one demo run discovered and received.
#[derive(Debug, Clone)]
pub struct Transcript {
    pub resources: Vec<Resource>,
    pub templates: Vec<ResourceTemplate>,
    pub tools: Vec<Tool>,
    pub greeting: ResourceText,
    pub sum: CallToolResult,
}

/// Connect, discover, read the greeting and call `add(1, 7)`, printing each
/// step to `out`.
///
/// Steps run strictly in order and the first failure ends the run. The
/// session is closed on every path.
pub async fn run_demo<W: Write>(config: ServerConfig, out: &mut W) -> Result<Transcript> {
    let session = Session::connect(config).await?;
    let outcome = demo_steps(&session, out).await;
    let closed = session.close().await;

    let transcript = outcome?;
    closed?;
    Ok(transcript)
}

async fn demo_steps<W: Write>(session: &Session, out: &mut W) -> Result<Transcript> {
    let resources = session.list_resources().await?;
    writeln!(out, "LISTING RESOURCES")?;
    for resource in &resources {
        writeln!(out, "Resource: {} ({})", resource.uri, resource.name)?;
    }

    let templates = session.list_resource_templates().await?;
    writeln!(out, "LISTING RESOURCE TEMPLATES")?;
    for template in &templates {
        writeln!(out, "Template: {} ({})", template.uri_template, template.name)?;
    }

    let tools = session.list_tools().await?;
    writeln!(out, "LISTING TOOLS")?;
    for tool in &tools {
        writeln!(out, "Tool: {}", tool.name)?;
    }

    writeln!(out, "READING RESOURCE")?;
    let greeting = session.read_resource(GREETING_URI).await?;
    writeln!(
        out,
        "Content: {}, MIME Type: {}",
        greeting.content,
        greeting.mime_type.as_deref().unwrap_or("unknown")
    )?;

    writeln!(out, "CALL TOOL")?;
    let sum = session
        .call_tool(DEMO_TOOL, serde_json::json!({ "a": 1, "b": 7 }))
        .await?;
    writeln!(out, "{}", sum.text_content())?;
    out.flush()?;

    Ok(Transcript {
        resources,
        templates,
        tools,
        greeting,
        sum,
    })
}
