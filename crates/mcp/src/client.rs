//! MCP client for a spawned server (spawn, communicate, lifecycle).

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::protocol::{
    CallToolParams, CallToolResult, InitializeParams, InitializeResult, JsonRpcMessage,
    JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, ListResourceTemplatesResult,
    ListResourcesResult, ListToolsResult, ReadResourceParams, ReadResourceResult, RequestId,
    Resource, ResourceTemplate, SUPPORTED_PROTOCOL_VERSIONS, Tool,
};

/// Default timeout for MCP operations.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// How long `shutdown` waits for the server to exit after stdin closes.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Maximum output size (1MB).
pub const MAX_OUTPUT_SIZE: usize = 1024 * 1024;

/// Configuration for an MCP server process.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub timeout: Duration,
}

impl ServerConfig {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args: Vec::new(),
            env: HashMap::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Client side of one MCP session with a child process.
///
/// The child is spawned with `kill_on_drop`, so dropping the client without
/// calling [`Client::shutdown`] still terminates the server.
pub struct Client {
    config: ServerConfig,
    process: Mutex<Child>,
    stdin: Mutex<ChildStdin>,
    stdout: Mutex<BufReader<ChildStdout>>,
    next_id: AtomicI64,
    server_info: Mutex<Option<InitializeResult>>,
    tools: Mutex<Vec<Tool>>,
}

impl Client {
    /// Spawn a new MCP server process.
    pub async fn spawn(config: ServerConfig) -> Result<Self> {
        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args)
            .envs(&config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut process = cmd.spawn().map_err(Error::Spawn)?;
        debug!(
            server = %config.name,
            command = %config.command,
            pid = ?process.id(),
            "spawned server"
        );

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| Error::Spawn(std::io::Error::other("failed to capture stdin")))?;

        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| Error::Spawn(std::io::Error::other("failed to capture stdout")))?;

        Ok(Self {
            config,
            process: Mutex::new(process),
            stdin: Mutex::new(stdin),
            stdout: Mutex::new(BufReader::new(stdout)),
            next_id: AtomicI64::new(1),
            server_info: Mutex::new(None),
            tools: Mutex::new(Vec::new()),
        })
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Perform the initialize handshake (must be called before other operations).
    pub async fn initialize(&self) -> Result<InitializeResult> {
        let params = InitializeParams::default();
        let result: InitializeResult = self.request("initialize", Some(params)).await?;

        if !SUPPORTED_PROTOCOL_VERSIONS.contains(&result.protocol_version.as_str()) {
            return Err(Error::UnsupportedProtocolVersion(result.protocol_version));
        }

        self.notify("notifications/initialized", None::<()>).await?;

        debug!(
            server = %self.config.name,
            protocol = %result.protocol_version,
            remote = %result.server_info.name,
            "session initialized"
        );
        *self.server_info.lock().await = Some(result.clone());

        Ok(result)
    }

    /// Check if the handshake has completed.
    pub async fn is_initialized(&self) -> bool {
        self.server_info.lock().await.is_some()
    }

    /// Get server info (after initialization).
    pub async fn server_info(&self) -> Option<InitializeResult> {
        self.server_info.lock().await.clone()
    }

    /// Fetch the tool list from the server and cache it.
    pub async fn list_tools(&self) -> Result<Vec<Tool>> {
        self.ensure_initialized().await?;
        let result: ListToolsResult = self.request("tools/list", None::<()>).await?;
        *self.tools.lock().await = result.tools.clone();
        Ok(result.tools)
    }

    /// Tools seen by the most recent [`Client::list_tools`].
    pub async fn tools(&self) -> Vec<Tool> {
        self.tools.lock().await.clone()
    }

    /// List concrete resources.
    pub async fn list_resources(&self) -> Result<Vec<Resource>> {
        self.ensure_initialized().await?;
        let result: ListResourcesResult = self.request("resources/list", None::<()>).await?;
        Ok(result.resources)
    }

    /// List resource templates.
    pub async fn list_resource_templates(&self) -> Result<Vec<ResourceTemplate>> {
        self.ensure_initialized().await?;
        let result: ListResourceTemplatesResult = self
            .request("resources/templates/list", None::<()>)
            .await?;
        Ok(result.resource_templates)
    }

    /// Read a resource by uri.
    pub async fn read_resource(&self, uri: &str) -> Result<ReadResourceResult> {
        self.ensure_initialized().await?;
        let params = ReadResourceParams {
            uri: uri.to_string(),
        };
        self.request("resources/read", Some(params)).await
    }

    /// Call a tool by name.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<serde_json::Value>,
    ) -> Result<CallToolResult> {
        self.ensure_initialized().await?;

        let params = CallToolParams {
            name: name.to_string(),
            arguments,
        };

        let result: CallToolResult = self.request("tools/call", Some(params)).await?;

        if result.is_error {
            return Err(Error::ToolCallFailed(result.text_content()));
        }

        Ok(result)
    }

    /// Check if the server process is still running.
    pub async fn is_running(&self) -> bool {
        let mut process = self.process.lock().await;
        matches!(process.try_wait(), Ok(None))
    }

    /// Close the channel and reap the server.
    ///
    /// Closing stdin is the stdio transport's shutdown signal. A server that
    /// has not exited after [`SHUTDOWN_GRACE`] is killed.
    pub async fn shutdown(self) -> Result<()> {
        drop(self.stdin.into_inner());

        let mut process = self.process.into_inner();
        match timeout(SHUTDOWN_GRACE, process.wait()).await {
            Ok(status) => {
                let status = status?;
                debug!(server = %self.config.name, %status, "server exited");
            }
            Err(_) => {
                warn!(server = %self.config.name, "server ignored EOF, killing");
                process.kill().await?;
            }
        }

        Ok(())
    }

    // --- Internal methods ---

    async fn ensure_initialized(&self) -> Result<()> {
        if self.is_initialized().await {
            Ok(())
        } else {
            Err(Error::NotInitialized)
        }
    }

    fn next_request_id(&self) -> RequestId {
        RequestId::Number(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn request<P, R>(&self, method: &str, params: Option<P>) -> Result<R>
    where
        P: serde::Serialize,
        R: serde::de::DeserializeOwned,
    {
        let id = self.next_request_id();
        let mut request = JsonRpcRequest::new(id.clone(), method);
        if let Some(p) = params {
            request = request.with_params(p);
        }

        debug!(server = %self.config.name, %id, method, "sending request");
        let request_json = serde_json::to_string(&request)?;
        self.write_line(&request_json).await?;

        let response = timeout(self.config.timeout, self.read_response(&id))
            .await
            .map_err(|_| Error::Timeout)??;

        if response.id.as_ref() != Some(&id) {
            return Err(Error::InvalidResponse(format!(
                "response ID mismatch: expected {id:?}, got {:?}",
                response.id
            )));
        }

        let result_value = response.into_result()?;
        let result: R = serde_json::from_value(result_value)?;

        Ok(result)
    }

    async fn notify<P>(&self, method: &str, params: Option<P>) -> Result<()>
    where
        P: serde::Serialize,
    {
        let params = params.map(serde_json::to_value).transpose()?;
        let notification = JsonRpcNotification::new(method, params);

        let notification_json = serde_json::to_string(&notification)?;
        self.write_line(&notification_json).await
    }

    async fn write_line(&self, line: &str) -> Result<()> {
        let mut stdin = self.stdin.lock().await;
        let written = async {
            stdin.write_all(line.as_bytes()).await?;
            stdin.write_all(b"\n").await?;
            stdin.flush().await
        }
        .await;

        written.map_err(|e| match e.kind() {
            std::io::ErrorKind::BrokenPipe => Error::ServerExited,
            _ => Error::Io(e),
        })
    }

    /// Read lines until a response arrives.
    ///
    /// Server notifications and requests are skipped, as are responses to
    /// earlier requests that were abandoned on timeout.
    async fn read_response(&self, id: &RequestId) -> Result<JsonRpcResponse> {
        let mut stdout = self.stdout.lock().await;

        loop {
            let mut line = String::new();
            let bytes_read = stdout.read_line(&mut line).await?;
            if bytes_read == 0 {
                return Err(Error::ServerExited);
            }

            if line.len() > MAX_OUTPUT_SIZE {
                return Err(Error::OutputTooLarge {
                    size: line.len(),
                    max: MAX_OUTPUT_SIZE,
                });
            }

            if line.trim().is_empty() {
                continue;
            }

            match JsonRpcMessage::parse(&line) {
                Ok(JsonRpcMessage::Response(response)) if is_stale(response.id.as_ref(), id) => {
                    debug!(
                        server = %self.config.name,
                        id = ?response.id,
                        "discarding late response"
                    );
                }
                Ok(JsonRpcMessage::Response(response)) => return Ok(response),
                Ok(JsonRpcMessage::Notification(n)) => {
                    debug!(
                        server = %self.config.name,
                        method = %n.method,
                        "ignoring server notification"
                    );
                }
                Ok(JsonRpcMessage::Request(r)) => {
                    debug!(
                        server = %self.config.name,
                        method = %r.method,
                        "ignoring server request"
                    );
                }
                Err(e) => {
                    return Err(Error::InvalidResponse(format!("unreadable line: {e}")));
                }
            }
        }
    }
}

/// Ids are issued in increasing order, so a numeric id below the one being
/// awaited belongs to a request that already gave up.
fn is_stale(got: Option<&RequestId>, awaited: &RequestId) -> bool {
    matches!(
        (got, awaited),
        (Some(RequestId::Number(got)), RequestId::Number(awaited)) if got < awaited
    )
}
