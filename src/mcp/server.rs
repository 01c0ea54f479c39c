//! MCP server lifecycle and request dispatch.
//!
//! 1. **Initialisation**: `initialize` request, then the
//!    `notifications/initialized` notification
//! 2. **Operation**: `tools/list`, `tools/call` and `ping`
//! 3. **Shutdown**: end of input or a termination signal
//!
//! Requests are handled one at a time in arrival order. Each request gets
//! exactly one response line; notifications get none.

use std::io;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncWrite};

use crate::mcp::protocol::{
    parse_message, IncomingMessage, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse,
    MCP_PROTOCOL_VERSION, SERVER_NAME,
};
use crate::mcp::registry::ToolRegistry;
use crate::mcp::transport::{StdioTransport, Transport};

/// Server state in the MCP lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Waiting for initialize request.
    AwaitingInit,
    /// Initialize received, waiting for initialized notification.
    Initialising,
    /// Ready for normal operation.
    Running,
    /// Shutdown in progress.
    ShuttingDown,
}

/// Server capabilities advertised during initialisation.
#[derive(Debug, Clone, Serialize)]
pub struct ServerCapabilities {
    /// Tool-related capabilities.
    pub tools: ToolCapabilities,
}

/// Tool-specific capabilities. The tool list is fixed, so this is empty.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ToolCapabilities {}

/// Server information for initialisation response.
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    /// Server name.
    pub name: &'static str,
    /// Server version.
    pub version: &'static str,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: SERVER_NAME,
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

/// Client information received during initialisation.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientInfo {
    /// Client name.
    pub name: String,
    /// Client version.
    #[serde(default)]
    pub version: Option<String>,
}

/// Parameters for the initialize request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Protocol version requested by client.
    pub protocol_version: String,
    /// Client capabilities.
    #[serde(default)]
    pub capabilities: Value,
    /// Client information.
    #[serde(default)]
    pub client_info: Option<ClientInfo>,
}

/// Parameters for tools/call request.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    /// Name of the tool to call.
    pub name: String,
    /// Arguments for the tool.
    #[serde(default)]
    pub arguments: Value,
}

/// The MCP server.
#[derive(Debug)]
pub struct McpServer {
    state: ServerState,
    registry: ToolRegistry,
    /// Negotiated protocol version (set after initialisation).
    protocol_version: Option<String>,
}

impl McpServer {
    /// Creates a server exposing the given tools.
    #[must_use]
    pub const fn new(registry: ToolRegistry) -> Self {
        Self {
            state: ServerState::AwaitingInit,
            registry,
            protocol_version: None,
        }
    }

    /// Returns the current server state.
    #[must_use]
    pub const fn state(&self) -> ServerState {
        self.state
    }

    /// The protocol version agreed during initialisation.
    #[must_use]
    pub fn protocol_version(&self) -> Option<&str> {
        self.protocol_version.as_deref()
    }

    /// Serves stdin/stdout until end of input or a termination signal.
    ///
    /// # Errors
    ///
    /// Returns an error if transport I/O fails.
    pub async fn run(&mut self) -> io::Result<()> {
        let mut transport = StdioTransport::stdio();
        self.run_with_shutdown(&mut transport).await
    }

    /// Serves the given transport until end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if transport I/O fails.
    pub async fn serve<R, W>(&mut self, transport: &mut Transport<R, W>) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        loop {
            let line = transport.read_line().await;
            if self.handle_transport_result(transport, line).await? {
                return Ok(());
            }
        }
    }

    #[cfg(unix)]
    async fn run_with_shutdown<R, W>(&mut self, transport: &mut Transport<R, W>) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        loop {
            tokio::select! {
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT, initiating graceful shutdown");
                    self.state = ServerState::ShuttingDown;
                    return Ok(());
                }

                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, initiating graceful shutdown");
                    self.state = ServerState::ShuttingDown;
                    return Ok(());
                }

                line = transport.read_line() => {
                    if self.handle_transport_result(transport, line).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    #[cfg(windows)]
    async fn run_with_shutdown<R, W>(&mut self, transport: &mut Transport<R, W>) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = &mut ctrl_c => {
                    tracing::info!("Received Ctrl+C, initiating graceful shutdown");
                    self.state = ServerState::ShuttingDown;
                    return Ok(());
                }

                line = transport.read_line() => {
                    if self.handle_transport_result(transport, line).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Handles one read from the transport.
    ///
    /// Returns `true` if the server should shut down.
    async fn handle_transport_result<R, W>(
        &mut self,
        transport: &mut Transport<R, W>,
        line: io::Result<Option<String>>,
    ) -> io::Result<bool>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => {
                tracing::info!("Input closed, shutting down");
                self.state = ServerState::ShuttingDown;
                return Ok(true);
            }
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                tracing::warn!(error = %e, "Discarding input line that is not UTF-8");
                transport.write_response(&JsonRpcResponse::parse_error()).await?;
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        if let Some(response) = self.handle_line(&line).await {
            transport.write_response(&response).await?;
        }
        Ok(self.state == ServerState::ShuttingDown)
    }

    /// Handles one input line and returns the response to send, if any.
    ///
    /// Blank lines and notifications produce no response.
    pub async fn handle_line(&mut self, line: &str) -> Option<JsonRpcResponse> {
        if line.trim().is_empty() {
            return None;
        }

        match parse_message(line) {
            Ok(IncomingMessage::Request(req)) => Some(self.handle_request(req).await),
            Ok(IncomingMessage::Notification(notif)) => {
                self.handle_notification(&notif);
                None
            }
            Err(response) => {
                tracing::warn!(
                    error = ?response.error_object().map(|e| &e.message),
                    "Rejected malformed message"
                );
                Some(response)
            }
        }
    }

    async fn handle_request(&mut self, req: JsonRpcRequest) -> JsonRpcResponse {
        tracing::debug!(id = %req.id, method = %req.method, "Request");

        let result = match req.method.as_str() {
            "initialize" => self.handle_initialize(&req),
            "tools/list" => self.handle_tools_list(&req),
            "tools/call" => self.handle_tools_call(&req).await,
            "ping" => Ok(json!({})),
            _ => Err(JsonRpcResponse::method_not_found(req.id.clone(), &req.method)),
        };

        match result {
            Ok(value) => JsonRpcResponse::success(req.id, value),
            Err(response) => response,
        }
    }

    fn handle_notification(&mut self, notif: &JsonRpcNotification) {
        match notif.method.as_str() {
            "notifications/initialized" if self.state == ServerState::Initialising => {
                tracing::info!("Client initialised, server running");
                self.state = ServerState::Running;
            }
            method => tracing::debug!(method, "Ignoring notification"),
        }
    }

    fn handle_initialize(&mut self, req: &JsonRpcRequest) -> Result<Value, JsonRpcResponse> {
        if self.state != ServerState::AwaitingInit {
            return Err(JsonRpcResponse::invalid_request(
                Some(req.id.clone()),
                "Server already initialised",
            ));
        }

        let params: InitializeParams = req.parse_params("initialize")?;
        if let Some(client) = &params.client_info {
            tracing::info!(
                client = %client.name,
                client_version = client.version.as_deref().unwrap_or("unknown"),
                requested_version = %params.protocol_version,
                "Initialising"
            );
        }
        if params.protocol_version != MCP_PROTOCOL_VERSION {
            tracing::debug!(
                requested = %params.protocol_version,
                offered = MCP_PROTOCOL_VERSION,
                "Client requested a different protocol version"
            );
        }

        self.protocol_version = Some(MCP_PROTOCOL_VERSION.to_string());
        self.state = ServerState::Initialising;

        Ok(json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": ServerCapabilities {
                tools: ToolCapabilities::default(),
            },
            "serverInfo": ServerInfo::default(),
        }))
    }

    fn handle_tools_list(&self, req: &JsonRpcRequest) -> Result<Value, JsonRpcResponse> {
        self.require_running(req)?;
        let tools: Vec<_> = self.registry.definitions().collect();
        Ok(json!({ "tools": tools }))
    }

    async fn handle_tools_call(&self, req: &JsonRpcRequest) -> Result<Value, JsonRpcResponse> {
        self.require_running(req)?;
        let params: ToolCallParams = req.parse_params("tool call")?;

        let result = self.registry.call(&params.name, &params.arguments).await;

        serde_json::to_value(&result).map_err(|e| {
            tracing::error!(error = %e, "Failed to serialise tool call result");
            JsonRpcResponse::internal_error(
                req.id.clone(),
                "Internal error: failed to serialise result",
            )
        })
    }

    fn require_running(&self, req: &JsonRpcRequest) -> Result<(), JsonRpcResponse> {
        if self.state == ServerState::Running {
            Ok(())
        } else {
            Err(JsonRpcResponse::invalid_request(
                Some(req.id.clone()),
                "Server not initialised",
            ))
        }
    }
}
