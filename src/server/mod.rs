//! MCP server: newline-delimited JSON-RPC 2.0 over stdio.
//!
//! ## Concurrency
//!
//! Each incoming line is handled in its own tokio task, so a slow decode
//! never blocks `ping` or a second `tools/call`. Responses are sent over an
//! `mpsc` channel to a single writer task, which keeps each JSON line intact
//! on stdout. Responses can therefore arrive out of request order; clients
//! match them by `id`.
//!
//! stdout carries protocol traffic only. All logging goes to stderr.

pub mod protocol;
pub mod tools;

pub use protocol::{JsonRpcRequest, JsonRpcResponse, RpcError};
pub use tools::{CallToolResult, Content, Tool, ToolGateway, TOOL_NAME};

use crate::error::GatewayError;
use protocol::{INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR};
use serde::Deserialize;
use serde_json::{json, Value};
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

pub const SERVER_NAME: &str = "qr-code-reader";

/// Protocol revision announced when the client does not name one.
pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";

#[derive(Debug, Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// Routes JSON-RPC methods to the [`ToolGateway`].
#[derive(Debug, Clone, Default)]
pub struct McpServer {
    gateway: ToolGateway,
}

impl McpServer {
    pub fn new(gateway: ToolGateway) -> Self {
        Self { gateway }
    }

    /// Handle one raw input line. Returns `None` for notifications.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                warn!("Unparsable message: {}", e);
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    RpcError::new(PARSE_ERROR, format!("Parse error: {e}")),
                ));
            }
        };

        let id = value.get("id").cloned().unwrap_or(Value::Null);
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(r) => r,
            Err(e) => {
                return Some(JsonRpcResponse::failure(
                    id,
                    RpcError::new(INVALID_REQUEST, format!("Invalid request: {e}")),
                ));
            }
        };

        self.handle_request(request).await
    }

    /// Handle a parsed request. Returns `None` for notifications.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            debug!("Notification: {}", request.method);
            return None;
        }
        let id = request.id.clone().unwrap_or(Value::Null);
        debug!("Request {}: {}", id, request.method);

        let outcome = match request.method.as_str() {
            "initialize" => Ok(self.initialize(request.params.as_ref())),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": self.gateway.list_tools() })),
            "tools/call" => self.call_tool(request.params).await,
            other => Err(RpcError::new(
                METHOD_NOT_FOUND,
                format!("Method not found: {other}"),
            )),
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => JsonRpcResponse::failure(id, e),
        })
    }

    fn initialize(&self, params: Option<&Value>) -> Value {
        let version = params
            .and_then(|p| p.get("protocolVersion"))
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_PROTOCOL_VERSION);

        json!({
            "protocolVersion": version,
            "capabilities": { "tools": {} },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION"),
            }
        })
    }

    async fn call_tool(&self, params: Option<Value>) -> Result<Value, RpcError> {
        let params: CallParams = serde_json::from_value(params.unwrap_or(Value::Null))
            .map_err(|e| RpcError::new(INVALID_PARAMS, format!("Invalid params: {e}")))?;

        let result = self
            .gateway
            .call_tool(&params.name, &params.arguments)
            .await
            .map_err(gateway_error)?;

        serde_json::to_value(result)
            .map_err(|e| RpcError::new(INVALID_PARAMS, format!("Unserialisable result: {e}")))
    }
}

fn gateway_error(e: GatewayError) -> RpcError {
    warn!("{}", e);
    RpcError::new(INVALID_PARAMS, e.to_string())
}

/// Serve MCP on the process's stdin/stdout until stdin closes.
pub async fn serve_stdio(server: McpServer) -> io::Result<()> {
    info!(
        "QR Code Reader MCP Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );
    serve(server, tokio::io::stdin(), tokio::io::stdout()).await
}

/// Serve MCP over any byte stream pair.
///
/// Returns once `reader` reaches EOF (or fails) and every in-flight request
/// has been answered. A line that is not valid UTF-8 gets a parse error
/// reply and does not stop the loop.
pub async fn serve<R, W>(server: McpServer, reader: R, writer: W) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let server = Arc::new(server);
    let (tx, rx) = mpsc::unbounded_channel::<String>();
    let writer_task = tokio::spawn(write_lines(writer, rx));

    let mut reader = BufReader::new(reader);
    // Kept across select! iterations: a cancelled read_until leaves its
    // partial bytes here and the next call appends the rest.
    let mut buf = Vec::new();
    let mut in_flight = JoinSet::new();
    let mut read_error = None;

    loop {
        tokio::select! {
            read = reader.read_until(b'\n', &mut buf) => {
                match read {
                    Ok(0) => {
                        if !buf.is_empty() {
                            dispatch(&server, &tx, &mut in_flight, std::mem::take(&mut buf));
                        }
                        break;
                    }
                    Ok(_) => dispatch(&server, &tx, &mut in_flight, std::mem::take(&mut buf)),
                    Err(e) => {
                        error!("Failed to read from input: {}", e);
                        read_error = Some(e);
                        break;
                    }
                }
            }
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(e) = joined {
                    error!("Request task failed: {}", e);
                }
            }
        }
    }

    while let Some(joined) = in_flight.join_next().await {
        if let Err(e) = joined {
            error!("Request task failed: {}", e);
        }
    }

    drop(tx);
    writer_task
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))??;

    match read_error {
        Some(e) => Err(e),
        None => {
            info!("Input closed, server stopped");
            Ok(())
        }
    }
}

/// Handle one raw input line on its own task. Blank lines are skipped.
fn dispatch(
    server: &Arc<McpServer>,
    tx: &mpsc::UnboundedSender<String>,
    in_flight: &mut JoinSet<()>,
    raw: Vec<u8>,
) {
    let line = match String::from_utf8(raw) {
        Ok(line) => line,
        Err(e) => {
            warn!("Input line is not valid UTF-8: {}", e);
            send(
                tx,
                &JsonRpcResponse::failure(
                    Value::Null,
                    RpcError::new(PARSE_ERROR, format!("Parse error: {e}")),
                ),
            );
            return;
        }
    };
    if line.trim().is_empty() {
        return;
    }

    let server = Arc::clone(server);
    let tx = tx.clone();
    in_flight.spawn(async move {
        if let Some(response) = server.handle_line(line.trim_end()).await {
            send(&tx, &response);
        }
    });
}

fn send(tx: &mpsc::UnboundedSender<String>, response: &JsonRpcResponse) {
    match serde_json::to_string(response) {
        Ok(line) => {
            if tx.send(line).is_err() {
                warn!("Response dropped: writer has shut down");
            }
        }
        Err(e) => error!("Failed to serialise response: {}", e),
    }
}

async fn write_lines<W>(mut writer: W, mut rx: mpsc::UnboundedReceiver<String>) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = rx.recv().await {
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    writer.shutdown().await
}
