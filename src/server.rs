//! JSON-RPC 2.0 stdio server exposing the tool catalog and cache resources.
//!
//! Newline-delimited frames on stdin/stdout; logging goes to stderr (stdout
//! is reserved for protocol messages). Requests are handled one at a time in
//! arrival order. A failing tool call becomes an `isError` payload; the loop
//! itself only ends when stdin closes.

use std::sync::Arc;

use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

use crate::directory::Directory;
use crate::policy::SecurityPolicy;
use crate::table::{Cell, Table};
use crate::tools::ToolRegistry;
use crate::tools::list_channels::render_channels;

const PROTOCOL_VERSION: &str = "2024-11-05";

const USER_HEADERS: &[&str] = &["id", "handle", "display_name"];

pub struct GatewayServer {
    registry: ToolRegistry,
    directory: Arc<Directory>,
    policy: Arc<SecurityPolicy>,
}

impl GatewayServer {
    pub fn new(
        registry: ToolRegistry,
        directory: Arc<Directory>,
        policy: Arc<SecurityPolicy>,
    ) -> Self {
        Self {
            registry,
            directory,
            policy,
        }
    }

    /// Read JSON-RPC from stdin, write responses to stdout, until EOF.
    pub async fn run(&self) -> anyhow::Result<()> {
        let stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();
        let mut lines = BufReader::new(stdin).lines();

        tracing::info!("gateway serving on stdio");
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(response) = self.handle_message(line).await {
                stdout.write_all(response.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
        }
        tracing::info!("stdin closed, shutting down");
        Ok(())
    }

    /// One frame in, at most one frame out (notifications get none).
    pub async fn handle_message(&self, line: &str) -> Option<String> {
        let request: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "unparseable frame");
                return Some(error_response(Value::Null, -32700, &format!("parse error: {e}")));
            }
        };

        let id = request.get("id").cloned().unwrap_or(Value::Null);
        let method = request.get("method").and_then(Value::as_str).unwrap_or("");
        let params = request.get("params").cloned().unwrap_or_else(|| json!({}));
        debug!(method, "request");

        match method {
            "initialize" => Some(self.handle_initialize(id)),
            "ping" => Some(success_response(id, json!({}))),
            "tools/list" => Some(self.handle_tools_list(id)),
            "tools/call" => Some(self.handle_tools_call(id, &params).await),
            "resources/list" => Some(self.handle_resources_list(id)),
            "resources/read" => Some(self.handle_resources_read(id, &params)),
            m if m.starts_with("notifications/") => None,
            _ => Some(error_response(
                id,
                -32601,
                &format!("method not found: {method}"),
            )),
        }
    }

    fn handle_initialize(&self, id: Value) -> String {
        success_response(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {
                    "tools": {},
                    "resources": {}
                },
                "serverInfo": {
                    "name": "slackgate",
                    "version": env!("CARGO_PKG_VERSION")
                }
            }),
        )
    }

    fn handle_tools_list(&self, id: Value) -> String {
        success_response(id, json!({ "tools": self.registry.to_specs() }))
    }

    async fn handle_tools_call(&self, id: Value, params: &Value) -> String {
        let name = params.get("name").and_then(Value::as_str).unwrap_or("");
        let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

        let result = self.registry.execute(name, &arguments).await;
        if result.is_error {
            warn!(tool = name, error = %result.text, "tool call failed");
        }
        success_response(
            id,
            json!({
                "content": [{ "type": "text", "text": result.text }],
                "isError": result.is_error
            }),
        )
    }

    fn channels_uri(&self) -> String {
        format!("slack://{}/channels", self.directory.workspace())
    }

    fn users_uri(&self) -> String {
        format!("slack://{}/users", self.directory.workspace())
    }

    fn handle_resources_list(&self, id: Value) -> String {
        success_response(
            id,
            json!({
                "resources": [
                    {
                        "uri": self.channels_uri(),
                        "name": "channels",
                        "description": "Directory snapshot of public and private channels.",
                        "mimeType": "text/csv"
                    },
                    {
                        "uri": self.users_uri(),
                        "name": "users",
                        "description": "Directory snapshot of workspace users.",
                        "mimeType": "text/csv"
                    }
                ]
            }),
        )
    }

    fn handle_resources_read(&self, id: Value, params: &Value) -> String {
        let uri = params.get("uri").and_then(Value::as_str).unwrap_or("");
        let text = if uri == self.channels_uri() {
            render_channels(&self.directory, &self.policy, true, true, usize::MAX)
        } else if uri == self.users_uri() {
            self.render_users()
        } else {
            return error_response(id, -32602, &format!("unknown resource: {uri}"));
        };
        success_response(
            id,
            json!({
                "contents": [{ "uri": uri, "mimeType": "text/csv", "text": text }]
            }),
        )
    }

    fn render_users(&self) -> String {
        let mut table = Table::new(USER_HEADERS);
        for u in self.directory.users() {
            table.push(vec![
                Cell::raw(u.id.clone()),
                Cell::raw(format!("@{}", u.handle)),
                Cell::text(u.display_name.clone()),
            ]);
        }
        table.render()
    }
}

fn success_response(id: Value, result: Value) -> String {
    json!({ "jsonrpc": "2.0", "id": id, "result": result }).to_string()
}

fn error_response(id: Value, code: i64, message: &str) -> String {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message }
    })
    .to_string()
}
