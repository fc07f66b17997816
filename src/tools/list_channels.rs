//! `list_channels` tool: tabulate cached channels, public and private only.

use std::sync::Arc;

use serde_json::Value;

use crate::directory::Directory;
use crate::policy::SecurityPolicy;
use crate::table::{Cell, Table};
use crate::tools::args::get_limit;
use crate::tools::registry::{BoxFuture, Tool};
use crate::tools::result::ToolResult;

const DEFAULT_LIMIT: u32 = 100;
const MAX_LIMIT: u32 = 1000;

const HEADERS: &[&str] = &["id", "name", "visibility", "topic", "purpose", "member_count"];

pub struct ListChannelsTool {
    directory: Arc<Directory>,
    policy: Arc<SecurityPolicy>,
}

impl ListChannelsTool {
    pub fn new(directory: Arc<Directory>, policy: Arc<SecurityPolicy>) -> Self {
        Self { directory, policy }
    }
}

/// Render the channel table: cache iteration order, blocked entries skipped.
/// Shared with the `channels` resource snapshot.
pub(crate) fn render_channels(
    directory: &Directory,
    policy: &SecurityPolicy,
    public: bool,
    private: bool,
    limit: usize,
) -> String {
    let mut table = Table::new(HEADERS);
    for ch in directory.channels() {
        if table.len() >= limit {
            break;
        }
        if policy.is_blocked(&ch.id, Some(&ch.name)) {
            continue;
        }
        if ch.is_private && !private {
            continue;
        }
        if !ch.is_private && !public {
            continue;
        }
        table.push(vec![
            Cell::raw(ch.id.clone()),
            Cell::text(ch.name.clone()),
            Cell::raw(if ch.is_private { "private" } else { "public" }),
            Cell::opt_text(ch.topic.as_deref()),
            Cell::opt_text(ch.purpose.as_deref()),
            Cell::opt_raw(ch.member_count.map(|n| n.to_string())),
        ]);
    }
    table.render()
}

/// Parse the requested type set. Only the two channel types exist in this
/// gateway's address space; anything else is a validation error.
fn parse_types(args: &Value) -> Result<(bool, bool), String> {
    let raw = match args.get("types").and_then(Value::as_str) {
        None => return Ok((true, true)),
        Some(r) => r,
    };
    let mut public = false;
    let mut private = false;
    for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        match token {
            "public_channel" => public = true,
            "private_channel" => private = true,
            other => {
                return Err(format!(
                    "unsupported channel type '{other}' (allowed: public_channel, private_channel)"
                ));
            }
        }
    }
    if !public && !private {
        return Err("'types' must name at least one channel type".to_string());
    }
    Ok((public, private))
}

impl Tool for ListChannelsTool {
    fn name(&self) -> &str {
        "list_channels"
    }

    fn description(&self) -> &str {
        "List the workspace's channels as CSV (id, name, visibility, topic, purpose, member count). \
         Covers public and private channels only; direct messages and group direct messages \
         are never listed."
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "types": {
                    "type": "string",
                    "description": "Comma-separated channel types to include: public_channel, private_channel. Default: both."
                },
                "limit": {
                    "type": "integer",
                    "description": "Max channels to return (default 100, max 1000).",
                    "minimum": 1,
                    "maximum": 1000
                }
            }
        })
    }

    fn execute<'a>(&'a self, args: &'a Value) -> BoxFuture<'a, ToolResult> {
        Box::pin(async move {
            let (public, private) = match parse_types(args) {
                Ok(t) => t,
                Err(e) => return ToolResult::error(e),
            };
            let limit = get_limit(args, "limit", DEFAULT_LIMIT, MAX_LIMIT) as usize;
            ToolResult::ok(render_channels(
                &self.directory,
                &self.policy,
                public,
                private,
                limit,
            ))
        })
    }
}
