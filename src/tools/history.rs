//! `channel_history` tool: one page of messages for a resolved channel.

use std::sync::Arc;

use serde_json::Value;

use crate::policy::SecurityPolicy;
use crate::slack::{HistoryPage, SlackClient};
use crate::table::{Cell, Table};
use crate::tools::args::{get_limit, get_opt_string, get_string};
use crate::tools::registry::{BoxFuture, Tool};
use crate::tools::result::ToolResult;

const DEFAULT_LIMIT: u32 = 20;
const MAX_LIMIT: u32 = 100;

const HEADERS: &[&str] = &["user", "text", "ts", "thread_ts", "reply_count", "cursor"];

pub struct ChannelHistoryTool {
    client: Arc<SlackClient>,
    policy: Arc<SecurityPolicy>,
}

impl ChannelHistoryTool {
    pub fn new(client: Arc<SlackClient>, policy: Arc<SecurityPolicy>) -> Self {
        Self { client, policy }
    }
}

/// Render a history/replies page. Author ids become display names; the
/// trailing cursor column is set on the last row only when more pages
/// remain.
pub(crate) fn render_messages(policy: &SecurityPolicy, page: &HistoryPage) -> String {
    let mut table = Table::new(HEADERS);
    let n = page.messages.len();
    for (i, msg) in page.messages.iter().enumerate() {
        let author = msg
            .user
            .as_deref()
            .map(|id| policy.directory().display_name_or_id(id).to_string())
            .unwrap_or_default();
        let cursor = if i + 1 == n {
            Cell::opt_raw(page.next_cursor.clone())
        } else {
            Cell::empty()
        };
        table.push(vec![
            Cell::text(author),
            Cell::opt_text(msg.text.as_deref()),
            Cell::raw(msg.ts.clone()),
            Cell::opt_raw(msg.thread_ts.clone()),
            Cell::opt_raw(msg.reply_count.map(|n| n.to_string())),
            cursor,
        ]);
    }
    table.render()
}

impl Tool for ChannelHistoryTool {
    fn name(&self) -> &str {
        "channel_history"
    }

    fn description(&self) -> &str {
        "Fetch a page of messages from a channel as CSV. Accepts a channel id or #name; \
         direct messages and group direct messages are not accessible. The cursor column \
         of the last row carries the continuation cursor when more pages remain."
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "channel": {
                    "type": "string",
                    "description": "Channel id (C...) or #name."
                },
                "limit": {
                    "type": "integer",
                    "description": "Max messages to return (default 20, max 100).",
                    "minimum": 1,
                    "maximum": 100
                },
                "cursor": {
                    "type": "string",
                    "description": "Continuation cursor from a previous page."
                }
            },
            "required": ["channel"]
        })
    }

    fn execute<'a>(&'a self, args: &'a Value) -> BoxFuture<'a, ToolResult> {
        Box::pin(async move {
            let target = match get_string(args, "channel") {
                Ok(t) => t,
                Err(e) => return ToolResult::error(e),
            };
            let limit = get_limit(args, "limit", DEFAULT_LIMIT, MAX_LIMIT);
            let cursor = get_opt_string(args, "cursor");

            let channel = match self.policy.resolve_target(&target) {
                Ok(id) => id,
                Err(e) => return ToolResult::error(e.to_string()),
            };
            match self.client.history(&channel, limit, cursor.as_deref()).await {
                Ok(page) => ToolResult::ok(render_messages(&self.policy, &page)),
                Err(e) => ToolResult::error(e.to_string()),
            }
        })
    }
}
