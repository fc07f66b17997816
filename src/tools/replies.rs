//! `thread_replies` tool: one page of replies for a thread in a resolved channel.

use std::sync::Arc;

use serde_json::Value;

use crate::policy::SecurityPolicy;
use crate::slack::SlackClient;
use crate::tools::args::{get_limit, get_opt_string, get_string};
use crate::tools::history::render_messages;
use crate::tools::registry::{BoxFuture, Tool};
use crate::tools::result::ToolResult;

const DEFAULT_LIMIT: u32 = 20;
const MAX_LIMIT: u32 = 100;

pub struct ThreadRepliesTool {
    client: Arc<SlackClient>,
    policy: Arc<SecurityPolicy>,
}

impl ThreadRepliesTool {
    pub fn new(client: Arc<SlackClient>, policy: Arc<SecurityPolicy>) -> Self {
        Self { client, policy }
    }
}

impl Tool for ThreadRepliesTool {
    fn name(&self) -> &str {
        "thread_replies"
    }

    fn description(&self) -> &str {
        "Fetch a page of replies for one thread as CSV, given the channel and the thread's \
         timestamp. Accepts a channel id or #name; direct messages and group direct messages \
         are not accessible. Same paging contract as channel_history."
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "channel": {
                    "type": "string",
                    "description": "Channel id (C...) or #name."
                },
                "thread_ts": {
                    "type": "string",
                    "description": "Timestamp of the thread's parent message."
                },
                "limit": {
                    "type": "integer",
                    "description": "Max replies to return (default 20, max 100).",
                    "minimum": 1,
                    "maximum": 100
                },
                "cursor": {
                    "type": "string",
                    "description": "Continuation cursor from a previous page."
                }
            },
            "required": ["channel", "thread_ts"]
        })
    }

    fn execute<'a>(&'a self, args: &'a Value) -> BoxFuture<'a, ToolResult> {
        Box::pin(async move {
            let target = match get_string(args, "channel") {
                Ok(t) => t,
                Err(e) => return ToolResult::error(e),
            };
            let thread_ts = match get_string(args, "thread_ts") {
                Ok(t) => t,
                Err(e) => return ToolResult::error(e),
            };
            let limit = get_limit(args, "limit", DEFAULT_LIMIT, MAX_LIMIT);
            let cursor = get_opt_string(args, "cursor");

            let channel = match self.policy.resolve_target(&target) {
                Ok(id) => id,
                Err(e) => return ToolResult::error(e.to_string()),
            };
            match self
                .client
                .replies(&channel, &thread_ts, limit, cursor.as_deref())
                .await
            {
                Ok(page) => ToolResult::ok(render_messages(&self.policy, &page)),
                Err(e) => ToolResult::error(e.to_string()),
            }
        })
    }
}
