//! `post_message` tool: post to a resolved channel, gated by the posting policy.

use std::sync::Arc;

use serde_json::Value;

use crate::config::PostPolicy;
use crate::policy::SecurityPolicy;
use crate::slack::SlackClient;
use crate::table::{Cell, Table};
use crate::tools::args::{get_opt_string, get_string};
use crate::tools::registry::{BoxFuture, Tool};
use crate::tools::result::ToolResult;

const HEADERS: &[&str] = &["ts", "channel"];

pub struct PostMessageTool {
    client: Arc<SlackClient>,
    policy: Arc<SecurityPolicy>,
    post: PostPolicy,
}

impl PostMessageTool {
    pub fn new(client: Arc<SlackClient>, policy: Arc<SecurityPolicy>, post: PostPolicy) -> Self {
        Self {
            client,
            policy,
            post,
        }
    }
}

impl Tool for PostMessageTool {
    fn name(&self) -> &str {
        "post_message"
    }

    fn description(&self) -> &str {
        "Post a message to a channel (id or #name), optionally as a thread reply. Disabled \
         unless posting is enabled in the gateway config, globally or per channel. Direct \
         messages and group direct messages are not accessible."
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "channel": {
                    "type": "string",
                    "description": "Channel id (C...) or #name."
                },
                "text": {
                    "type": "string",
                    "description": "Message text to post."
                },
                "thread_ts": {
                    "type": "string",
                    "description": "Reply in this thread instead of posting to the channel."
                }
            },
            "required": ["channel", "text"]
        })
    }

    fn execute<'a>(&'a self, args: &'a Value) -> BoxFuture<'a, ToolResult> {
        Box::pin(async move {
            let target = match get_string(args, "channel") {
                Ok(t) => t,
                Err(e) => return ToolResult::error(e),
            };
            let text = match get_string(args, "text") {
                Ok(t) => t,
                Err(e) => return ToolResult::error(e),
            };
            let thread_ts = get_opt_string(args, "thread_ts");

            // Security first: a DM target is rejected as such even when
            // posting is disabled outright.
            let channel = match self.policy.resolve_target(&target) {
                Ok(id) => id,
                Err(e) => return ToolResult::error(e.to_string()),
            };
            if !self.post.allows(&channel) {
                return match self.post {
                    PostPolicy::Disabled => ToolResult::error("posting is disabled"),
                    _ => ToolResult::error("posting to this channel is not enabled"),
                };
            }

            match self
                .client
                .post_message(&channel, &text, thread_ts.as_deref())
                .await
            {
                Ok(receipt) => {
                    let mut table = Table::new(HEADERS);
                    table.push(vec![Cell::raw(receipt.ts), Cell::raw(receipt.channel)]);
                    ToolResult::ok(table.render())
                }
                Err(e) => ToolResult::error(e.to_string()),
            }
        })
    }
}
