//! `search_messages` tool: free-text search with optional channel and author scoping.

use std::sync::Arc;

use serde_json::Value;

use crate::policy::SecurityPolicy;
use crate::slack::{SearchMatch, SlackClient};
use crate::table::{Cell, Table};
use crate::tools::args::{get_limit, get_opt_string, get_string};
use crate::tools::registry::{BoxFuture, Tool};
use crate::tools::result::ToolResult;

const DEFAULT_LIMIT: u32 = 20;
const MAX_LIMIT: u32 = 100;

const HEADERS: &[&str] = &["user", "text", "ts", "channel", "permalink"];

pub struct SearchMessagesTool {
    client: Arc<SlackClient>,
    policy: Arc<SecurityPolicy>,
}

impl SearchMessagesTool {
    pub fn new(client: Arc<SlackClient>, policy: Arc<SecurityPolicy>) -> Self {
        Self { client, policy }
    }
}

/// Compose the upstream query: the free text plus optional `in:` / `from:`
/// clauses. The channel clause uses the cached `#name` when the resolved id
/// has one, the raw id otherwise.
fn build_query(text: &str, channel_clause: Option<&str>, from_user: Option<&str>) -> String {
    let mut query = text.to_string();
    if let Some(chan) = channel_clause {
        query.push_str(" in:");
        query.push_str(chan);
    }
    if let Some(user) = from_user {
        query.push_str(" from:");
        if !user.starts_with('@') {
            query.push('@');
        }
        query.push_str(user);
    }
    query
}

/// A match is dropped when its channel is a DM or group DM, whether that is
/// visible syntactically, in the cache, or in the match's own flags.
fn match_blocked(policy: &SecurityPolicy, m: &SearchMatch) -> bool {
    match &m.channel {
        None => false,
        Some(ch) => ch.is_im || ch.is_mpim || policy.is_blocked(&ch.id, ch.name.as_deref()),
    }
}

impl Tool for SearchMessagesTool {
    fn name(&self) -> &str {
        "search_messages"
    }

    fn description(&self) -> &str {
        "Search messages across the workspace as CSV. Optionally scope to one channel \
         (id or #name; direct messages and group direct messages are not accessible) \
         and/or one author."
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Free-text search query."
                },
                "channel": {
                    "type": "string",
                    "description": "Restrict matches to this channel (id or #name)."
                },
                "from_user": {
                    "type": "string",
                    "description": "Restrict matches to this author (handle, with or without @)."
                },
                "limit": {
                    "type": "integer",
                    "description": "Max matches to return (default 20, max 100).",
                    "minimum": 1,
                    "maximum": 100
                }
            },
            "required": ["query"]
        })
    }

    fn execute<'a>(&'a self, args: &'a Value) -> BoxFuture<'a, ToolResult> {
        Box::pin(async move {
            let text = match get_string(args, "query") {
                Ok(q) => q,
                Err(e) => return ToolResult::error(e),
            };
            let limit = get_limit(args, "limit", DEFAULT_LIMIT, MAX_LIMIT);

            // The channel scope goes through the same resolution and policy
            // gate as a direct fetch would.
            let channel_clause = match get_opt_string(args, "channel") {
                None => None,
                Some(target) => match self.policy.resolve_target(&target) {
                    Ok(id) => Some(
                        self.policy
                            .directory()
                            .channel_by_id(&id)
                            .map(|ch| ch.name.clone())
                            .unwrap_or(id),
                    ),
                    Err(e) => return ToolResult::error(e.to_string()),
                },
            };
            let from_user = get_opt_string(args, "from_user");

            let query = build_query(&text, channel_clause.as_deref(), from_user.as_deref());
            let matches = match self.client.search(&query, limit).await {
                Ok(m) => m,
                Err(e) => return ToolResult::error(e.to_string()),
            };

            let mut table = Table::new(HEADERS);
            for m in &matches {
                if match_blocked(&self.policy, m) {
                    continue;
                }
                let channel_label = m
                    .channel
                    .as_ref()
                    .map(|ch| match &ch.name {
                        Some(name) if !name.is_empty() => format!("#{}", name),
                        _ => ch.id.clone(),
                    })
                    .unwrap_or_default();
                table.push(vec![
                    Cell::opt_text(m.username.as_deref()),
                    Cell::opt_text(m.text.as_deref()),
                    Cell::raw(m.ts.clone()),
                    Cell::text(channel_label),
                    Cell::opt_raw(m.permalink.clone()),
                ]);
            }
            ToolResult::ok(table.render())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::testutil::directory;
    use crate::slack::SearchChannelObj;

    #[test]
    fn query_clauses_compose() {
        assert_eq!(build_query("deploy", None, None), "deploy");
        assert_eq!(
            build_query("deploy", Some("#general"), None),
            "deploy in:#general"
        );
        assert_eq!(
            build_query("deploy", Some("C123"), Some("ann")),
            "deploy in:C123 from:@ann"
        );
        assert_eq!(
            build_query("deploy", None, Some("@ann")),
            "deploy from:@ann"
        );
    }

    #[test]
    fn dm_matches_are_dropped() {
        let policy = SecurityPolicy::new(Arc::new(directory(vec![], vec![])), false);
        let dm = SearchMatch {
            username: Some("ann".into()),
            text: Some("psst".into()),
            ts: "1.0".into(),
            channel: Some(SearchChannelObj {
                id: "D555".into(),
                name: None,
                is_im: false,
                is_mpim: false,
            }),
            permalink: None,
        };
        assert!(match_blocked(&policy, &dm));

        // Modern group-DM ids carry no D prefix; the match's own flag is the
        // only signal when the cache has never seen it.
        let mpim = SearchMatch {
            channel: Some(SearchChannelObj {
                id: "C888".into(),
                name: Some("mpdm-ann--bob-1".into()),
                is_im: false,
                is_mpim: true,
            }),
            ..dm.clone()
        };
        assert!(match_blocked(&policy, &mpim));

        let open = SearchMatch {
            channel: Some(SearchChannelObj {
                id: "C1".into(),
                name: Some("general".into()),
                is_im: false,
                is_mpim: false,
            }),
            ..dm
        };
        assert!(!match_blocked(&policy, &open));
    }
}
