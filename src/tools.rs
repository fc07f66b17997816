//! Tool dispatcher: registry plus the five channel operations.

pub mod args;
pub mod history;
pub mod list_channels;
pub mod post;
pub mod registry;
pub mod replies;
pub mod result;
pub mod search;

pub use history::ChannelHistoryTool;
pub use list_channels::ListChannelsTool;
pub use post::PostMessageTool;
pub use registry::{Tool, ToolRegistry, tool_to_spec};
pub use replies::ThreadRepliesTool;
pub use result::ToolResult;
pub use search::SearchMessagesTool;

use std::sync::Arc;

use crate::config::PostPolicy;
use crate::directory::Directory;
use crate::policy::SecurityPolicy;
use crate::slack::SlackClient;

/// Build the gateway registry: all five operations. The directory and policy
/// are constructed once and shared; nothing mutates them afterwards.
pub fn build_registry(
    client: Arc<SlackClient>,
    directory: Arc<Directory>,
    policy: Arc<SecurityPolicy>,
    post_policy: PostPolicy,
) -> ToolRegistry {
    let reg = ToolRegistry::new();
    reg.register(ListChannelsTool::new(
        Arc::clone(&directory),
        Arc::clone(&policy),
    ));
    reg.register(ChannelHistoryTool::new(
        Arc::clone(&client),
        Arc::clone(&policy),
    ));
    reg.register(ThreadRepliesTool::new(
        Arc::clone(&client),
        Arc::clone(&policy),
    ));
    reg.register(SearchMessagesTool::new(
        Arc::clone(&client),
        Arc::clone(&policy),
    ));
    reg.register(PostMessageTool::new(client, policy, post_policy));
    reg
}
