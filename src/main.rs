//! slackgate: policy-enforcing Slack gateway for AI tool calls; stdio JSON-RPC.
//!
//! Startup: config → client → directory cache → registry → serve. A config or
//! cache-build failure is fatal before the first request; nothing after that
//! point terminates the process.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use slackgate::config;
use slackgate::directory::Directory;
use slackgate::policy::SecurityPolicy;
use slackgate::server::GatewayServer;
use slackgate::slack::SlackClient;
use slackgate::tools;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Stderr only: stdout carries protocol frames.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("SLACKGATE_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "slackgate starting");

    let path = config::default_config_path();
    let cfg = match config::load(&path) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "config");
            std::process::exit(1);
        }
    };

    let slack_cfg = cfg.slack.clone().unwrap_or_default();
    let client = Arc::new(SlackClient::new(&slack_cfg));

    // Serving with a partial cache could let a blocked id through for lack of
    // metadata, so a failed build never serves.
    let directory = match Directory::build(&client).await {
        Ok(d) => Arc::new(d),
        Err(e) => {
            tracing::error!(error = %e, "directory build failed");
            std::process::exit(1);
        }
    };

    let policy = Arc::new(SecurityPolicy::new(
        Arc::clone(&directory),
        cfg.strict_channel_ids(),
    ));
    let registry = tools::build_registry(
        client,
        Arc::clone(&directory),
        Arc::clone(&policy),
        cfg.post_policy(),
    );

    GatewayServer::new(registry, directory, policy).run().await
}
