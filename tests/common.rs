use std::sync::Arc;

use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use slackgate::config::SlackConfig;
use slackgate::directory::Directory;
use slackgate::policy::SecurityPolicy;
use slackgate::slack::SlackClient;

/// Mock Slack Web API endpoint for integration tests.
pub struct MockSlack {
    pub server: MockServer,
}

impl MockSlack {
    pub async fn new() -> Self {
        let server = MockServer::start().await;
        Self { server }
    }

    pub fn config(&self) -> SlackConfig {
        SlackConfig {
            bot_token: Some("xoxb-test".to_string()),
            user_token: Some("xoxp-test".to_string()),
            api_base: Some(self.server.uri()),
        }
    }

    pub fn client(&self) -> Arc<SlackClient> {
        Arc::new(SlackClient::new(&self.config()))
    }

    pub async fn mock_auth_test(&self) {
        Mock::given(method("GET"))
            .and(path("/auth.test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "team": "acme",
                "user_id": "UBOT"
            })))
            .mount(&self.server)
            .await;
    }

    /// Mount one page of conversations.list. `cursor` is the cursor this page
    /// is fetched with (None = first page); `next` the cursor it hands back.
    pub async fn mock_channels_page(&self, cursor: Option<&str>, channels: Value, next: Option<&str>) {
        let mock = Mock::given(method("GET")).and(path("/conversations.list"));
        let mock = match cursor {
            Some(c) => mock.and(query_param("cursor", c)),
            None => mock.and(query_param_is_missing("cursor")),
        };
        mock.respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "channels": channels,
            "response_metadata": { "next_cursor": next.unwrap_or("") }
        })))
        .mount(&self.server)
        .await;
    }

    pub async fn mock_users_page(&self, cursor: Option<&str>, members: Value, next: Option<&str>) {
        let mock = Mock::given(method("GET")).and(path("/users.list"));
        let mock = match cursor {
            Some(c) => mock.and(query_param("cursor", c)),
            None => mock.and(query_param_is_missing("cursor")),
        };
        mock.respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "members": members,
            "response_metadata": { "next_cursor": next.unwrap_or("") }
        })))
        .mount(&self.server)
        .await;
    }

    /// Small single-page workspace: two channels, one user. The group DM row
    /// simulates a remote that returns one despite the type filter, which is
    /// exactly what the cached-flag checks exist for.
    pub async fn mock_small_workspace(&self) {
        self.mock_auth_test().await;
        self.mock_channels_page(
            None,
            json!([
                public_channel("C100", "general"),
                private_channel("C200", "secret"),
                group_dm("G900", "mpdm-ann--bob--eve-1"),
            ]),
            None,
        )
        .await;
        self.mock_users_page(None, json!([member("U1", "ann", "Ann")]), None)
            .await;
    }

    pub async fn build_directory(&self) -> Arc<Directory> {
        let client = self.client();
        Arc::new(Directory::build(&client).await.expect("directory build"))
    }

    /// Directory + policy built against this mock workspace.
    pub async fn build_stack(&self) -> (Arc<SlackClient>, Arc<Directory>, Arc<SecurityPolicy>) {
        let client = self.client();
        let directory = self.build_directory().await;
        let policy = Arc::new(SecurityPolicy::new(Arc::clone(&directory), false));
        (client, directory, policy)
    }
}

pub fn public_channel(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "is_private": false,
        "topic": { "value": "" },
        "purpose": { "value": "" },
        "num_members": 3
    })
}

pub fn private_channel(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "is_private": true,
        "num_members": 2
    })
}

pub fn group_dm(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "is_private": true,
        "is_mpim": true
    })
}

pub fn member(id: &str, handle: &str, display: &str) -> Value {
    json!({
        "id": id,
        "name": handle,
        "deleted": false,
        "is_bot": false,
        "profile": { "display_name": display, "real_name": "" }
    })
}
