//! Slack Web API client: auth.test, conversations, users, search, chat.postMessage.
//!
//! Thin typed wrappers over reqwest. No SDK; Slack's `ok: false` envelope is
//! the failure signal even on HTTP 200.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::SlackConfig;

const DEFAULT_API_BASE: &str = "https://slack.com/api";
const HTTP_TIMEOUT_SECS: u64 = 30;
/// Page size for conversations.list / users.list (Slack recommends <= 200).
const LIST_PAGE_LIMIT: u32 = 200;

/// Errors from the Slack API or HTTP transport.
#[derive(Debug, Error)]
pub enum SlackError {
    #[error("slack http: {0}")]
    Http(String),
    #[error("slack parse: {0}")]
    Parse(String),
    /// Upstream `error` code from an `ok: false` envelope.
    #[error("slack api: {0}")]
    Api(String),
    #[error("slack auth: {0}")]
    Auth(String),
}

/// Format a reqwest error and its source chain for logging (surfaces TLS, DNS, etc.).
fn format_error_chain(e: &impl std::error::Error) -> String {
    let mut s = e.to_string();
    let mut src = e.source();
    while let Some(inner) = src {
        s.push_str(" | ");
        s.push_str(&inner.to_string());
        src = inner.source();
    }
    s
}

// --- Minimal Slack API structs ---

#[derive(Debug, Clone, Deserialize)]
pub struct AuthIdentity {
    /// Workspace (team) label, used in resource URIs.
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub user_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelObj {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub is_im: bool,
    #[serde(default)]
    pub is_mpim: bool,
    #[serde(default)]
    pub topic: Option<TopicObj>,
    #[serde(default)]
    pub purpose: Option<TopicObj>,
    #[serde(default)]
    pub num_members: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopicObj {
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserObj {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub profile: Option<ProfileObj>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileObj {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub real_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageObj {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub ts: String,
    #[serde(default)]
    pub thread_ts: Option<String>,
    #[serde(default)]
    pub reply_count: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchMatch {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub ts: String,
    #[serde(default)]
    pub channel: Option<SearchChannelObj>,
    #[serde(default)]
    pub permalink: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchChannelObj {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_im: bool,
    #[serde(default)]
    pub is_mpim: bool,
}

/// One page of a cursor-paginated listing.
#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

/// One page of channel history or thread replies.
#[derive(Debug)]
pub struct HistoryPage {
    pub messages: Vec<MessageObj>,
    pub next_cursor: Option<String>,
}

/// Confirmation for a posted message.
#[derive(Debug)]
pub struct PostReceipt {
    pub ts: String,
    pub channel: String,
}

#[derive(Debug, Deserialize)]
struct ChannelsResponse {
    #[serde(default)]
    channels: Vec<ChannelObj>,
    #[serde(default)]
    response_metadata: Option<RespMeta>,
}

#[derive(Debug, Deserialize)]
struct UsersResponse {
    #[serde(default)]
    members: Vec<UserObj>,
    #[serde(default)]
    response_metadata: Option<RespMeta>,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    messages: Vec<MessageObj>,
    #[serde(default)]
    response_metadata: Option<RespMeta>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    messages: Option<SearchMatches>,
}

#[derive(Debug, Deserialize)]
struct SearchMatches {
    #[serde(default)]
    matches: Vec<SearchMatch>,
}

#[derive(Debug, Deserialize)]
struct PostResponse {
    #[serde(default)]
    ts: String,
    #[serde(default)]
    channel: String,
}

#[derive(Debug, Deserialize)]
struct RespMeta {
    #[serde(default)]
    next_cursor: String,
}

impl RespMeta {
    /// Slack sends `""` for "no further pages".
    fn cursor(meta: Option<RespMeta>) -> Option<String> {
        meta.map(|m| m.next_cursor).filter(|c| !c.is_empty())
    }
}

/// Shared Slack API client holding the token pair.
pub struct SlackClient {
    client: reqwest::Client,
    base_url: String,
    bot_token: Option<String>,
    user_token: Option<String>,
}

impl SlackClient {
    pub fn new(cfg: &SlackConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .expect("reqwest client");
        let base_url = cfg
            .api_base
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            bot_token: cfg.bot_token.clone().filter(|t| !t.is_empty()),
            user_token: cfg.user_token.clone().filter(|t| !t.is_empty()),
        }
    }

    /// Token for read/post calls: bot preferred, user as fallback.
    fn api_token(&self) -> Result<&str, SlackError> {
        self.bot_token
            .as_deref()
            .or(self.user_token.as_deref())
            .ok_or_else(|| SlackError::Auth("no token configured".into()))
    }

    /// Token for search.messages: user preferred (bot tokens cannot search).
    fn search_token(&self) -> Result<&str, SlackError> {
        self.user_token
            .as_deref()
            .or(self.bot_token.as_deref())
            .ok_or_else(|| SlackError::Auth("no token configured".into()))
    }

    /// GET a Web API method, unwrap the `ok` envelope, deserialize the rest.
    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        token: &str,
        params: &[(&str, &str)],
    ) -> Result<T, SlackError> {
        let url = format!("{}/{}", self.base_url, method);
        let res = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(params)
            .send()
            .await
            .map_err(|e| SlackError::Http(format_error_chain(&e)))?;
        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| SlackError::Http(format_error_chain(&e)))?;
        if !status.is_success() {
            return Err(SlackError::Http(format!("{} {}", status, body)));
        }
        unwrap_envelope(&body)
    }

    pub async fn auth_test(&self) -> Result<AuthIdentity, SlackError> {
        self.get("auth.test", self.api_token()?, &[]).await
    }

    /// One page of conversations.list. Only the requested types are ever
    /// asked for; callers must not request DM types.
    pub async fn list_channels(
        &self,
        types: &str,
        cursor: Option<&str>,
    ) -> Result<Page<ChannelObj>, SlackError> {
        let limit = LIST_PAGE_LIMIT.to_string();
        let mut params = vec![
            ("types", types),
            ("limit", limit.as_str()),
            ("exclude_archived", "true"),
        ];
        if let Some(c) = cursor {
            params.push(("cursor", c));
        }
        let res: ChannelsResponse = self
            .get("conversations.list", self.api_token()?, &params)
            .await?;
        Ok(Page {
            items: res.channels,
            next_cursor: RespMeta::cursor(res.response_metadata),
        })
    }

    /// One page of users.list.
    pub async fn list_users(&self, cursor: Option<&str>) -> Result<Page<UserObj>, SlackError> {
        let limit = LIST_PAGE_LIMIT.to_string();
        let mut params = vec![("limit", limit.as_str())];
        if let Some(c) = cursor {
            params.push(("cursor", c));
        }
        let res: UsersResponse = self.get("users.list", self.api_token()?, &params).await?;
        Ok(Page {
            items: res.members,
            next_cursor: RespMeta::cursor(res.response_metadata),
        })
    }

    pub async fn history(
        &self,
        channel: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<HistoryPage, SlackError> {
        let limit = limit.to_string();
        let mut params = vec![("channel", channel), ("limit", limit.as_str())];
        if let Some(c) = cursor {
            params.push(("cursor", c));
        }
        let res: HistoryResponse = self
            .get("conversations.history", self.api_token()?, &params)
            .await?;
        Ok(HistoryPage {
            messages: res.messages,
            next_cursor: RespMeta::cursor(res.response_metadata),
        })
    }

    pub async fn replies(
        &self,
        channel: &str,
        thread_ts: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<HistoryPage, SlackError> {
        let limit = limit.to_string();
        let mut params = vec![
            ("channel", channel),
            ("ts", thread_ts),
            ("limit", limit.as_str()),
        ];
        if let Some(c) = cursor {
            params.push(("cursor", c));
        }
        let res: HistoryResponse = self
            .get("conversations.replies", self.api_token()?, &params)
            .await?;
        Ok(HistoryPage {
            messages: res.messages,
            next_cursor: RespMeta::cursor(res.response_metadata),
        })
    }

    pub async fn search(&self, query: &str, count: u32) -> Result<Vec<SearchMatch>, SlackError> {
        let count = count.to_string();
        let params = vec![("query", query), ("count", count.as_str())];
        let res: SearchResponse = self
            .get("search.messages", self.search_token()?, &params)
            .await?;
        Ok(res.messages.map(|m| m.matches).unwrap_or_default())
    }

    pub async fn post_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> Result<PostReceipt, SlackError> {
        let url = format!("{}/chat.postMessage", self.base_url);
        let mut body = serde_json::json!({ "channel": channel, "text": text });
        if let Some(ts) = thread_ts {
            body["thread_ts"] = Value::String(ts.to_string());
        }
        let res = self
            .client
            .post(&url)
            .bearer_auth(self.api_token()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| SlackError::Http(format_error_chain(&e)))?;
        let status = res.status();
        let raw = res
            .text()
            .await
            .map_err(|e| SlackError::Http(format_error_chain(&e)))?;
        if !status.is_success() {
            return Err(SlackError::Http(format!("{} {}", status, raw)));
        }
        let parsed: PostResponse = unwrap_envelope(&raw)?;
        Ok(PostReceipt {
            ts: parsed.ts,
            channel: parsed.channel,
        })
    }
}

/// Check `ok`, surface `error` as `SlackError::Api`, then deserialize.
fn unwrap_envelope<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, SlackError> {
    let v: Value = serde_json::from_str(body).map_err(|e| SlackError::Parse(e.to_string()))?;
    if !v.get("ok").and_then(Value::as_bool).unwrap_or(false) {
        let code = v
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown_error");
        return Err(SlackError::Api(code.to_string()));
    }
    serde_json::from_value(v).map_err(|e| SlackError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_ok_false_surfaces_error_code() {
        let err = unwrap_envelope::<PostResponse>(r#"{"ok":false,"error":"channel_not_found"}"#)
            .unwrap_err();
        match err {
            SlackError::Api(code) => assert_eq!(code, "channel_not_found"),
            other => panic!("expected Api, got {:?}", other),
        }
    }

    #[test]
    fn envelope_missing_ok_is_error() {
        let err = unwrap_envelope::<PostResponse>(r#"{"ts":"1.2"}"#).unwrap_err();
        assert!(matches!(err, SlackError::Api(_)));
    }

    #[test]
    fn empty_next_cursor_means_exhausted() {
        assert_eq!(
            RespMeta::cursor(Some(RespMeta {
                next_cursor: String::new()
            })),
            None
        );
        assert_eq!(
            RespMeta::cursor(Some(RespMeta {
                next_cursor: "dXNlcjpVMDYxTkZUVDI=".into()
            })),
            Some("dXNlcjpVMDYxTkZUVDI=".to_string())
        );
        assert_eq!(RespMeta::cursor(None), None);
    }
}
