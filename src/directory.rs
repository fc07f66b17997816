//! Directory cache: workspace label plus channel/user tables, built once at
//! startup by paginating the Slack listing endpoints to exhaustion.
//!
//! Immutable after build. The by-id and by-name indexes are populated entry
//! by entry in the same pass, so they are always mutually consistent.

use std::collections::HashMap;

use thiserror::Error;

use crate::slack::{ChannelObj, SlackClient, SlackError, UserObj};

/// The only conversation types ever requested from the listing endpoint.
/// DM/MPIM types are never asked for; this is the first of two layers keeping
/// them out of the cache.
pub const ALLOWED_CHANNEL_TYPES: &str = "public_channel,private_channel";

/// Runaway-pagination cap per listing. Exceeding it fails the build; a
/// partial cache must never serve.
const MAX_PAGES: usize = 100;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("directory build: {0}")]
    Slack(#[from] SlackError),
    #[error("directory build: listing exceeded {0} pages")]
    PageCap(usize),
}

#[derive(Debug, Clone)]
pub struct ChannelInfo {
    pub id: String,
    /// `#`-prefixed display name, regardless of Slack's own conventions.
    pub name: String,
    pub is_private: bool,
    pub is_im: bool,
    pub is_mpim: bool,
    pub topic: Option<String>,
    pub purpose: Option<String>,
    pub member_count: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct UserInfo {
    pub id: String,
    /// Bare handle; looked up with an `@` prefix.
    pub handle: String,
    pub display_name: String,
}

/// Process-wide directory, owned by the gateway and passed by reference into
/// the dispatcher. Channels and users are kept in arrival order; the maps
/// index into those vectors.
#[derive(Debug)]
pub struct Directory {
    workspace: String,
    channels: Vec<ChannelInfo>,
    channel_by_id: HashMap<String, usize>,
    channel_by_name: HashMap<String, usize>,
    users: Vec<UserInfo>,
    user_by_id: HashMap<String, usize>,
    user_by_handle: HashMap<String, usize>,
}

impl Directory {
    /// Workspace identity, then channels, then users. Any failure aborts the
    /// whole build.
    pub async fn build(client: &SlackClient) -> Result<Self, DirectoryError> {
        let identity = client.auth_test().await?;
        let mut dir = Self::empty(identity.team);

        let mut cursor: Option<String> = None;
        let mut pages = 0usize;
        loop {
            let page = client
                .list_channels(ALLOWED_CHANNEL_TYPES, cursor.as_deref())
                .await?;
            for ch in page.items {
                dir.insert_channel(ch);
            }
            pages += 1;
            match page.next_cursor {
                Some(next) if pages < MAX_PAGES => cursor = Some(next),
                Some(_) => return Err(DirectoryError::PageCap(pages)),
                None => break,
            }
        }

        let mut cursor: Option<String> = None;
        let mut pages = 0usize;
        loop {
            let page = client.list_users(cursor.as_deref()).await?;
            for user in page.items {
                dir.insert_user(user);
            }
            pages += 1;
            match page.next_cursor {
                Some(next) if pages < MAX_PAGES => cursor = Some(next),
                Some(_) => return Err(DirectoryError::PageCap(pages)),
                None => break,
            }
        }

        tracing::info!(
            workspace = %dir.workspace,
            channels = dir.channels.len(),
            users = dir.users.len(),
            "directory built"
        );
        Ok(dir)
    }

    fn empty(workspace: String) -> Self {
        Self {
            workspace,
            channels: Vec::new(),
            channel_by_id: HashMap::new(),
            channel_by_name: HashMap::new(),
            users: Vec::new(),
            user_by_id: HashMap::new(),
            user_by_handle: HashMap::new(),
        }
    }

    pub(crate) fn insert_channel(&mut self, ch: ChannelObj) {
        let name = ch.name.unwrap_or_default();
        let info = ChannelInfo {
            id: ch.id,
            name: format!("#{}", name),
            is_private: ch.is_private,
            is_im: ch.is_im,
            is_mpim: ch.is_mpim,
            topic: ch.topic.map(|t| t.value).filter(|v| !v.is_empty()),
            purpose: ch.purpose.map(|p| p.value).filter(|v| !v.is_empty()),
            member_count: ch.num_members,
        };
        let idx = self.channels.len();
        self.channel_by_id.insert(info.id.clone(), idx);
        if !name.is_empty() {
            self.channel_by_name.insert(info.name.clone(), idx);
        }
        self.channels.push(info);
    }

    /// Deleted and bot accounts never enter the cache.
    pub(crate) fn insert_user(&mut self, user: UserObj) {
        if user.deleted || user.is_bot {
            return;
        }
        let display_name = user
            .profile
            .as_ref()
            .map(|p| p.display_name.as_str())
            .filter(|s| !s.is_empty())
            .or_else(|| {
                user.profile
                    .as_ref()
                    .map(|p| p.real_name.as_str())
                    .filter(|s| !s.is_empty())
            })
            .unwrap_or(user.name.as_str())
            .to_string();
        let info = UserInfo {
            id: user.id,
            handle: user.name,
            display_name,
        };
        let idx = self.users.len();
        self.user_by_id.insert(info.id.clone(), idx);
        if !info.handle.is_empty() {
            self.user_by_handle.insert(format!("@{}", info.handle), idx);
        }
        self.users.push(info);
    }

    pub fn workspace(&self) -> &str {
        &self.workspace
    }

    pub fn channels(&self) -> &[ChannelInfo] {
        &self.channels
    }

    pub fn users(&self) -> &[UserInfo] {
        &self.users
    }

    pub fn channel_by_id(&self, id: &str) -> Option<&ChannelInfo> {
        self.channel_by_id.get(id).map(|&i| &self.channels[i])
    }

    /// Lookup by `#name`; a bare name is normalized to the prefixed form.
    pub fn channel_by_name(&self, name: &str) -> Option<&ChannelInfo> {
        let idx = if name.starts_with('#') {
            self.channel_by_name.get(name)
        } else {
            self.channel_by_name.get(&format!("#{}", name))
        };
        idx.map(|&i| &self.channels[i])
    }

    pub fn user_by_id(&self, id: &str) -> Option<&UserInfo> {
        self.user_by_id.get(id).map(|&i| &self.users[i])
    }

    /// Lookup by `@handle`; a bare handle is normalized to the prefixed form.
    pub fn user_by_handle(&self, handle: &str) -> Option<&UserInfo> {
        let idx = if handle.starts_with('@') {
            self.user_by_handle.get(handle)
        } else {
            self.user_by_handle.get(&format!("@{}", handle))
        };
        idx.map(|&i| &self.users[i])
    }

    /// Display name for a message author, falling back to the raw id for
    /// authors absent from the cache (bots, deleted accounts).
    pub fn display_name_or_id<'a>(&'a self, user_id: &'a str) -> &'a str {
        self.user_by_id(user_id)
            .map(|u| u.display_name.as_str())
            .unwrap_or(user_id)
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;
    use crate::slack::{ProfileObj, TopicObj};

    pub fn channel(id: &str, name: &str, is_private: bool) -> ChannelObj {
        ChannelObj {
            id: id.into(),
            name: Some(name.into()),
            is_private,
            is_im: false,
            is_mpim: false,
            topic: Some(TopicObj {
                value: String::new(),
            }),
            purpose: None,
            num_members: Some(3),
        }
    }

    pub fn mpim(id: &str, name: &str) -> ChannelObj {
        ChannelObj {
            is_mpim: true,
            is_private: true,
            ..channel(id, name, true)
        }
    }

    pub fn im(id: &str) -> ChannelObj {
        ChannelObj {
            is_im: true,
            is_private: true,
            name: None,
            ..channel(id, "", true)
        }
    }

    pub fn user(id: &str, handle: &str, display: &str) -> UserObj {
        UserObj {
            id: id.into(),
            name: handle.into(),
            deleted: false,
            is_bot: false,
            profile: Some(ProfileObj {
                display_name: display.into(),
                real_name: String::new(),
            }),
        }
    }

    /// In-memory directory seeded without the network.
    pub fn directory(channels: Vec<ChannelObj>, users: Vec<UserObj>) -> Directory {
        let mut dir = Directory::empty("acme".into());
        for ch in channels {
            dir.insert_channel(ch);
        }
        for u in users {
            dir.insert_user(u);
        }
        dir
    }
}
