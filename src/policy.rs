//! Security policy: classifies and resolves channel targets.
//!
//! Single authority consulted by every code path that can reach a channel.
//! DMs and group DMs are rejected with fixed messages that never say which
//! record matched.

use std::sync::Arc;

use thiserror::Error;

use crate::directory::Directory;

/// Slack direct-message conversation ids carry this prefix. Recognized
/// before any cache lookup; group-DM ids have no such prefix and are only
/// caught via cached flags.
const DM_ID_PREFIX: char = 'D';

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("direct messages are not accessible")]
    DirectMessage,
    #[error("group direct messages are not accessible")]
    GroupDirectMessage,
    /// A named alias with no cache entry. Distinct from a security
    /// rejection.
    #[error("channel not found: {0}")]
    NotFound(String),
}

pub struct SecurityPolicy {
    directory: Arc<Directory>,
    /// Hardening option: reject raw ids absent from the cache instead of
    /// passing them through to Slack.
    strict_ids: bool,
}

impl SecurityPolicy {
    pub fn new(directory: Arc<Directory>, strict_ids: bool) -> Self {
        Self {
            directory,
            strict_ids,
        }
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    /// Resolve a caller-supplied target to a channel id, or reject it.
    ///
    /// Accepted forms: `#name` (cache-resolved), raw channel id. Rejected
    /// forms: `@handle` and `D...` ids (syntactically, before the cache is
    /// consulted), plus anything the cache flags as a DM or group DM. A raw
    /// id the cache does not know passes through unresolved unless strict
    /// mode is on; Slack is the final authority for those.
    pub fn resolve_target(&self, input: &str) -> Result<String, PolicyError> {
        let input = input.trim();
        if input.starts_with('@') {
            return Err(PolicyError::DirectMessage);
        }
        if input.starts_with(DM_ID_PREFIX) {
            return Err(PolicyError::DirectMessage);
        }
        if input.starts_with('#') {
            let ch = self
                .directory
                .channel_by_name(input)
                .ok_or_else(|| PolicyError::NotFound(input.to_string()))?;
            if ch.is_mpim {
                return Err(PolicyError::GroupDirectMessage);
            }
            if ch.is_im {
                return Err(PolicyError::DirectMessage);
            }
            return Ok(ch.id.clone());
        }
        match self.directory.channel_by_id(input) {
            Some(ch) if ch.is_mpim => Err(PolicyError::GroupDirectMessage),
            Some(ch) if ch.is_im => Err(PolicyError::DirectMessage),
            Some(ch) => Ok(ch.id.clone()),
            None if self.strict_ids => Err(PolicyError::NotFound(input.to_string())),
            None => Ok(input.to_string()),
        }
    }

    /// Non-throwing companion for filtering bulk listings: the two syntactic
    /// checks plus the cached-flag check, OR'd.
    pub fn is_blocked(&self, id: &str, name: Option<&str>) -> bool {
        if id.starts_with(DM_ID_PREFIX) {
            return true;
        }
        if name.is_some_and(|n| n.starts_with('@')) {
            return true;
        }
        self.directory
            .channel_by_id(id)
            .is_some_and(|ch| ch.is_im || ch.is_mpim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::testutil::{channel, directory, im, mpim, user};

    fn policy(strict: bool) -> SecurityPolicy {
        let dir = directory(
            vec![
                channel("C1", "general", false),
                channel("C2", "secret", true),
                mpim("G900", "mpdm-ann--bob--eve-1"),
                im("D555"),
            ],
            vec![user("U1", "ann", "Ann")],
        );
        SecurityPolicy::new(Arc::new(dir), strict)
    }

    #[test]
    fn handle_alias_rejected_before_cache() {
        let p = policy(false);
        assert_eq!(
            p.resolve_target("@ann").unwrap_err(),
            PolicyError::DirectMessage
        );
        // Even a handle no cache entry exists for.
        assert_eq!(
            p.resolve_target("@nobody").unwrap_err(),
            PolicyError::DirectMessage
        );
    }

    #[test]
    fn dm_id_prefix_rejected_before_cache() {
        let p = policy(false);
        assert_eq!(
            p.resolve_target("D555").unwrap_err(),
            PolicyError::DirectMessage
        );
        assert_eq!(
            p.resolve_target("D000UNKNOWN").unwrap_err(),
            PolicyError::DirectMessage
        );
    }

    #[test]
    fn name_resolution_and_not_found() {
        let p = policy(false);
        assert_eq!(p.resolve_target("#general").unwrap(), "C1");
        assert_eq!(p.resolve_target("#secret").unwrap(), "C2");
        assert_eq!(
            p.resolve_target("#missing").unwrap_err(),
            PolicyError::NotFound("#missing".into())
        );
    }

    #[test]
    fn group_dm_caught_only_via_cached_flags() {
        let p = policy(false);
        // Raw id carries no D prefix; the cache flag is the only signal.
        assert_eq!(
            p.resolve_target("G900").unwrap_err(),
            PolicyError::GroupDirectMessage
        );
        assert_eq!(
            p.resolve_target("#mpdm-ann--bob--eve-1").unwrap_err(),
            PolicyError::GroupDirectMessage
        );
    }

    #[test]
    fn raw_id_resolution_is_idempotent() {
        let p = policy(false);
        let id = p.resolve_target("#general").unwrap();
        assert_eq!(p.resolve_target(&id).unwrap(), id);
    }

    #[test]
    fn unknown_raw_id_passes_through_unless_strict() {
        assert_eq!(policy(false).resolve_target("C404").unwrap(), "C404");
        assert_eq!(
            policy(true).resolve_target("C404").unwrap_err(),
            PolicyError::NotFound("C404".into())
        );
    }

    #[test]
    fn rejection_messages_are_fixed_per_category() {
        let p = policy(false);
        let a = p.resolve_target("@ann").unwrap_err().to_string();
        let b = p.resolve_target("D555").unwrap_err().to_string();
        assert_eq!(a, b);
        assert!(!a.contains("ann"), "message must not leak the target: {a}");
        let g = p.resolve_target("G900").unwrap_err().to_string();
        assert!(!g.contains("G900"), "message must not leak the target: {g}");
    }

    #[test]
    fn surrounding_whitespace_does_not_bypass_checks() {
        let p = policy(false);
        assert_eq!(
            p.resolve_target("  D555 ").unwrap_err(),
            PolicyError::DirectMessage
        );
        assert_eq!(
            p.resolve_target(" @ann").unwrap_err(),
            PolicyError::DirectMessage
        );
    }

    #[test]
    fn is_blocked_covers_all_three_checks() {
        let p = policy(false);
        assert!(p.is_blocked("D555", None));
        assert!(p.is_blocked("D000UNKNOWN", None));
        assert!(p.is_blocked("C1", Some("@ann")));
        assert!(p.is_blocked("G900", None));
        assert!(!p.is_blocked("C1", Some("#general")));
        assert!(!p.is_blocked("C404", None));
    }
}
