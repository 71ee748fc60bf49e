use super::{ChannelId, TopicId, Username};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// In-memory record of one open LFG post.
///
/// At most one exists per format at any time. Only the poll monitor
/// removes records; nothing else mutates them after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestTopic {
    pub id: TopicId,
    pub requester: Username,
    pub format_key: CompactString,
    /// The requester's private conversation with the bot. `None` for
    /// topics recovered from the forum after a restart.
    pub origin_channel: Option<ChannelId>,
    pub created_at: OffsetDateTime,
}

impl RequestTopic {
    /// When the topic expires if it never reaches its threshold.
    pub fn expires_at(&self, expiry_window: time::Duration) -> OffsetDateTime {
        self.created_at + expiry_window
    }

    pub fn is_expired(&self, now: OffsetDateTime, expiry_window: time::Duration) -> bool {
        now - self.created_at >= expiry_window
    }

    /// Whether `username` is the requester (case-insensitive).
    pub fn is_requested_by(&self, username: &str) -> bool {
        self.requester.eq_ignore_ascii_case(username)
    }
}
