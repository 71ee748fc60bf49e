//! Engine-side records and the read-only snapshots fetched from the forum.

mod request_topic;

pub use request_topic::RequestTopic;

use compact_str::CompactString;

/// A forum username. Compared case-insensitively wherever identity matters.
pub type Username = CompactString;

/// Forum topic id of an LFG post.
pub type TopicId = u64;

/// Id of a private conversation (a private-message topic on the forum).
pub type ChannelId = u64;

/// Per-channel sequential message number.
pub type MessageId = u64;

/// One inbox row as listed by the forum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSummary {
    pub channel_id: ChannelId,
    /// Id of the newest message in the channel.
    pub tail_message_id: MessageId,
    /// Messages the bot has not read yet.
    pub unread_count: u64,
}

impl ChannelSummary {
    pub fn has_pending(&self) -> bool {
        self.unread_count > 0
    }
}

/// A message inside a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMessage {
    pub id: MessageId,
    pub author: Username,
    pub text: String,
}

/// Vote state of an LFG poll, re-fetched every cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSnapshot {
    pub topic_id: TopicId,
    pub voter_count: u32,
    /// Closed on the forum (e.g. by a moderator).
    pub closed: bool,
    pub voters: Vec<Username>,
}

/// An open topic found in a category listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicListing {
    pub id: TopicId,
    pub title: String,
}
