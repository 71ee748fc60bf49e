//! Read-only engine snapshot published after every step.

use crate::entities::{RequestTopic, TopicId, Username};
use compact_str::CompactString;
use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::watch;

pub type StatusSender = watch::Sender<EngineStatus>;
pub type StatusReceiver = watch::Receiver<EngineStatus>;

/// One open LFG topic as shown on the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveTopicStatus {
    pub id: TopicId,
    pub format_key: CompactString,
    pub requester: Username,
    pub created_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
}

impl ActiveTopicStatus {
    pub fn from_topic(topic: &RequestTopic, expiry_window: time::Duration) -> Self {
        Self {
            id: topic.id,
            format_key: topic.format_key.clone(),
            requester: topic.requester.clone(),
            created_at: topic.created_at,
            expires_at: topic.expires_at(expiry_window),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EngineStatus {
    pub active_topics: Vec<ActiveTopicStatus>,
    pub tracked_channels: usize,
    pub completed_cycles: u64,
    pub last_cycle_at: Option<OffsetDateTime>,
}

/// Create the status channel with an empty snapshot.
pub fn status_channel() -> (StatusSender, StatusReceiver) {
    watch::channel(EngineStatus::default())
}
