//! Active-topic table and the single-flight `request` operation.
//!
//! At most one LFG topic is open per format. A second request for the same
//! format is pointed at the open topic instead of creating a new one. The
//! rule is enforced by scanning this table only, which is sound because a
//! single engine owns the table and runs one step at a time.

use crate::config::EngineConfig;
use crate::entities::{ChannelId, RequestTopic, TopicId, Username};
use crate::messages;
use crate::platform::{ForumPlatform, NewTopic, PlatformError};
use compact_str::CompactString;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{info, warn};

/// Errors returned by [`TopicBook::request`]. Nothing is recorded when one
/// of these is returned.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("unknown format: {0}")]
    UnknownFormat(CompactString),

    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("topic creation returned no topic id")]
    NoTopicId,
}

/// How a request was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    /// A new LFG topic was published.
    Created,
    /// A topic for the format was already open and is returned instead.
    JoinedExisting,
}

/// A player asking for a game.
#[derive(Debug, Clone, Copy)]
pub struct TopicRequest<'a> {
    pub format_key: &'a str,
    pub requester: &'a Username,
    pub origin_channel: Option<ChannelId>,
}

/// The active-topic table.
///
/// Stored as a `Vec` because it never holds more than one entry per
/// configured format.
#[derive(Debug, Default)]
pub struct TopicBook {
    topics: Vec<RequestTopic>,
}

impl TopicBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// The open topic for a format, if any.
    pub fn open_for(&self, format_key: &str) -> Option<&RequestTopic> {
        self.topics.iter().find(|t| t.format_key == format_key)
    }

    pub fn get(&self, id: TopicId) -> Option<&RequestTopic> {
        self.topics.iter().find(|t| t.id == id)
    }

    pub fn topics(&self) -> &[RequestTopic] {
        &self.topics
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Drop a topic from the table.
    pub fn remove(&mut self, id: TopicId) -> Option<RequestTopic> {
        let index = self.topics.iter().position(|t| t.id == id)?;
        Some(self.topics.remove(index))
    }

    /// Add an already published topic (used by restore).
    ///
    /// Refused when the format already has an open topic or the id is known.
    pub fn register(&mut self, topic: RequestTopic) -> bool {
        if self.open_for(&topic.format_key).is_some() || self.get(topic.id).is_some() {
            return false;
        }
        self.topics.push(topic);
        true
    }

    /// Return the open topic for the requested format, publishing one first
    /// if none is open.
    pub async fn request<F: ForumPlatform + ?Sized>(
        &mut self,
        forum: &F,
        config: &EngineConfig,
        request: TopicRequest<'_>,
        now: OffsetDateTime,
    ) -> Result<(RequestTopic, RequestStatus), RequestError> {
        let format = config
            .formats
            .get(request.format_key)
            .ok_or_else(|| RequestError::UnknownFormat(request.format_key.into()))?;

        if let Some(existing) = self.open_for(format.key()) {
            info!(
                topic_id = existing.id,
                format = format.key(),
                requester = %request.requester,
                owner = %existing.requester,
                "Format already has an open topic"
            );
            return Ok((existing.clone(), RequestStatus::JoinedExisting));
        }

        let new_topic = NewTopic {
            title: messages::topic_title(format, request.requester),
            body: messages::topic_body(format, request.requester, config.expiry_window),
            category: format.external_category(),
            tags: vec![config.topic_tag.clone()],
        };

        let Some(id) = forum.create_topic(&new_topic).await? else {
            warn!(
                format = format.key(),
                requester = %request.requester,
                "Topic creation returned no topic id"
            );
            return Err(RequestError::NoTopicId);
        };

        let topic = RequestTopic {
            id,
            requester: request.requester.clone(),
            format_key: format.key().into(),
            origin_channel: request.origin_channel,
            created_at: now,
        };
        self.topics.push(topic.clone());

        info!(
            topic_id = id,
            format = format.key(),
            requester = %request.requester,
            "Created LFG topic"
        );
        Ok((topic, RequestStatus::Created))
    }
}
