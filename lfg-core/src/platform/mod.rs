//! Collaborator interfaces for the external platforms.
//!
//! The engine never talks HTTP itself. The server crate adapts the SDK
//! clients to these traits and tests substitute in-memory fakes.

use crate::entities::{
    ChannelId, ChannelMessage, ChannelSummary, MessageId, PollSnapshot, TopicId, TopicListing,
    Username,
};
use async_trait::async_trait;
use thiserror::Error;

/// Errors reported by platform adapters.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// Network failure or a response that could not be read.
    #[error("transport error: {0}")]
    Transport(String),

    /// The platform answered with an error status.
    #[error("platform rejected the request (status {status}): {message}")]
    Rejected { status: u16, message: String },

    /// The platform answered successfully but without a required field.
    #[error("missing data in platform response: {0}")]
    MissingData(&'static str),
}

/// A new LFG topic to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTopic {
    pub title: String,
    pub body: String,
    pub category: u64,
    pub tags: Vec<String>,
}

/// A game room to create once a match is found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomRequest {
    pub name: String,
    pub seat_limit: u32,
    pub game_format: String,
}

/// The discussion platform: inbox, topics and polls.
#[async_trait]
pub trait ForumPlatform: Send + Sync {
    /// List the bot's private conversations with their unread counters.
    async fn list_channels(&self) -> Result<Vec<ChannelSummary>, PlatformError>;

    /// Fetch a conversation's messages, oldest first.
    ///
    /// The window holds every message numbered above `after` and may also
    /// carry older ones, starting with the opening message.
    async fn fetch_messages(
        &self,
        channel: ChannelId,
        after: MessageId,
    ) -> Result<Vec<ChannelMessage>, PlatformError>;

    /// Mark a conversation read up to and including `up_to`.
    async fn mark_read(&self, channel: ChannelId, up_to: MessageId) -> Result<(), PlatformError>;

    /// Post a message into an existing conversation.
    async fn reply(&self, channel: ChannelId, body: &str) -> Result<(), PlatformError>;

    /// Start a conversation between the bot and every recipient.
    async fn open_group_channel(
        &self,
        recipients: &[Username],
        subject: &str,
        body: &str,
    ) -> Result<ChannelId, PlatformError>;

    /// Start a one-to-one conversation between the bot and `recipient`.
    async fn open_direct_channel(
        &self,
        recipient: &Username,
        subject: &str,
        body: &str,
    ) -> Result<ChannelId, PlatformError>;

    /// Publish a topic. `Ok(None)` means the platform accepted the request
    /// but returned no topic id.
    async fn create_topic(&self, topic: &NewTopic) -> Result<Option<TopicId>, PlatformError>;

    async fn delete_topic(&self, topic: TopicId) -> Result<(), PlatformError>;

    /// Current poll state. `Ok(None)` when the topic or its poll is gone.
    async fn poll_snapshot(&self, topic: TopicId) -> Result<Option<PollSnapshot>, PlatformError>;

    /// Open (not closed, not archived) topics in a category.
    async fn list_open_topics(&self, category: u64) -> Result<Vec<TopicListing>, PlatformError>;

    /// Public URL of a topic.
    fn topic_url(&self, topic: TopicId) -> String;
}

/// The game-room platform.
#[async_trait]
pub trait GameRoomPlatform: Send + Sync {
    /// Create a private room and return its joinable URL.
    async fn create_room(&self, request: &RoomRequest) -> Result<String, PlatformError>;
}
