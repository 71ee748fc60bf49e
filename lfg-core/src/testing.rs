//! In-memory platforms and fixtures shared by the engine tests.

use crate::config::{EngineConfig, FormatDefinition, FormatTable};
use crate::entities::{
    ChannelId, ChannelMessage, ChannelSummary, MessageId, PollSnapshot, TopicId, TopicListing,
    Username,
};
use crate::platform::{ForumPlatform, GameRoomPlatform, NewTopic, PlatformError, RoomRequest};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;
use time::OffsetDateTime;

pub const BOT: &str = "Matchmaker";
pub const CATEGORY: u64 = 35;

pub fn one_v_one() -> FormatDefinition {
    FormatDefinition::new("1v1", "1v1 PDH", CATEGORY, 2, "standard").unwrap()
}

pub fn four_player() -> FormatDefinition {
    FormatDefinition::new("4p", "4-player PDH", CATEGORY, 4, "standard").unwrap()
}

pub fn engine_config() -> EngineConfig {
    EngineConfig::new(
        BOT,
        std::time::Duration::from_secs(30),
        time::Duration::hours(1),
        FormatTable::new(vec![one_v_one(), four_player()]).unwrap(),
    )
}

pub fn t0() -> OffsetDateTime {
    OffsetDateTime::UNIX_EPOCH + time::Duration::days(20_000)
}

/// A message the bot sent through the forum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentMessage {
    Reply {
        channel: ChannelId,
        body: String,
    },
    Group {
        channel: ChannelId,
        recipients: Vec<Username>,
        subject: String,
        body: String,
    },
    Direct {
        channel: ChannelId,
        recipient: Username,
        subject: String,
        body: String,
    },
}

impl SentMessage {
    pub fn body(&self) -> &str {
        match self {
            SentMessage::Reply { body, .. }
            | SentMessage::Group { body, .. }
            | SentMessage::Direct { body, .. } => body,
        }
    }

    pub fn channel(&self) -> ChannelId {
        match self {
            SentMessage::Reply { channel, .. }
            | SentMessage::Group { channel, .. }
            | SentMessage::Direct { channel, .. } => *channel,
        }
    }
}

#[derive(Debug, Default)]
struct Channel {
    messages: Vec<ChannelMessage>,
    unread: u64,
}

#[derive(Debug, Default)]
struct ForumState {
    next_channel: ChannelId,
    next_topic: TopicId,
    channels: BTreeMap<ChannelId, Channel>,
    sent: Vec<SentMessage>,
    channel_attempts: usize,
    created: Vec<NewTopic>,
    deleted: Vec<TopicId>,
    polls: BTreeMap<TopicId, PollSnapshot>,
    open_topics: BTreeMap<u64, Vec<TopicListing>>,
    category_listings: Vec<u64>,
    read_marks: Vec<(ChannelId, MessageId)>,
    fetches: Vec<ChannelId>,

    create_without_id: bool,
    create_error: bool,
    fail_channels: bool,
    fail_listing: bool,
    fail_fetch: BTreeSet<ChannelId>,
    fail_polls: bool,
    fail_delete: bool,
    fail_categories: BTreeSet<u64>,
}

/// A forum kept entirely in memory.
///
/// Players "write" with [`FakeForum::player_says`]; everything the bot does
/// is recorded and can be inspected afterwards.
#[derive(Debug)]
pub struct FakeForum {
    state: Mutex<ForumState>,
}

fn transport(what: &str) -> PlatformError {
    PlatformError::Transport(format!("{what} unavailable"))
}

impl FakeForum {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ForumState {
                next_channel: 1000,
                next_topic: 100,
                ..ForumState::default()
            }),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut ForumState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    /// Append a player message to a conversation, creating it on first use.
    pub fn player_says(&self, channel: ChannelId, author: &str, text: &str) -> MessageId {
        self.with(|s| {
            let entry = s.channels.entry(channel).or_default();
            let id = entry.messages.len() as MessageId + 1;
            entry.messages.push(ChannelMessage {
                id,
                author: author.into(),
                text: text.to_string(),
            });
            entry.unread += 1;
            id
        })
    }

    /// Pretend the bot read everything in a conversation.
    pub fn mark_all_read(&self, channel: ChannelId) {
        self.with(|s| {
            if let Some(entry) = s.channels.get_mut(&channel) {
                entry.unread = 0;
            }
        })
    }

    pub fn set_votes(&self, topic: TopicId, voters: &[&str]) {
        self.with(|s| {
            if let Some(poll) = s.polls.get_mut(&topic) {
                poll.voters = voters.iter().map(|v| Username::from(*v)).collect();
                poll.voter_count = voters.len() as u32;
            }
        })
    }

    pub fn close_poll(&self, topic: TopicId) {
        self.with(|s| {
            if let Some(poll) = s.polls.get_mut(&topic) {
                poll.closed = true;
            }
        })
    }

    /// A moderator removed the topic behind the engine's back.
    pub fn vanish_topic(&self, topic: TopicId) {
        self.with(|s| {
            s.polls.remove(&topic);
            for listings in s.open_topics.values_mut() {
                listings.retain(|t| t.id != topic);
            }
        })
    }

    /// Seed an open topic, as if left behind by a previous run.
    pub fn add_open_topic(&self, category: u64, id: TopicId, title: &str) {
        self.with(|s| {
            s.open_topics.entry(category).or_default().push(TopicListing {
                id,
                title: title.to_string(),
            });
            s.polls.insert(
                id,
                PollSnapshot {
                    topic_id: id,
                    voter_count: 0,
                    closed: false,
                    voters: Vec::new(),
                },
            );
        })
    }

    pub fn fail_next_create_without_id(&self) {
        self.with(|s| s.create_without_id = true)
    }

    pub fn fail_next_create_with_error(&self) {
        self.with(|s| s.create_error = true)
    }

    pub fn fail_channel_creation(&self) {
        self.with(|s| s.fail_channels = true)
    }

    pub fn fail_listing(&self, fail: bool) {
        self.with(|s| s.fail_listing = fail)
    }

    pub fn fail_fetch(&self, channel: ChannelId, fail: bool) {
        self.with(|s| {
            if fail {
                s.fail_fetch.insert(channel);
            } else {
                s.fail_fetch.remove(&channel);
            }
        })
    }

    pub fn fail_polls(&self, fail: bool) {
        self.with(|s| s.fail_polls = fail)
    }

    pub fn fail_delete(&self) {
        self.with(|s| s.fail_delete = true)
    }

    pub fn fail_category(&self, category: u64) {
        self.with(|s| {
            s.fail_categories.insert(category);
        })
    }

    pub fn created_topics(&self) -> Vec<NewTopic> {
        self.with(|s| s.created.clone())
    }

    pub fn deleted_topics(&self) -> Vec<TopicId> {
        self.with(|s| s.deleted.clone())
    }

    pub fn sent_messages(&self) -> Vec<SentMessage> {
        self.with(|s| s.sent.clone())
    }

    /// Replies posted into one conversation.
    pub fn replies_in(&self, channel: ChannelId) -> Vec<String> {
        self.with(|s| {
            s.sent
                .iter()
                .filter_map(|m| match m {
                    SentMessage::Reply { channel: c, body } if *c == channel => Some(body.clone()),
                    _ => None,
                })
                .collect()
        })
    }

    pub fn channel_attempts(&self) -> usize {
        self.with(|s| s.channel_attempts)
    }

    pub fn category_listings(&self) -> Vec<u64> {
        self.with(|s| s.category_listings.clone())
    }

    pub fn read_marks(&self) -> Vec<(ChannelId, MessageId)> {
        self.with(|s| s.read_marks.clone())
    }

    pub fn fetches(&self) -> Vec<ChannelId> {
        self.with(|s| s.fetches.clone())
    }

    fn open_channel(s: &mut ForumState, body: &str) -> ChannelId {
        s.next_channel += 1;
        let id = s.next_channel;
        s.channels.insert(
            id,
            Channel {
                messages: vec![ChannelMessage {
                    id: 1,
                    author: BOT.into(),
                    text: body.to_string(),
                }],
                unread: 0,
            },
        );
        id
    }
}

#[async_trait]
impl ForumPlatform for FakeForum {
    async fn list_channels(&self) -> Result<Vec<ChannelSummary>, PlatformError> {
        self.with(|s| {
            if s.fail_listing {
                return Err(transport("inbox"));
            }
            Ok(s.channels
                .iter()
                .map(|(id, c)| ChannelSummary {
                    channel_id: *id,
                    tail_message_id: c.messages.len() as MessageId,
                    unread_count: c.unread,
                })
                .collect())
        })
    }

    async fn fetch_messages(
        &self,
        channel: ChannelId,
        _after: MessageId,
    ) -> Result<Vec<ChannelMessage>, PlatformError> {
        self.with(|s| {
            s.fetches.push(channel);
            if s.fail_fetch.contains(&channel) {
                return Err(transport("topic"));
            }
            s.channels
                .get(&channel)
                .map(|c| c.messages.clone())
                .ok_or(PlatformError::MissingData("channel"))
        })
    }

    async fn mark_read(&self, channel: ChannelId, up_to: MessageId) -> Result<(), PlatformError> {
        self.with(|s| {
            s.read_marks.push((channel, up_to));
            if let Some(c) = s.channels.get_mut(&channel) {
                c.unread = 0;
            }
            Ok(())
        })
    }

    async fn reply(&self, channel: ChannelId, body: &str) -> Result<(), PlatformError> {
        self.with(|s| {
            let entry = s
                .channels
                .get_mut(&channel)
                .ok_or(PlatformError::MissingData("channel"))?;
            let id = entry.messages.len() as MessageId + 1;
            entry.messages.push(ChannelMessage {
                id,
                author: BOT.into(),
                text: body.to_string(),
            });
            s.sent.push(SentMessage::Reply {
                channel,
                body: body.to_string(),
            });
            Ok(())
        })
    }

    async fn open_group_channel(
        &self,
        recipients: &[Username],
        subject: &str,
        body: &str,
    ) -> Result<ChannelId, PlatformError> {
        self.with(|s| {
            s.channel_attempts += 1;
            if s.fail_channels {
                return Err(PlatformError::Rejected {
                    status: 422,
                    message: "recipients invalid".into(),
                });
            }
            let channel = Self::open_channel(s, body);
            s.sent.push(SentMessage::Group {
                channel,
                recipients: recipients.to_vec(),
                subject: subject.to_string(),
                body: body.to_string(),
            });
            Ok(channel)
        })
    }

    async fn open_direct_channel(
        &self,
        recipient: &Username,
        subject: &str,
        body: &str,
    ) -> Result<ChannelId, PlatformError> {
        self.with(|s| {
            s.channel_attempts += 1;
            if s.fail_channels {
                return Err(transport("private messages"));
            }
            let channel = Self::open_channel(s, body);
            s.sent.push(SentMessage::Direct {
                channel,
                recipient: recipient.clone(),
                subject: subject.to_string(),
                body: body.to_string(),
            });
            Ok(channel)
        })
    }

    async fn create_topic(&self, topic: &NewTopic) -> Result<Option<TopicId>, PlatformError> {
        self.with(|s| {
            if std::mem::take(&mut s.create_error) {
                return Err(transport("posts"));
            }
            if std::mem::take(&mut s.create_without_id) {
                return Ok(None);
            }
            s.next_topic += 1;
            let id = s.next_topic;
            s.created.push(topic.clone());
            s.open_topics
                .entry(topic.category)
                .or_default()
                .push(TopicListing {
                    id,
                    title: topic.title.clone(),
                });
            s.polls.insert(
                id,
                PollSnapshot {
                    topic_id: id,
                    voter_count: 0,
                    closed: false,
                    voters: Vec::new(),
                },
            );
            Ok(Some(id))
        })
    }

    async fn delete_topic(&self, topic: TopicId) -> Result<(), PlatformError> {
        self.with(|s| {
            s.deleted.push(topic);
            if s.fail_delete {
                return Err(PlatformError::Rejected {
                    status: 403,
                    message: "not allowed".into(),
                });
            }
            s.polls.remove(&topic);
            for listings in s.open_topics.values_mut() {
                listings.retain(|t| t.id != topic);
            }
            Ok(())
        })
    }

    async fn poll_snapshot(&self, topic: TopicId) -> Result<Option<PollSnapshot>, PlatformError> {
        self.with(|s| {
            if s.fail_polls {
                return Err(transport("polls"));
            }
            Ok(s.polls.get(&topic).cloned())
        })
    }

    async fn list_open_topics(&self, category: u64) -> Result<Vec<TopicListing>, PlatformError> {
        self.with(|s| {
            s.category_listings.push(category);
            if s.fail_categories.contains(&category) {
                return Err(transport("category"));
            }
            Ok(s.open_topics.get(&category).cloned().unwrap_or_default())
        })
    }

    fn topic_url(&self, topic: TopicId) -> String {
        format!("https://forum.test/t/{topic}")
    }
}

/// Game-room platform that either hands out numbered rooms or always fails.
#[derive(Debug, Default)]
pub struct FakeRooms {
    fail: bool,
    requests: Mutex<Vec<RoomRequest>>,
}

impl FakeRooms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<RoomRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GameRoomPlatform for FakeRooms {
    async fn create_room(&self, request: &RoomRequest) -> Result<String, PlatformError> {
        let mut requests = self.requests.lock().unwrap();
        requests.push(request.clone());
        if self.fail {
            return Err(PlatformError::Rejected {
                status: 500,
                message: "room service down".into(),
            });
        }
        Ok(format!("https://rooms.test/{}", requests.len()))
    }
}
