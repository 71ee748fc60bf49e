//! Discourse wire objects.
//!
//! Only the fields the matchmaker reads are modeled; everything else in the
//! (very large) Discourse payloads is ignored by serde.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Response of `GET /topics/private-messages/{user}.json` and `GET /c/{id}.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct TopicListResponse {
    pub topic_list: TopicList,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopicList {
    #[serde(default)]
    pub topics: Vec<TopicListItem>,
}

/// One row of a topic list.
///
/// Private-message inboxes and category listings share this shape; the
/// read-tracking fields are only meaningful in the inbox.
#[derive(Debug, Clone, Deserialize)]
pub struct TopicListItem {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub highest_post_number: u64,
    /// Older Discourse versions call this `unread`.
    #[serde(default, alias = "unread")]
    pub unread_posts: u64,
    #[serde(default)]
    pub new_posts: u64,
    #[serde(default)]
    pub unseen: bool,
    #[serde(default)]
    pub last_read_post_number: Option<u64>,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub archived: bool,
}

impl TopicListItem {
    /// Number of posts the API user has not read yet.
    ///
    /// A topic the user never opened reports no read position at all, in
    /// which case every post up to the tail counts as pending.
    pub fn pending_posts(&self) -> u64 {
        if self.unseen || self.last_read_post_number.is_none() {
            self.highest_post_number
        } else {
            self.unread_posts + self.new_posts
        }
    }

    /// Whether the topic still accepts replies and votes.
    pub fn is_open(&self) -> bool {
        !self.closed && !self.archived
    }
}

/// Response of `GET /t/{id}.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct TopicView {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub archived: bool,
    /// Set when staff soft-deleted the topic; staff accounts still see it.
    #[serde(default)]
    pub deleted_at: Option<String>,
    pub post_stream: PostStream,
}

impl TopicView {
    /// The opening post, which carries the poll for LFG topics.
    pub fn first_post(&self) -> Option<&Post> {
        self.post_stream.posts.iter().find(|p| p.post_number == 1)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Ids of posts listed in the stream but not loaded in this view,
    /// oldest first.
    pub fn unloaded_post_ids(&self) -> Vec<u64> {
        self.post_stream
            .stream
            .iter()
            .copied()
            .filter(|id| !self.post_stream.posts.iter().any(|p| p.id == *id))
            .collect()
    }
}

/// Loaded posts plus, in topic views, the ids of every post in the topic.
///
/// Discourse loads one chunk of posts (20 by default) with a topic; the
/// rest are fetched by id through `GET /t/{id}/posts.json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostStream {
    #[serde(default)]
    pub posts: Vec<Post>,
    #[serde(default)]
    pub stream: Vec<u64>,
}

/// Response of `GET /t/{id}/posts.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct TopicPostsResponse {
    pub post_stream: PostStream,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Post {
    pub id: u64,
    pub post_number: u64,
    pub username: CompactString,
    /// Only present when the topic is requested with `include_raw=true`.
    #[serde(default)]
    pub raw: Option<String>,
    #[serde(default)]
    pub cooked: String,
    #[serde(default)]
    pub polls: Vec<Poll>,
}

/// A poll attached to a post (discourse-poll plugin).
#[derive(Debug, Clone, Deserialize)]
pub struct Poll {
    pub name: String,
    #[serde(default)]
    pub status: PollStatus,
    #[serde(default)]
    pub voters: u32,
    #[serde(default)]
    pub options: Vec<PollOption>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollStatus {
    #[default]
    Open,
    Closed,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollOption {
    pub id: String,
    #[serde(default)]
    pub html: String,
    #[serde(default)]
    pub votes: u32,
}

/// Response of `GET /polls/voters.json` for a regular poll.
///
/// Voters are grouped by option id.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PollVotersResponse {
    #[serde(default)]
    pub voters: BTreeMap<String, Vec<PollVoter>>,
}

impl PollVotersResponse {
    /// All voter usernames across every option, in option order.
    pub fn usernames(&self) -> impl Iterator<Item = &CompactString> {
        self.voters.values().flatten().map(|v| &v.username)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollVoter {
    pub username: CompactString,
}

/// Request body of `POST /posts.json`.
///
/// The same endpoint replies to a topic, opens a new topic, or starts a
/// private message depending on which fields are present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatePostRequest {
    pub raw: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_recipients: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archetype: Option<&'static str>,
}

impl CreatePostRequest {
    /// Reply to an existing topic or private message.
    pub fn reply(topic_id: u64, raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            title: None,
            topic_id: Some(topic_id),
            category: None,
            tags: Vec::new(),
            target_recipients: None,
            archetype: None,
        }
    }

    /// Open a new public topic in `category`.
    pub fn topic(
        title: impl Into<String>,
        raw: impl Into<String>,
        category: u64,
        tags: Vec<String>,
    ) -> Self {
        Self {
            raw: raw.into(),
            title: Some(title.into()),
            topic_id: None,
            category: Some(category),
            tags,
            target_recipients: None,
            archetype: None,
        }
    }

    /// Start a private message with one or more recipients.
    pub fn private_message<S: AsRef<str>>(
        recipients: &[S],
        title: impl Into<String>,
        raw: impl Into<String>,
    ) -> Self {
        let recipients = recipients
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(",");
        Self {
            raw: raw.into(),
            title: Some(title.into()),
            topic_id: None,
            category: None,
            tags: Vec::new(),
            target_recipients: Some(recipients),
            archetype: Some("private_message"),
        }
    }
}

/// Response of `POST /posts.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePostResponse {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub topic_id: Option<u64>,
}

/// Request body of `POST /topics/timings`, used to mark posts read.
#[derive(Debug, Clone, Serialize)]
pub struct TimingsRequest {
    pub topic_id: u64,
    pub topic_time: u64,
    pub timings: BTreeMap<String, u64>,
}

impl TimingsRequest {
    const READ_TIME_MS: u64 = 1000;

    /// Mark every post from `from` through `to` as read.
    pub fn read_range(topic_id: u64, from: u64, to: u64) -> Self {
        let timings = (from.max(1)..=to)
            .map(|n| (n.to_string(), Self::READ_TIME_MS))
            .collect();
        Self {
            topic_id,
            topic_time: Self::READ_TIME_MS,
            timings,
        }
    }
}
