//! Adapters from the SDK clients to the engine's platform traits.

use async_trait::async_trait;
use lfg_core::entities::{
    ChannelId, ChannelMessage, ChannelSummary, MessageId, PollSnapshot, TopicId, TopicListing,
    Username,
};
use lfg_core::messages::POLL_NAME;
use lfg_core::platform::{ForumPlatform, GameRoomPlatform, NewTopic, PlatformError, RoomRequest};
use lfg_sdk::client::{ClientError, ConvokeClient, DiscourseClient};
use lfg_sdk::objects::discourse::{
    CreatePostRequest, Poll, PollStatus, Post, TimingsRequest, TopicListItem, TopicView,
};

/// Posts marked read per call, matching the size of one fetched window.
const MARK_READ_WINDOW: u64 = 20;
/// Post ids requested per `posts.json` call, the size of a Discourse chunk.
const POSTS_PER_REQUEST: usize = 20;

fn platform_error(e: ClientError) -> PlatformError {
    match e {
        ClientError::Api { status, body } => PlatformError::Rejected {
            status: status.as_u16(),
            message: body,
        },
        other => PlatformError::Transport(other.to_string()),
    }
}

/// The bot's Discourse account.
pub struct DiscourseForum {
    client: DiscourseClient,
}

impl DiscourseForum {
    pub fn new(client: DiscourseClient) -> Self {
        Self { client }
    }

    async fn open_private_message(
        &self,
        recipients: &[Username],
        subject: &str,
        body: &str,
    ) -> Result<ChannelId, PlatformError> {
        let request = CreatePostRequest::private_message(recipients, subject, body);
        let response = self
            .client
            .create_post(&request)
            .await
            .map_err(platform_error)?;
        response
            .topic_id
            .ok_or(PlatformError::MissingData("topic_id"))
    }
}

fn channel_summary(item: &TopicListItem) -> ChannelSummary {
    ChannelSummary {
        channel_id: item.id,
        tail_message_id: item.highest_post_number,
        unread_count: item.pending_posts(),
    }
}

fn channel_messages(posts: Vec<Post>) -> Vec<ChannelMessage> {
    let mut messages: Vec<ChannelMessage> = posts
        .into_iter()
        .map(|post| ChannelMessage {
            id: post.post_number,
            author: post.username,
            text: post.raw.unwrap_or(post.cooked),
        })
        .collect();
    messages.sort_by_key(|m| m.id);
    messages
}

/// Complete a topic view with the posts it did not load.
///
/// Unloaded posts are requested newest chunk first; loading stops once a
/// chunk reaches back to `after`, since everything older is already handled.
async fn load_window<L, Fut>(
    view: TopicView,
    after: MessageId,
    mut load: L,
) -> Result<Vec<ChannelMessage>, PlatformError>
where
    L: FnMut(Vec<u64>) -> Fut,
    Fut: Future<Output = Result<Vec<Post>, PlatformError>>,
{
    let unloaded = view.unloaded_post_ids();
    let mut posts = view.post_stream.posts;
    for chunk in unloaded.rchunks(POSTS_PER_REQUEST) {
        let batch = load(chunk.to_vec()).await?;
        let reached = batch.iter().any(|post| post.post_number <= after);
        posts.extend(batch);
        if reached {
            break;
        }
    }
    Ok(channel_messages(posts))
}

/// The LFG poll of a topic's first post, if it still has one.
///
/// A soft-deleted topic has none: staff accounts can still read it, but it
/// was taken down by a moderator.
fn lfg_poll(view: &TopicView) -> Option<(u64, &Poll)> {
    if view.is_deleted() {
        return None;
    }
    let post = view.first_post()?;
    let poll = post
        .polls
        .iter()
        .find(|p| p.name == POLL_NAME)
        .or_else(|| post.polls.first())?;
    Some((post.id, poll))
}

fn poll_snapshot(view: &TopicView, poll: &Poll, voters: Vec<Username>) -> PollSnapshot {
    PollSnapshot {
        topic_id: view.id,
        voter_count: poll.voters,
        closed: poll.status == PollStatus::Closed || view.closed || view.archived,
        voters,
    }
}

#[async_trait]
impl ForumPlatform for DiscourseForum {
    async fn list_channels(&self) -> Result<Vec<ChannelSummary>, PlatformError> {
        let items = self
            .client
            .private_messages()
            .await
            .map_err(platform_error)?;
        Ok(items.iter().map(channel_summary).collect())
    }

    async fn fetch_messages(
        &self,
        channel: ChannelId,
        after: MessageId,
    ) -> Result<Vec<ChannelMessage>, PlatformError> {
        let view = self.client.topic(channel).await.map_err(platform_error)?;
        let client = &self.client;
        load_window(view, after, move |ids| async move {
            client
                .topic_posts(channel, &ids)
                .await
                .map_err(platform_error)
        })
        .await
    }

    async fn mark_read(&self, channel: ChannelId, up_to: MessageId) -> Result<(), PlatformError> {
        let from = up_to.saturating_sub(MARK_READ_WINDOW - 1);
        self.client
            .mark_read(&TimingsRequest::read_range(channel, from, up_to))
            .await
            .map_err(platform_error)
    }

    async fn reply(&self, channel: ChannelId, body: &str) -> Result<(), PlatformError> {
        self.client
            .create_post(&CreatePostRequest::reply(channel, body))
            .await
            .map(|_| ())
            .map_err(platform_error)
    }

    async fn open_group_channel(
        &self,
        recipients: &[Username],
        subject: &str,
        body: &str,
    ) -> Result<ChannelId, PlatformError> {
        self.open_private_message(recipients, subject, body).await
    }

    async fn open_direct_channel(
        &self,
        recipient: &Username,
        subject: &str,
        body: &str,
    ) -> Result<ChannelId, PlatformError> {
        self.open_private_message(std::slice::from_ref(recipient), subject, body)
            .await
    }

    async fn create_topic(&self, topic: &NewTopic) -> Result<Option<TopicId>, PlatformError> {
        let request = CreatePostRequest::topic(
            topic.title.as_str(),
            topic.body.as_str(),
            topic.category,
            topic.tags.clone(),
        );
        let response = self
            .client
            .create_post(&request)
            .await
            .map_err(platform_error)?;
        Ok(response.topic_id)
    }

    async fn delete_topic(&self, topic: TopicId) -> Result<(), PlatformError> {
        self.client
            .delete_topic(topic)
            .await
            .map_err(platform_error)
    }

    async fn poll_snapshot(&self, topic: TopicId) -> Result<Option<PollSnapshot>, PlatformError> {
        let view = match self.client.topic(topic).await {
            Ok(view) => view,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(platform_error(e)),
        };
        let Some((post_id, poll)) = lfg_poll(&view) else {
            return Ok(None);
        };

        // Voter names are only needed once somebody voted.
        let voters = if poll.voters > 0 {
            self.client
                .poll_voters(post_id, &poll.name)
                .await
                .map_err(platform_error)?
                .usernames()
                .cloned()
                .collect()
        } else {
            Vec::new()
        };

        Ok(Some(poll_snapshot(&view, poll, voters)))
    }

    async fn list_open_topics(&self, category: u64) -> Result<Vec<TopicListing>, PlatformError> {
        let items = self
            .client
            .category_topics(category)
            .await
            .map_err(platform_error)?;
        Ok(items
            .into_iter()
            .filter(TopicListItem::is_open)
            .map(|item| TopicListing {
                id: item.id,
                title: item.title,
            })
            .collect())
    }

    fn topic_url(&self, topic: TopicId) -> String {
        self.client.topic_url(topic)
    }
}

/// The Convoke game-room API.
pub struct ConvokeRooms {
    client: ConvokeClient,
}

impl ConvokeRooms {
    pub fn new(client: ConvokeClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl GameRoomPlatform for ConvokeRooms {
    async fn create_room(&self, request: &RoomRequest) -> Result<String, PlatformError> {
        let response = self
            .client
            .create_game(
                request.name.as_str(),
                request.seat_limit,
                request.game_format.as_str(),
            )
            .await
            .map_err(platform_error)?;
        response
            .join_url()
            .map(str::to_string)
            .ok_or(PlatformError::MissingData("data.url"))
    }
}
