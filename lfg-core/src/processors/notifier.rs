//! Delivers the single outcome message of a finished LFG topic.
//!
//! Delivery is at-most-once: a failed send is logged and never retried, and
//! the outcome stays final either way.

use crate::config::FormatDefinition;
use crate::entities::{ChannelId, Username};
use crate::messages;
use crate::platform::{ForumPlatform, GameRoomPlatform, PlatformError, RoomRequest};
use tracing::{error, info, warn};

/// Terminal outcome of a request topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Matched,
    Expired { voters_so_far: u32, threshold: u32 },
}

/// Everything the notifier needs to know about the finished topic.
#[derive(Debug, Clone, Copy)]
pub struct NotifyContext<'a> {
    pub format: &'a FormatDefinition,
    pub requester: &'a Username,
    /// The requester's own conversation with the bot, when still known.
    pub origin_channel: Option<ChannelId>,
}

/// Route the outcome message took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// New conversation with every participant.
    Group(ChannelId),
    /// New one-to-one conversation with the requester.
    Direct(ChannelId),
    /// Reply in the requester's existing conversation.
    OriginReply(ChannelId),
    /// The platform refused; nobody was notified.
    Failed,
}

pub struct Notifier<'a, F: ?Sized, G: ?Sized> {
    forum: &'a F,
    rooms: &'a G,
}

impl<'a, F, G> Notifier<'a, F, G>
where
    F: ForumPlatform + ?Sized,
    G: GameRoomPlatform + ?Sized,
{
    pub fn new(forum: &'a F, rooms: &'a G) -> Self {
        Self { forum, rooms }
    }

    /// Send exactly one outcome message to `participants`.
    ///
    /// `participants` must already be deduplicated and include the requester.
    pub async fn notify(
        &self,
        participants: &[Username],
        outcome: Outcome,
        context: NotifyContext<'_>,
    ) -> Delivery {
        match outcome {
            Outcome::Matched => self.notify_matched(participants, context).await,
            Outcome::Expired {
                voters_so_far,
                threshold,
            } => {
                self.notify_expired(participants, voters_so_far, threshold, context)
                    .await
            }
        }
    }

    async fn notify_matched(
        &self,
        participants: &[Username],
        context: NotifyContext<'_>,
    ) -> Delivery {
        let format = context.format;
        let room = RoomRequest {
            name: messages::room_name(format, context.requester),
            seat_limit: format.seat_count(),
            game_format: format.external_game_format().to_string(),
        };

        // The message goes out whether or not the room exists; only its
        // content changes.
        let body = match self.rooms.create_room(&room).await {
            Ok(url) => {
                info!(format = format.key(), room_url = %url, "Game room created");
                messages::match_found(format, &url)
            }
            Err(e) => {
                error!(
                    format = format.key(),
                    requester = %context.requester,
                    error = %e,
                    "Game room creation failed, sending coordination instructions"
                );
                messages::match_without_room(format, participants)
            }
        };

        let subject = messages::match_subject(format);
        self.open_group(participants, &subject, &body).await
    }

    async fn notify_expired(
        &self,
        participants: &[Username],
        voters_so_far: u32,
        threshold: u32,
        context: NotifyContext<'_>,
    ) -> Delivery {
        let format = context.format;
        let subject = messages::expired_subject(format);
        let body = messages::expired(format, voters_so_far, threshold);

        if participants.len() > 1 {
            return self.open_group(participants, &subject, &body).await;
        }

        // A lost origin conversation falls back to a fresh direct channel.
        if let Some(channel) = context.origin_channel {
            match self.forum.reply(channel, &body).await {
                Ok(()) => return Delivery::OriginReply(channel),
                Err(e) => log_failure("origin reply", context.requester, &e),
            }
        }

        match self
            .forum
            .open_direct_channel(context.requester, &subject, &body)
            .await
        {
            Ok(channel) => Delivery::Direct(channel),
            Err(e) => {
                log_failure("direct channel", context.requester, &e);
                Delivery::Failed
            }
        }
    }

    async fn open_group(&self, participants: &[Username], subject: &str, body: &str) -> Delivery {
        match self
            .forum
            .open_group_channel(participants, subject, body)
            .await
        {
            Ok(channel) => Delivery::Group(channel),
            Err(e) => {
                warn!(
                    participants = ?participants,
                    error = %e,
                    "Failed to open group channel, outcome not delivered"
                );
                Delivery::Failed
            }
        }
    }
}

fn log_failure(route: &str, requester: &Username, e: &PlatformError) {
    warn!(
        route,
        requester = %requester,
        error = %e,
        "Failed to deliver outcome, not retrying"
    );
}
