//! Per-cycle evaluation of open LFG topics.
//!
//! [`decide`] is pure: given a topic, its freshly fetched poll snapshot and
//! the current time it says whether the topic matched, expired or stays
//! open. [`PollMonitor::evaluate`] wraps it with the snapshot fetch and the
//! terminal side effects (delete the post, notify the participants).

use crate::config::{EngineConfig, FormatDefinition};
use crate::entities::{PollSnapshot, RequestTopic, Username};
use crate::platform::{ForumPlatform, GameRoomPlatform};
use crate::processors::notifier::{Delivery, Notifier, NotifyContext, Outcome};
use itertools::Itertools;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

/// Decision for one open topic in one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollDecision {
    /// Below threshold and still inside the expiry window.
    Pending,
    /// Enough players voted.
    Matched { participants: Vec<Username> },
    /// The window elapsed (or the poll was closed) below threshold.
    Expired {
        participants: Vec<Username>,
        voters_so_far: u32,
    },
}

/// What happened to a topic this cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicFate {
    /// Nothing to do, or the snapshot could not be fetched.
    StillOpen,
    /// The post or its poll disappeared; drop it silently.
    Gone,
    /// Finished with an outcome; drop it.
    Finished {
        outcome: Outcome,
        delivery: Delivery,
    },
}

impl TopicFate {
    /// Whether the topic leaves the active table.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TopicFate::StillOpen)
    }
}

/// The requester first, then every voter, deduplicated case-insensitively.
pub fn participants(requester: &Username, voters: &[Username]) -> Vec<Username> {
    std::iter::once(requester)
        .chain(voters.iter())
        .unique_by(|name| name.to_lowercase())
        .cloned()
        .collect()
}

/// Decide the fate of `topic` from its poll snapshot.
///
/// Only players other than the requester count toward `threshold`; a
/// requester voting on their own poll fills no seat. The match check runs
/// first, so reaching the threshold at the exact expiry instant is a match.
pub fn decide(
    topic: &RequestTopic,
    snapshot: &PollSnapshot,
    threshold: u32,
    now: OffsetDateTime,
    expiry_window: time::Duration,
) -> PollDecision {
    let participants = participants(&topic.requester, &snapshot.voters);
    let joined = u32::try_from(participants.len().saturating_sub(1))
        .unwrap_or(u32::MAX);

    if joined >= threshold {
        return PollDecision::Matched { participants };
    }

    if snapshot.closed || topic.is_expired(now, expiry_window) {
        return PollDecision::Expired {
            participants,
            voters_so_far: joined,
        };
    }

    PollDecision::Pending
}

pub struct PollMonitor<'a, F: ?Sized, G: ?Sized> {
    forum: &'a F,
    rooms: &'a G,
    config: &'a EngineConfig,
}

impl<'a, F, G> PollMonitor<'a, F, G>
where
    F: ForumPlatform + ?Sized,
    G: GameRoomPlatform + ?Sized,
{
    pub fn new(forum: &'a F, rooms: &'a G, config: &'a EngineConfig) -> Self {
        Self {
            forum,
            rooms,
            config,
        }
    }

    /// Evaluate one open topic and carry out a terminal decision.
    ///
    /// The caller removes the topic from its table when the returned fate
    /// is terminal.
    pub async fn evaluate(&self, topic: &RequestTopic, now: OffsetDateTime) -> TopicFate {
        let Some(format) = self.config.formats.get(&topic.format_key) else {
            warn!(
                topic_id = topic.id,
                format = %topic.format_key,
                "Open topic refers to a format that is no longer configured, dropping it"
            );
            return TopicFate::Gone;
        };

        let snapshot = match self.forum.poll_snapshot(topic.id).await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                info!(
                    topic_id = topic.id,
                    format = format.key(),
                    "Topic or poll no longer exists, forgetting it"
                );
                return TopicFate::Gone;
            }
            Err(e) => {
                warn!(
                    topic_id = topic.id,
                    error = %e,
                    "Failed to fetch poll, retrying next cycle"
                );
                return TopicFate::StillOpen;
            }
        };

        let decision = decide(
            topic,
            &snapshot,
            format.poll_threshold(),
            now,
            self.config.expiry_window,
        );

        match decision {
            PollDecision::Pending => {
                debug!(
                    topic_id = topic.id,
                    voters = snapshot.voter_count,
                    threshold = format.poll_threshold(),
                    "Topic still open"
                );
                TopicFate::StillOpen
            }
            PollDecision::Matched { participants } => {
                info!(
                    topic_id = topic.id,
                    format = format.key(),
                    participants = ?participants,
                    "Topic matched"
                );
                self.finish(topic, format, &participants, Outcome::Matched)
                    .await
            }
            PollDecision::Expired {
                participants,
                voters_so_far,
            } => {
                info!(
                    topic_id = topic.id,
                    format = format.key(),
                    voters = voters_so_far,
                    closed = snapshot.closed,
                    "Topic expired"
                );
                let outcome = Outcome::Expired {
                    voters_so_far,
                    threshold: format.poll_threshold(),
                };
                self.finish(topic, format, &participants, outcome).await
            }
        }
    }

    async fn finish(
        &self,
        topic: &RequestTopic,
        format: &FormatDefinition,
        participants: &[Username],
        outcome: Outcome,
    ) -> TopicFate {
        // Delete first so no further votes land on a finished poll.
        if let Err(e) = self.forum.delete_topic(topic.id).await {
            warn!(
                topic_id = topic.id,
                error = %e,
                "Failed to delete finished topic, notifying anyway"
            );
        }

        let delivery = Notifier::new(self.forum, self.rooms)
            .notify(
                participants,
                outcome,
                NotifyContext {
                    format,
                    requester: &topic.requester,
                    origin_channel: topic.origin_channel,
                },
            )
            .await;

        TopicFate::Finished { outcome, delivery }
    }
}
