//! Per-channel watermarks over the bot's inbox.
//!
//! The forum numbers messages sequentially inside every conversation. The
//! tracker remembers, per conversation, the highest number already handled
//! and decides each cycle whether a conversation needs fetching at all:
//!
//! | sight       | pending | action                                           |
//! |-------------|---------|--------------------------------------------------|
//! | first       | no      | watermark = tail, no fetch                       |
//! | first       | `U`     | watermark = tail − `U`, fetch                    |
//! | subsequent  | no      | skip                                             |
//! | subsequent  | yes     | fetch, keep `id > watermark`, advance to max id  |
//!
//! Watermarks live in memory only. After a restart every conversation gets a
//! fresh baseline, so messages that arrived while the process was down are
//! dropped unless they are still counted as unread.

use crate::entities::{ChannelId, ChannelMessage, ChannelSummary, MessageId};
use std::collections::HashMap;
use tracing::debug;

/// What the intake pass should do with one inbox row this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelPlan {
    /// First sight without unread messages; the tail became the baseline.
    Baseline,
    /// Nothing new since the last cycle.
    Skip,
    /// Fetch the window; messages above `after` are new.
    Fetch { after: MessageId },
}

#[derive(Debug, Default)]
pub struct WatermarkTracker {
    marks: HashMap<ChannelId, MessageId>,
}

impl WatermarkTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide what to do with `summary`, recording a baseline on first sight.
    ///
    /// The `tail − unread` baseline is a best-effort guess: a message deleted
    /// or edited between the listing and the fetch shifts the window by one.
    pub fn observe(&mut self, summary: &ChannelSummary) -> ChannelPlan {
        let current = self.marks.get(&summary.channel_id).copied();
        match current {
            None if !summary.has_pending() => {
                self.marks.insert(summary.channel_id, summary.tail_message_id);
                debug!(
                    channel_id = summary.channel_id,
                    watermark = summary.tail_message_id,
                    "New idle channel, recorded baseline"
                );
                ChannelPlan::Baseline
            }
            None => {
                let after = summary
                    .tail_message_id
                    .saturating_sub(summary.unread_count);
                self.marks.insert(summary.channel_id, after);
                debug!(
                    channel_id = summary.channel_id,
                    watermark = after,
                    unread = summary.unread_count,
                    "New channel with unread messages"
                );
                ChannelPlan::Fetch { after }
            }
            Some(_) if !summary.has_pending() => ChannelPlan::Skip,
            Some(after) => ChannelPlan::Fetch { after },
        }
    }

    /// Keep the messages above the watermark and advance it to the highest
    /// id in `messages`, whoever authored them.
    ///
    /// The watermark never moves backwards, so a message is handed out at
    /// most once.
    pub fn accept(
        &mut self,
        channel: ChannelId,
        messages: Vec<ChannelMessage>,
    ) -> Vec<ChannelMessage> {
        let mark = self.marks.entry(channel).or_insert(0);
        let after = *mark;
        if let Some(max_id) = messages.iter().map(|m| m.id).max() {
            *mark = (*mark).max(max_id);
        }
        messages.into_iter().filter(|m| m.id > after).collect()
    }

    pub fn watermark(&self, channel: ChannelId) -> Option<MessageId> {
        self.marks.get(&channel).copied()
    }

    /// Number of channels seen so far.
    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(channel_id: ChannelId, tail: MessageId, unread: u64) -> ChannelSummary {
        ChannelSummary {
            channel_id,
            tail_message_id: tail,
            unread_count: unread,
        }
    }

    fn msg(id: MessageId, author: &str) -> ChannelMessage {
        ChannelMessage {
            id,
            author: author.into(),
            text: format!("message {id}"),
        }
    }

    #[test]
    fn test_first_sight_idle_records_tail() {
        let mut tracker = WatermarkTracker::new();
        assert_eq!(tracker.observe(&summary(1, 7, 0)), ChannelPlan::Baseline);
        assert_eq!(tracker.watermark(1), Some(7));
        assert_eq!(tracker.observe(&summary(1, 7, 0)), ChannelPlan::Skip);
    }

    #[test]
    fn test_first_sight_pending_backs_off_unread() {
        let mut tracker = WatermarkTracker::new();
        assert_eq!(
            tracker.observe(&summary(1, 5, 2)),
            ChannelPlan::Fetch { after: 3 }
        );
        let fresh = tracker.accept(1, (1..=5).map(|id| msg(id, "alice")).collect());
        assert_eq!(fresh.iter().map(|m| m.id).collect::<Vec<_>>(), vec![4, 5]);
        assert_eq!(tracker.watermark(1), Some(5));
    }

    #[test]
    fn test_unread_larger_than_tail_saturates() {
        let mut tracker = WatermarkTracker::new();
        assert_eq!(
            tracker.observe(&summary(9, 1, 4)),
            ChannelPlan::Fetch { after: 0 }
        );
    }

    #[test]
    fn test_messages_at_or_below_watermark_are_dropped() {
        let mut tracker = WatermarkTracker::new();
        tracker.observe(&summary(1, 3, 0));
        assert_eq!(
            tracker.observe(&summary(1, 4, 1)),
            ChannelPlan::Fetch { after: 3 }
        );
        let fresh = tracker.accept(1, vec![msg(2, "alice"), msg(3, "bot"), msg(4, "alice")]);
        assert_eq!(fresh, vec![msg(4, "alice")]);

        // The same window fetched again yields nothing.
        let again = tracker.accept(1, vec![msg(3, "bot"), msg(4, "alice")]);
        assert!(again.is_empty());
    }

    #[test]
    fn test_watermark_never_decreases() {
        let mut tracker = WatermarkTracker::new();
        tracker.observe(&summary(1, 10, 0));
        // A shorter window (e.g. after deletions) must not move it back.
        tracker.accept(1, vec![msg(4, "alice")]);
        assert_eq!(tracker.watermark(1), Some(10));
        tracker.accept(1, vec![]);
        assert_eq!(tracker.watermark(1), Some(10));
        tracker.accept(1, vec![msg(12, "bot")]);
        assert_eq!(tracker.watermark(1), Some(12));
    }

    #[test]
    fn test_channels_are_independent() {
        let mut tracker = WatermarkTracker::new();
        tracker.observe(&summary(1, 3, 0));
        tracker.observe(&summary(2, 8, 0));
        tracker.accept(2, vec![msg(9, "bob")]);
        assert_eq!(tracker.watermark(1), Some(3));
        assert_eq!(tracker.watermark(2), Some(9));
        assert_eq!(tracker.len(), 2);
    }
}
