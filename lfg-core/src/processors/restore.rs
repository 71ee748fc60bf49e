//! Rebuilds the active-topic table at startup.
//!
//! The forum is asked for every open topic in the configured categories.
//! Each one is matched to a format and a requester, preferably from a saved
//! record, otherwise by parsing the rendered title. Topics recovered from
//! titles get a fresh expiry window and no origin channel.

use crate::config::{EngineConfig, FormatDefinition};
use crate::entities::{RequestTopic, TopicListing};
use crate::messages;
use crate::platform::ForumPlatform;
use crate::processors::topic_manager::TopicBook;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

/// Restore the open LFG topics.
///
/// `saved` are the records of the previous run (possibly empty). When two
/// open topics map to the same format only the lowest id is kept.
pub async fn restore<F: ForumPlatform + ?Sized>(
    forum: &F,
    config: &EngineConfig,
    saved: &[RequestTopic],
    now: OffsetDateTime,
) -> TopicBook {
    let mut book = TopicBook::new();

    for category in config.formats.categories() {
        let mut listings = match forum.list_open_topics(category).await {
            Ok(listings) => listings,
            Err(e) => {
                warn!(
                    category,
                    error = %e,
                    "Failed to list category, its topics will not be restored"
                );
                continue;
            }
        };
        listings.sort_by_key(|listing| listing.id);

        for listing in &listings {
            let Some(topic) = recover_topic(config, category, listing, saved, now) else {
                continue;
            };
            let (id, format_key) = (topic.id, topic.format_key.clone());
            if book.register(topic) {
                info!(topic_id = id, format = %format_key, "Restored LFG topic");
            } else {
                warn!(
                    topic_id = id,
                    format = %format_key,
                    "Format already has an open topic, leaving this one untouched"
                );
            }
        }
    }

    let discarded = saved
        .iter()
        .filter(|record| book.get(record.id).is_none())
        .count();
    if discarded > 0 {
        debug!(discarded, "Dropped saved records of topics that are no longer open");
    }

    info!(topics = book.len(), "Restore finished");
    book
}

fn recover_topic(
    config: &EngineConfig,
    category: u64,
    listing: &TopicListing,
    saved: &[RequestTopic],
    now: OffsetDateTime,
) -> Option<RequestTopic> {
    let record = saved.iter().find(|record| {
        record.id == listing.id
            && config
                .formats
                .get(&record.format_key)
                .is_some_and(|f| f.external_category() == category)
    });
    if let Some(record) = record {
        return Some(record.clone());
    }

    let Some((prefix, requester)) = messages::split_title(&listing.title) else {
        debug!(
            topic_id = listing.id,
            title = %listing.title,
            "Title has no requester, skipping"
        );
        return None;
    };

    let Some(format) = format_for_prefix(config, category, prefix) else {
        debug!(
            topic_id = listing.id,
            title = %listing.title,
            "Title does not match a configured format, skipping"
        );
        return None;
    };

    Some(RequestTopic {
        id: listing.id,
        requester: requester.into(),
        format_key: format.key().into(),
        origin_channel: None,
        created_at: now,
    })
}

/// The format whose title prefix is `prefix`, or the category's only format.
fn format_for_prefix<'a>(
    config: &'a EngineConfig,
    category: u64,
    prefix: &str,
) -> Option<&'a FormatDefinition> {
    let mut candidates = config.formats.in_category(category);
    if let Some(format) = config
        .formats
        .in_category(category)
        .find(|f| messages::title_prefix(f) == prefix)
    {
        return Some(format);
    }
    match (candidates.next(), candidates.next()) {
        (Some(only), None) => Some(only),
        _ => None,
    }
}
