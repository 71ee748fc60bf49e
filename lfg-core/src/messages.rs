//! User-facing text: LFG topic titles and bodies, intake replies and
//! outcome notifications.
//!
//! Topic titles double as the fallback record of who asked for a game, so
//! [`topic_title`] and [`split_title`] must stay in sync.

use crate::config::{FormatDefinition, FormatTable};
use crate::entities::Username;

/// Separates the format part of an LFG title from the requester's name.
pub const TITLE_SEPARATOR: &str = "—";

/// Name of the poll embedded in every LFG post.
pub const POLL_NAME: &str = "poll";

/// `"Looking for a {label} Game"`, the part of the title before the separator.
pub fn title_prefix(format: &FormatDefinition) -> String {
    format!("Looking for a {} Game", format.label())
}

pub fn topic_title(format: &FormatDefinition, requester: &str) -> String {
    format!("{} {TITLE_SEPARATOR} {requester}", title_prefix(format))
}

/// Split a rendered title into its prefix and the requester's name.
///
/// Returns `None` when the separator is missing or nothing follows it.
pub fn split_title(title: &str) -> Option<(&str, &str)> {
    let (prefix, requester) = title.rsplit_once(TITLE_SEPARATOR)?;
    let requester = requester.trim();
    if requester.is_empty() {
        return None;
    }
    Some((prefix.trim(), requester))
}

pub fn topic_body(format: &FormatDefinition, requester: &str, expiry: time::Duration) -> String {
    let seats = format.poll_threshold();
    let (noun, verb) = if seats == 1 {
        ("player", "joins")
    } else {
        ("players", "join")
    };
    format!(
        "Looking for a {label} game! Vote below to join @{requester}.\n\n\
         > ⏱ This post expires in {window}. Once {seats} more {noun} {verb}, a game room \
         will be created automatically and everyone will receive a join link via private \
         message. If not enough players join, this post will be removed automatically.\n\n\
         **Format:** {label}\n\
         **Seats:** {total}\n\n\
         [poll name={POLL_NAME} type=regular results=always public=true]\n\
         * Join me\n\
         [/poll]",
        label = format.label(),
        window = human_duration(expiry),
        total = format.seat_count(),
    )
}

pub fn help_text(formats: &FormatTable) -> String {
    let mut text = String::from(
        "Hi! To find a game, send me a message containing just one of these keywords:\n\n",
    );
    for format in formats.iter() {
        text.push_str(&format!("* **{}** for {}\n", format.key(), format.label()));
    }
    text.push_str("\nI'll create a match post for you automatically.");
    text
}

pub fn post_live(url: &str, expiry: time::Duration) -> String {
    format!(
        "Your LFG post is live! ➡️ {url}\n\n\
         I'll message you as soon as enough players join. \
         If nobody joins within {}, the post will be removed automatically.",
        human_duration(expiry)
    )
}

pub fn redirect_existing(format: &FormatDefinition, url: &str) -> String {
    format!(
        "Someone is already looking for a {} game! Vote in the poll to join them: {url}",
        format.label()
    )
}

pub fn already_open(format: &FormatDefinition, url: &str) -> String {
    format!(
        "You already have an open {} post: {url}\n\nI'll message you when enough players join.",
        format.label()
    )
}

pub fn request_failed() -> &'static str {
    "Sorry, I couldn't create your LFG post right now. Please try again in a moment."
}

pub fn match_subject(format: &FormatDefinition) -> String {
    format!("Your {} game is ready!", format.label())
}

pub fn match_found(format: &FormatDefinition, room_url: &str) -> String {
    format!(
        "✅ **Match found!** Your {} game is ready.\n\n\
         **Join your game here:** {room_url}\n\n\
         Good luck and have fun!",
        format.label()
    )
}

pub fn match_without_room(format: &FormatDefinition, participants: &[Username]) -> String {
    let names = participants
        .iter()
        .map(|p| format!("@{p}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "✅ **Match found** for your {} game, but the game room couldn't be created.\n\n\
         Please coordinate directly in this conversation ({names}) and set up a room yourselves.",
        format.label()
    )
}

pub fn expired_subject(format: &FormatDefinition) -> String {
    format!("Your {} LFG post expired", format.label())
}

pub fn expired(format: &FormatDefinition, voters_so_far: u32, threshold: u32) -> String {
    if voters_so_far == 0 {
        format!(
            "Unfortunately no one joined your {} post before it expired. \
             Feel free to try again anytime!",
            format.label()
        )
    } else {
        format!(
            "The {} post expired with {voters_so_far} of {threshold} needed players. \
             You're all in this conversation now, so feel free to organize a game here \
             or try again anytime!",
            format.label()
        )
    }
}

pub fn room_name(format: &FormatDefinition, requester: &str) -> String {
    format!("{} {TITLE_SEPARATOR} {requester}", format.label())
}

/// Render a window like `1 hour`, `90 minutes` or `45 seconds`.
pub fn human_duration(duration: time::Duration) -> String {
    let (amount, unit) = if duration.whole_seconds() % 3600 == 0 && duration.whole_hours() > 0 {
        (duration.whole_hours(), "hour")
    } else if duration.whole_seconds() % 60 == 0 && duration.whole_minutes() > 0 {
        (duration.whole_minutes(), "minute")
    } else {
        (duration.whole_seconds(), "second")
    };
    if amount == 1 {
        format!("1 {unit}")
    } else {
        format!("{amount} {unit}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_v_one() -> FormatDefinition {
        FormatDefinition::new("1v1", "1v1 PDH", 35, 2, "standard").unwrap()
    }

    #[test]
    fn test_title_and_parse_agree() {
        let title = topic_title(&one_v_one(), "alice");
        assert_eq!(title, "Looking for a 1v1 PDH Game — alice");
        assert_eq!(
            split_title(&title),
            Some(("Looking for a 1v1 PDH Game", "alice"))
        );
    }

    #[test]
    fn test_split_title_edge_cases() {
        assert_eq!(
            split_title("Looking for a game —   bob  "),
            Some(("Looking for a game", "bob"))
        );
        assert_eq!(split_title("About the LFG category"), None);
        assert_eq!(split_title("Dangling — "), None);
        // The trailing segment wins when the label itself contains the separator.
        assert_eq!(
            split_title("A — B Game — carol"),
            Some(("A — B Game", "carol"))
        );
    }

    #[test]
    fn test_body_contains_public_poll() {
        let body = topic_body(&one_v_one(), "alice", time::Duration::hours(1));
        let poll = "[poll name=poll type=regular results=always public=true]";
        assert!(body.contains(poll));
        assert!(body.contains("1 more player joins"));
        assert!(body.contains("expires in 1 hour"));
    }

    #[test]
    fn test_help_lists_every_key() {
        let table = FormatTable::new(vec![
            one_v_one(),
            FormatDefinition::new("4p", "4-player PDH", 35, 4, "standard").unwrap(),
        ])
        .unwrap();
        let help = help_text(&table);
        assert!(help.contains("**1v1** for 1v1 PDH"));
        assert!(help.contains("**4p** for 4-player PDH"));
    }

    #[test]
    fn test_human_duration() {
        assert_eq!(human_duration(time::Duration::hours(1)), "1 hour");
        assert_eq!(human_duration(time::Duration::hours(2)), "2 hours");
        assert_eq!(human_duration(time::Duration::minutes(90)), "90 minutes");
        assert_eq!(human_duration(time::Duration::seconds(45)), "45 seconds");
    }

    #[test]
    fn test_expired_wording_depends_on_voters() {
        let format = one_v_one();
        assert!(expired(&format, 0, 1).contains("no one joined"));
        let four = FormatDefinition::new("4p", "4-player PDH", 35, 4, "standard").unwrap();
        assert!(expired(&four, 2, 3).contains("2 of 3"));
    }
}
