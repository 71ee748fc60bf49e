//! Configuration types for the matchmaking engine.
//!
//! These types represent the validated runtime configuration. The actual
//! config loading/parsing is handled by the server crate.

mod format;

pub use format::{FormatDefinition, FormatError, FormatTable};

use crate::entities::Username;
use std::path::PathBuf;

/// Default forum tag attached to every LFG topic.
pub const DEFAULT_TOPIC_TAG: &str = "lfg";

/// Runtime configuration of a [`MatchmakingEngine`](crate::processors::MatchmakingEngine).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// The forum account the engine acts as. Messages it authored are
    /// never acted upon.
    pub bot_username: Username,
    /// Sleep between two cycles.
    pub poll_interval: std::time::Duration,
    /// How long a request topic may stay open without reaching its
    /// threshold.
    pub expiry_window: time::Duration,
    /// Tag attached to every LFG topic.
    pub topic_tag: String,
    /// Optional location of the active-topic state file.
    pub state_file: Option<PathBuf>,
    /// Configured game formats.
    pub formats: FormatTable,
}

impl EngineConfig {
    /// Create a config with the default tag and no state file.
    pub fn new(
        bot_username: impl Into<Username>,
        poll_interval: std::time::Duration,
        expiry_window: time::Duration,
        formats: FormatTable,
    ) -> Self {
        Self {
            bot_username: bot_username.into(),
            poll_interval,
            expiry_window,
            topic_tag: DEFAULT_TOPIC_TAG.to_string(),
            state_file: None,
            formats,
        }
    }

    /// Whether `username` is the bot itself (usernames are case-insensitive).
    pub fn is_bot(&self, username: &str) -> bool {
        self.bot_username.eq_ignore_ascii_case(username)
    }
}
