//! TOML file configuration structures.
//!
//! These structs directly map to the `lfg-config.toml` file format.

use serde::Deserialize;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use url::Url;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    pub forum: ForumConfig,
    pub game_rooms: GameRoomsConfig,
    #[serde(default)]
    pub formats: Vec<FormatConfig>,
}

/// Server configuration section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// The address and port the status endpoint listens on.
    #[serde(default = "default_listen_addr")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, 8088))
}

/// Scheduling and persistence of the matchmaking engine.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_expiry_window_secs")]
    pub expiry_window_secs: u64,
    /// Where the active-topic table is kept between restarts.
    #[serde(default)]
    pub state_file: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            expiry_window_secs: default_expiry_window_secs(),
            state_file: None,
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_expiry_window_secs() -> u64 {
    3600
}

/// Discourse forum connection.
#[derive(Debug, Clone, Deserialize)]
pub struct ForumConfig {
    pub base_url: Url,
    /// The account the bot posts as.
    pub bot_username: String,
    /// Can be left out and provided through the environment instead.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_topic_tag")]
    pub topic_tag: String,
}

fn default_topic_tag() -> String {
    lfg_core::config::DEFAULT_TOPIC_TAG.to_string()
}

/// Convoke game-room API connection.
#[derive(Debug, Clone, Deserialize)]
pub struct GameRoomsConfig {
    /// Full URL of the create-game endpoint.
    pub api_url: Url,
    #[serde(default)]
    pub api_key: Option<String>,
}

/// One game format players can ask for.
#[derive(Debug, Clone, Deserialize)]
pub struct FormatConfig {
    /// The trigger keyword.
    pub key: String,
    pub label: String,
    /// Forum category LFG topics of this format are posted in.
    pub category: u64,
    /// Players in a full game, requester included.
    pub seat_count: u32,
    /// Format name passed to the game-room platform.
    pub game_format: String,
}
