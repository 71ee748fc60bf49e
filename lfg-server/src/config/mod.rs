//! Configuration module for lfg-server.
//!
//! Handles loading configuration from TOML files, CLI arguments,
//! and environment variables.

pub mod file;

use crate::config::file::{FileConfig, FormatConfig};
use lfg_core::config::{EngineConfig, FormatDefinition, FormatError, FormatTable};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

/// Environment variable overriding `forum.api_key`.
pub const FORUM_API_KEY_ENV: &str = "LFG_FORUM_API_KEY";
/// Environment variable overriding `game_rooms.api_key`.
pub const GAME_ROOM_API_KEY_ENV: &str = "LFG_GAME_ROOM_API_KEY";

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("invalid format configuration: {0}")]
    FormatError(#[from] FormatError),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("missing secret: set `{field}` in the config file or the {env} environment variable")]
    MissingSecret {
        field: &'static str,
        env: &'static str,
    },
}

/// Status endpoint settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
}

/// How to reach the forum.
#[derive(Debug, Clone)]
pub struct ForumConnection {
    pub base_url: Url,
    pub api_key: String,
}

/// How to reach the game-room platform.
#[derive(Debug, Clone)]
pub struct GameRoomConnection {
    pub api_url: Url,
    pub api_key: String,
}

/// Loaded configuration result containing all parts.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub engine: EngineConfig,
    pub forum: ForumConnection,
    pub game_rooms: GameRoomConnection,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI and environment overrides
    /// 3. Validate the configuration
    /// 4. Build the loaded configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        self.load_str(&config_content, |name| std::env::var(name).ok())
    }

    /// Same as [`load`](Self::load) on already read content, with `env`
    /// standing in for the process environment.
    pub fn load_str(
        &self,
        content: &str,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<LoadedConfig, ConfigError> {
        let mut file_config: FileConfig = toml::from_str(content)?;

        // Apply CLI overrides
        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        self.validate(&file_config)?;

        let forum_key = resolve_secret(
            file_config.forum.api_key.take(),
            env(FORUM_API_KEY_ENV),
            "forum.api_key",
            FORUM_API_KEY_ENV,
        )?;
        let game_room_key = resolve_secret(
            file_config.game_rooms.api_key.take(),
            env(GAME_ROOM_API_KEY_ENV),
            "game_rooms.api_key",
            GAME_ROOM_API_KEY_ENV,
        )?;

        self.build_loaded_config(file_config, forum_key, game_room_key)
    }

    fn validate(&self, config: &FileConfig) -> Result<(), ConfigError> {
        if config.engine.poll_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "engine.poll_interval_secs must be positive".to_string(),
            ));
        }
        if config.engine.expiry_window_secs == 0 {
            return Err(ConfigError::ValidationError(
                "engine.expiry_window_secs must be positive".to_string(),
            ));
        }
        if config.forum.bot_username.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "forum.bot_username must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    fn build_loaded_config(
        &self,
        file_config: FileConfig,
        forum_key: String,
        game_room_key: String,
    ) -> Result<LoadedConfig, ConfigError> {
        let formats = file_config
            .formats
            .into_iter()
            .map(convert_format)
            .collect::<Result<Vec<_>, _>>()?;

        let expiry_secs = i64::try_from(file_config.engine.expiry_window_secs).map_err(|_| {
            ConfigError::ValidationError("engine.expiry_window_secs is too large".to_string())
        })?;

        let mut engine = EngineConfig::new(
            file_config.forum.bot_username.trim(),
            std::time::Duration::from_secs(file_config.engine.poll_interval_secs),
            time::Duration::seconds(expiry_secs),
            FormatTable::new(formats)?,
        );
        engine.topic_tag = file_config.forum.topic_tag;
        engine.state_file = file_config.engine.state_file;

        Ok(LoadedConfig {
            server: ServerConfig {
                listen: file_config.server.listen,
            },
            engine,
            forum: ForumConnection {
                base_url: file_config.forum.base_url,
                api_key: forum_key,
            },
            game_rooms: GameRoomConnection {
                api_url: file_config.game_rooms.api_url,
                api_key: game_room_key,
            },
        })
    }
}

/// The environment wins over the file; blank values count as missing.
fn resolve_secret(
    from_file: Option<String>,
    from_env: Option<String>,
    field: &'static str,
    env: &'static str,
) -> Result<String, ConfigError> {
    from_env
        .into_iter()
        .chain(from_file)
        .find(|value| !value.trim().is_empty())
        .ok_or(ConfigError::MissingSecret { field, env })
}

fn convert_format(f: FormatConfig) -> Result<FormatDefinition, FormatError> {
    FormatDefinition::new(&f.key, f.label, f.category, f.seat_count, f.game_format)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
[engine]
state_file = "./lfg-state.json"

[forum]
base_url = "https://forum.example.com"
bot_username = "Matchmaker"
api_key = "file-forum-key"

[game_rooms]
api_url = "https://api.convoke.games/api/game/create-game"

[[formats]]
key = " 1V1 "
label = "1v1 PDH"
category = 35
seat_count = 2
game_format = "standard"
"#;

    fn loader() -> ConfigLoader {
        ConfigLoader::new("./lfg-config.toml", None)
    }

    fn env_with_room_key(name: &str) -> Option<String> {
        (name == GAME_ROOM_API_KEY_ENV).then(|| "env-room-key".to_string())
    }

    #[test]
    fn test_loads_and_normalizes() {
        let loaded = loader().load_str(CONFIG, env_with_room_key).unwrap();

        assert_eq!(loaded.forum.api_key, "file-forum-key");
        assert_eq!(loaded.game_rooms.api_key, "env-room-key");
        assert_eq!(loaded.engine.bot_username, "Matchmaker");
        assert_eq!(
            loaded.engine.poll_interval,
            std::time::Duration::from_secs(30)
        );
        assert_eq!(loaded.engine.expiry_window, time::Duration::hours(1));
        assert_eq!(loaded.engine.topic_tag, "lfg");
        assert_eq!(
            loaded.engine.state_file,
            Some(PathBuf::from("./lfg-state.json"))
        );

        let format = loaded.engine.formats.get("1v1").unwrap();
        assert_eq!(format.seat_count(), 2);
        assert_eq!(format.poll_threshold(), 1);
    }

    #[test]
    fn test_environment_overrides_file_secret() {
        let loaded = loader()
            .load_str(CONFIG, |name| Some(format!("env:{name}")))
            .unwrap();
        assert_eq!(loaded.forum.api_key, format!("env:{FORUM_API_KEY_ENV}"));
    }

    #[test]
    fn test_missing_secret_is_an_error() {
        let err = loader().load_str(CONFIG, |_| None).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingSecret {
                env: GAME_ROOM_API_KEY_ENV,
                ..
            }
        ));
    }

    #[test]
    fn test_listen_override() {
        let addr: SocketAddr = "0.0.0.0:9000".parse().unwrap();
        let loaded = ConfigLoader::new("./lfg-config.toml", Some(addr))
            .load_str(CONFIG, env_with_room_key)
            .unwrap();
        assert_eq!(loaded.server.listen, addr);
    }

    #[test]
    fn test_duplicate_keys_are_rejected() {
        let content = format!(
            "{CONFIG}\n[[formats]]\nkey = \"1v1\"\nlabel = \"Other\"\ncategory = 36\nseat_count = 2\ngame_format = \"standard\"\n"
        );
        let err = loader().load_str(&content, env_with_room_key).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::FormatError(FormatError::DuplicateKey(ref k)) if k.as_str() == "1v1"
        ));
    }

    #[test]
    fn test_too_few_seats_are_rejected() {
        let content = CONFIG.replace("seat_count = 2", "seat_count = 1");
        let err = loader().load_str(&content, env_with_room_key).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::FormatError(FormatError::TooFewSeats { .. })
        ));
    }

    #[test]
    fn test_no_formats_is_rejected() {
        let content = CONFIG.split("[[formats]]").next().unwrap();
        let err = loader().load_str(content, env_with_room_key).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::FormatError(FormatError::NoFormats)
        ));
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let content = CONFIG.replace("[engine]", "[engine]\npoll_interval_secs = 0");
        let err = loader().load_str(&content, env_with_room_key).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lfg-config.toml");
        let content = CONFIG.replace("[game_rooms]", "[game_rooms]\napi_key = \"k\"");
        std::fs::write(&path, content).unwrap();

        let loaded = ConfigLoader::new(&path, None).load().unwrap();
        assert_eq!(loaded.engine.formats.len(), 1);

        let missing = ConfigLoader::new(dir.path().join("nope.toml"), None).load();
        assert!(matches!(missing, Err(ConfigError::IoError(_))));
    }
}
