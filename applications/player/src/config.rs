/// Player configuration
use crate::error::{PlayerError, Result};
use cadence_playback::{PlaybackConfig, RepeatMode};
use cadence_playlists::{MaterializerConfig, DEFAULT_SMART_LIMIT};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File read when no explicit path is given
pub const DEFAULT_CONFIG_FILE: &str = "cadence.toml";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlayerConfig {
    #[serde(default = "default_storage")]
    pub storage: StorageSettings,

    #[serde(default = "default_playback")]
    pub playback: PlaybackSettings,

    #[serde(default = "default_smart_playlists")]
    pub smart_playlists: SmartPlaylistSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default = "default_database_url")]
    pub database_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PlaybackSettings {
    #[serde(default = "default_restart_threshold_ms")]
    pub restart_threshold_ms: u64,

    #[serde(default = "default_position_tick_ms")]
    pub position_tick_ms: u64,

    #[serde(default = "default_resume_from_bookmark")]
    pub resume_from_bookmark: bool,

    #[serde(default)]
    pub shuffle: bool,

    #[serde(default)]
    pub repeat: RepeatMode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shuffle_seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SmartPlaylistSettings {
    #[serde(default = "default_limit")]
    pub limit: u32,

    #[serde(default = "default_refresh_retries")]
    pub refresh_retries: u32,

    #[serde(default = "default_refresh_check_interval_secs")]
    pub refresh_check_interval_secs: u64,

    #[serde(default = "default_create_defaults")]
    pub create_defaults: bool,
}

impl PlayerConfig {
    /// Load configuration from file and environment
    ///
    /// `path` must exist when given; otherwise `cadence.toml` in the working
    /// directory is read if present. `CADENCE_`-prefixed variables override
    /// both, with `__` between section and key
    /// (`CADENCE_PLAYBACK__RESTART_THRESHOLD_MS=5000`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(PlayerError::Config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("CADENCE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings.build()?;
        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.storage.database_url.trim().is_empty() {
            return Err(PlayerError::Config(
                "database URL is required (set CADENCE_STORAGE__DATABASE_URL)".to_string(),
            ));
        }

        if self.playback.position_tick_ms == 0 {
            return Err(PlayerError::Config(
                "playback.position_tick_ms must be greater than zero".to_string(),
            ));
        }

        if self.smart_playlists.limit == 0 {
            return Err(PlayerError::Config(
                "smart_playlists.limit must be greater than zero".to_string(),
            ));
        }

        if self.smart_playlists.refresh_check_interval_secs == 0 {
            return Err(PlayerError::Config(
                "smart_playlists.refresh_check_interval_secs must be greater than zero"
                    .to_string(),
            ));
        }

        Ok(())
    }

    pub fn to_playback_config(&self) -> PlaybackConfig {
        PlaybackConfig {
            restart_threshold_ms: self.playback.restart_threshold_ms,
            resume_from_bookmark: self.playback.resume_from_bookmark,
            shuffle: self.playback.shuffle,
            repeat: self.playback.repeat,
            shuffle_seed: self.playback.shuffle_seed,
        }
    }

    pub fn to_materializer_config(&self) -> MaterializerConfig {
        MaterializerConfig {
            limit: self.smart_playlists.limit,
            refresh_retries: self.smart_playlists.refresh_retries,
            ..Default::default()
        }
    }

    pub fn position_tick(&self) -> Duration {
        Duration::from_millis(self.playback.position_tick_ms)
    }

    pub fn refresh_check_interval(&self) -> Duration {
        Duration::from_secs(self.smart_playlists.refresh_check_interval_secs)
    }

    /// Effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| PlayerError::Config(e.to_string()))
    }
}

// Default values
fn default_storage() -> StorageSettings {
    StorageSettings {
        database_url: default_database_url(),
    }
}

fn default_database_url() -> String {
    "sqlite://./data/cadence.db".to_string()
}

fn default_playback() -> PlaybackSettings {
    PlaybackSettings {
        restart_threshold_ms: default_restart_threshold_ms(),
        position_tick_ms: default_position_tick_ms(),
        resume_from_bookmark: default_resume_from_bookmark(),
        shuffle: false,
        repeat: RepeatMode::Off,
        shuffle_seed: None,
    }
}

fn default_restart_threshold_ms() -> u64 {
    3000
}

fn default_position_tick_ms() -> u64 {
    1000
}

fn default_resume_from_bookmark() -> bool {
    true
}

fn default_smart_playlists() -> SmartPlaylistSettings {
    SmartPlaylistSettings {
        limit: default_limit(),
        refresh_retries: default_refresh_retries(),
        refresh_check_interval_secs: default_refresh_check_interval_secs(),
        create_defaults: default_create_defaults(),
    }
}

fn default_limit() -> u32 {
    DEFAULT_SMART_LIMIT
}

fn default_refresh_retries() -> u32 {
    2
}

fn default_refresh_check_interval_secs() -> u64 {
    300
}

fn default_create_defaults() -> bool {
    true
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            storage: default_storage(),
            playback: default_playback(),
            smart_playlists: default_smart_playlists(),
        }
    }
}
