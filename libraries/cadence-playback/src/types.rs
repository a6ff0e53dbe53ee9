//! Core types for playback management

use cadence_core::{Track, TrackId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lowest accepted playback speed
pub const MIN_SPEED: f32 = 0.25;

/// Highest accepted playback speed
pub const MAX_SPEED: f32 = 4.0;

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// Nothing has been played yet, or the engine went idle after a stop
    #[default]
    Idle,

    /// Currently playing
    Playing,

    /// Paused mid-track
    Paused,

    /// Stopped; the queue is kept but nothing is "now playing"
    Stopped,
}

impl PlaybackState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
        }
    }
}

/// Repeat mode
///
/// Only consulted when a track finishes on its own; explicit next/previous
/// always wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatMode {
    /// Stop after the last track
    #[default]
    Off,

    /// Loop current track only
    One,

    /// Loop entire queue
    All,
}

impl RepeatMode {
    /// Off -> One -> All -> Off
    #[must_use]
    pub fn cycle(self) -> Self {
        match self {
            Self::Off => Self::One,
            Self::One => Self::All,
            Self::All => Self::Off,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::One => "one",
            Self::All => "all",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "off" => Some(Self::Off),
            "one" => Some(Self::One),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

/// Queue mutation record, drained by the owner of the queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueueChange {
    /// Cursor now points at a different slot
    TrackChanged { index: usize, track_id: TrackId },
    /// A slot moved
    Reordered { from: usize, to: usize },
    /// A track was inserted at `index`
    Inserted { index: usize },
    /// The slot at `index` was removed
    Removed { index: usize },
    /// Queue was emptied
    Cleared,
}

/// Configuration for playback manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// `previous()` restarts the track past this position (default: 3000ms)
    pub restart_threshold_ms: u64,

    /// Seek to a track's bookmark when it is prepared (default: true)
    pub resume_from_bookmark: bool,

    /// Initial shuffle flag (default: false)
    pub shuffle: bool,

    /// Initial repeat mode (default: Off)
    pub repeat: RepeatMode,

    /// Fixed shuffle seed, for reproducible runs
    pub shuffle_seed: Option<u64>,
}

impl PlaybackConfig {
    pub fn restart_threshold(&self) -> Duration {
        Duration::from_millis(self.restart_threshold_ms)
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            restart_threshold_ms: 3000,
            resume_from_bookmark: true,
            shuffle: false,
            repeat: RepeatMode::Off,
            shuffle_seed: None,
        }
    }
}

/// Everything an observer needs to render the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    pub state: PlaybackState,

    /// Now playing; `None` after a stop
    pub track: Option<Track>,

    /// Queue cursor, -1 when nothing is selected
    pub cursor: i64,

    pub queue_length: usize,
    pub shuffle: bool,
    pub repeat: RepeatMode,
    pub position_ms: u64,
    pub speed: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = PlaybackConfig::default();
        assert_eq!(config.restart_threshold(), Duration::from_secs(3));
        assert!(config.resume_from_bookmark);
        assert!(!config.shuffle);
        assert_eq!(config.repeat, RepeatMode::Off);
    }

    #[test]
    fn repeat_cycles_off_one_all() {
        assert_eq!(RepeatMode::Off.cycle(), RepeatMode::One);
        assert_eq!(RepeatMode::One.cycle(), RepeatMode::All);
        assert_eq!(RepeatMode::All.cycle(), RepeatMode::Off);
    }

    #[test]
    fn repeat_parses_config_strings() {
        assert_eq!(RepeatMode::from_str("all"), Some(RepeatMode::All));
        assert_eq!(RepeatMode::from_str("ALL"), None);
    }
}
