/// Playlist domain types
use super::ids::{PlaylistId, TrackId};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Default auto-refresh period for smart playlists
pub const DEFAULT_REFRESH_INTERVAL_HOURS: u32 = 24;

/// Kind of rule a smart playlist is generated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmartType {
    /// Most recently added tracks
    Recent,
    /// Tracks with the highest play count
    MostPlayed,
    /// Tracks marked as favorite
    Favorites,
    /// Tracks chosen by user-defined criteria
    Custom,
}

impl SmartType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Recent => "recent",
            Self::MostPlayed => "most_played",
            Self::Favorites => "favorites",
            Self::Custom => "custom",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "recent" => Some(Self::Recent),
            "most_played" => Some(Self::MostPlayed),
            "favorites" => Some(Self::Favorites),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }
}

impl std::fmt::Display for SmartType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generation rule of a smart playlist
///
/// `criteria` is opaque to the store; only `Custom` rules read it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmartRule {
    pub smart_type: SmartType,
    #[serde(default)]
    pub criteria: String,
}

impl SmartRule {
    pub fn new(smart_type: SmartType) -> Self {
        Self {
            smart_type,
            criteria: String::new(),
        }
    }

    pub fn custom(criteria: impl Into<String>) -> Self {
        Self {
            smart_type: SmartType::Custom,
            criteria: criteria.into(),
        }
    }
}

/// Playlist metadata
///
/// Membership lives in `PlaylistItem` rows; `track_count` and `duration_ms`
/// are the cached aggregates written alongside every membership change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: PlaylistId,

    /// Unique playlist name
    pub name: String,
    pub description: Option<String>,

    /// Present only for smart playlists
    pub rule: Option<SmartRule>,

    pub auto_refresh: bool,
    pub refresh_interval_hours: u32,

    pub track_count: u32,
    pub duration_ms: u64,

    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

impl Playlist {
    pub fn is_smart(&self) -> bool {
        self.rule.is_some()
    }

    pub fn smart_type(&self) -> Option<SmartType> {
        self.rule.as_ref().map(|rule| rule.smart_type)
    }

    /// Whether an auto-refreshing smart playlist is due at `now`
    ///
    /// A playlist that was never refreshed is always due.
    pub fn is_refresh_due(&self, now: DateTime<Utc>) -> bool {
        if !self.is_smart() || !self.auto_refresh {
            return false;
        }
        match self.last_refreshed_at {
            None => true,
            Some(at) => at + Duration::hours(i64::from(self.refresh_interval_hours)) <= now,
        }
    }
}

/// Data for creating a new playlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePlaylist {
    pub name: String,
    pub description: Option<String>,
    pub rule: Option<SmartRule>,
    pub auto_refresh: bool,
    pub refresh_interval_hours: u32,
}

impl CreatePlaylist {
    /// Manually curated playlist
    pub fn manual(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            rule: None,
            auto_refresh: false,
            refresh_interval_hours: DEFAULT_REFRESH_INTERVAL_HOURS,
        }
    }

    /// Smart playlist with auto-refresh enabled
    pub fn smart(name: impl Into<String>, rule: SmartRule) -> Self {
        Self {
            name: name.into(),
            description: None,
            rule: Some(rule),
            auto_refresh: true,
            refresh_interval_hours: DEFAULT_REFRESH_INTERVAL_HOURS,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_auto_refresh(mut self, enabled: bool, interval_hours: u32) -> Self {
        self.auto_refresh = enabled;
        self.refresh_interval_hours = interval_hours;
        self
    }
}

/// Which playlists a listing returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaylistKind {
    #[default]
    All,
    Manual,
    Smart,
}

impl PlaylistKind {
    pub fn matches(self, playlist: &Playlist) -> bool {
        match self {
            Self::All => true,
            Self::Manual => !playlist.is_smart(),
            Self::Smart => playlist.is_smart(),
        }
    }
}

/// One slot of a playlist
///
/// Counters here are per occurrence and independent of the track's own
/// counters; the same track may fill several slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistItem {
    pub id: i64,
    pub playlist_id: PlaylistId,
    pub track_id: TrackId,

    /// Dense 0-based position
    pub position: u32,

    pub added_at: DateTime<Utc>,
    pub play_count: u32,
    pub skip_count: u32,
    pub bookmark_ms: u64,
    pub last_played: Option<DateTime<Utc>>,
}

/// Aggregates written with every membership change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlaylistTotals {
    pub track_count: u32,
    pub duration_ms: u64,
}

/// Computed playlist statistics
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlaylistStats {
    pub track_count: u32,
    pub duration_ms: u64,

    /// Sum of member tracks' play counts
    pub play_count: u64,

    /// Mean of member ratings, ignoring unrated tracks
    pub average_rating: Option<f64>,
}
