/// Track domain types
use super::ids::TrackId;
use crate::error::{CadenceError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Highest allowed star rating
pub const MAX_RATING: u8 = 5;

/// Where the playback engine finds the media
///
/// A track is either a local file or a remote stream, never both.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaLocator {
    /// File on the device
    LocalPath(PathBuf),
    /// Remote stream URL
    StreamUrl(String),
}

impl MediaLocator {
    /// Local file locator
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self::LocalPath(path.into())
    }

    /// Stream locator
    pub fn stream(url: impl Into<String>) -> Self {
        Self::StreamUrl(url.into())
    }

    /// Rebuild a locator from its two nullable storage columns
    pub fn from_parts(local_path: Option<String>, stream_url: Option<String>) -> Result<Self> {
        match (local_path, stream_url) {
            (Some(path), None) => Ok(Self::LocalPath(PathBuf::from(path))),
            (None, Some(url)) => Ok(Self::StreamUrl(url)),
            (Some(_), Some(_)) => Err(CadenceError::invalid_argument(
                "track has both a local path and a stream url",
            )),
            (None, None) => Err(CadenceError::invalid_argument(
                "track has neither a local path nor a stream url",
            )),
        }
    }

    /// Split into `(local_path, stream_url)` storage columns
    pub fn to_parts(&self) -> (Option<String>, Option<String>) {
        match self {
            Self::LocalPath(path) => (Some(path.to_string_lossy().into_owned()), None),
            Self::StreamUrl(url) => (None, Some(url.clone())),
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::LocalPath(_))
    }
}

impl std::fmt::Display for MediaLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LocalPath(path) => write!(f, "{}", path.display()),
            Self::StreamUrl(url) => write!(f, "{}", url),
        }
    }
}

/// Audio track as stored in the library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub track_number: Option<u32>,
    pub year: Option<u32>,

    /// Duration in milliseconds (0 while unknown)
    pub duration_ms: u64,

    /// Monotonic play counter
    pub play_count: u32,
    pub favorite: bool,

    /// Star rating, 0-5
    pub rating: u8,

    /// Resume position in milliseconds
    pub bookmark_ms: u64,

    pub locator: MediaLocator,
    pub added_at: DateTime<Utc>,
    pub last_played: Option<DateTime<Utc>>,
}

impl Track {
    /// Track duration as a `Duration`
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    /// Bookmark as a `Duration`, if one is set
    pub fn bookmark(&self) -> Option<Duration> {
        (self.bookmark_ms > 0).then(|| Duration::from_millis(self.bookmark_ms))
    }

    /// Display artist, falling back to "Unknown Artist"
    pub fn artist_or_unknown(&self) -> &str {
        self.artist.as_deref().unwrap_or("Unknown Artist")
    }
}

/// Data for creating a new track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTrack {
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub track_number: Option<u32>,
    pub year: Option<u32>,
    pub duration_ms: u64,
    pub favorite: bool,
    pub rating: u8,
    pub locator: MediaLocator,

    /// Import timestamp; the store uses "now" when unset
    pub added_at: Option<DateTime<Utc>>,
}

impl NewTrack {
    /// Create a new track with minimal metadata
    pub fn new(title: impl Into<String>, locator: MediaLocator) -> Self {
        Self {
            title: title.into(),
            artist: None,
            album: None,
            genre: None,
            track_number: None,
            year: None,
            duration_ms: 0,
            favorite: false,
            rating: 0,
            locator,
            added_at: None,
        }
    }

    #[must_use]
    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    #[must_use]
    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    #[must_use]
    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    #[must_use]
    pub fn with_favorite(mut self, favorite: bool) -> Self {
        self.favorite = favorite;
        self
    }

    #[must_use]
    pub fn with_rating(mut self, rating: u8) -> Self {
        self.rating = rating;
        self
    }

    #[must_use]
    pub fn with_added_at(mut self, added_at: DateTime<Utc>) -> Self {
        self.added_at = Some(added_at);
        self
    }

    /// Validate field ranges before insert
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(CadenceError::invalid_argument("track title is empty"));
        }
        validate_rating(self.rating)
    }
}

/// Field-level partial update of a track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "field", content = "value")]
pub enum TrackUpdate {
    Title(String),
    Artist(Option<String>),
    Album(Option<String>),
    Genre(Option<String>),
    DurationMs(u64),
    Favorite(bool),
    Rating(u8),
    BookmarkMs(u64),
    Locator(MediaLocator),
}

impl TrackUpdate {
    /// Check the update against the track's current values
    ///
    /// The bookmark may not pass the end of the track once the duration is
    /// known, and a duration change may not strand an existing bookmark.
    pub fn validate(&self, current: &Track) -> Result<()> {
        match self {
            Self::Title(title) if title.trim().is_empty() => {
                Err(CadenceError::invalid_argument("track title is empty"))
            }
            Self::Rating(rating) => validate_rating(*rating),
            Self::BookmarkMs(bookmark) if current.duration_ms > 0 && *bookmark > current.duration_ms => {
                Err(CadenceError::invalid_argument(format!(
                    "bookmark {}ms exceeds duration {}ms",
                    bookmark, current.duration_ms
                )))
            }
            Self::DurationMs(duration) if *duration > 0 && current.bookmark_ms > *duration => {
                Err(CadenceError::invalid_argument(format!(
                    "duration {}ms is shorter than bookmark {}ms",
                    duration, current.bookmark_ms
                )))
            }
            _ => Ok(()),
        }
    }

    /// Storage column touched by this update
    pub fn column(&self) -> &'static str {
        match self {
            Self::Title(_) => "title",
            Self::Artist(_) => "artist",
            Self::Album(_) => "album",
            Self::Genre(_) => "genre",
            Self::DurationMs(_) => "duration_ms",
            Self::Favorite(_) => "favorite",
            Self::Rating(_) => "rating",
            Self::BookmarkMs(_) => "bookmark_ms",
            Self::Locator(_) => "locator",
        }
    }
}

fn validate_rating(rating: u8) -> Result<()> {
    if rating > MAX_RATING {
        return Err(CadenceError::invalid_argument(format!(
            "rating {} outside 0-{}",
            rating, MAX_RATING
        )));
    }
    Ok(())
}
