/// Track filtering and ordering
use super::track::Track;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Predicate over track fields
///
/// Every set field must match. String comparisons ignore ASCII case; `text`
/// is a substring match over title, artist and album.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackFilter {
    pub favorite: Option<bool>,
    pub min_rating: Option<u8>,
    pub min_play_count: Option<u32>,
    pub genre: Option<String>,
    pub artist: Option<String>,
    pub text: Option<String>,
}

impl TrackFilter {
    pub fn favorites() -> Self {
        Self {
            favorite: Some(true),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Evaluate the filter in memory
    pub fn matches(&self, track: &Track) -> bool {
        if let Some(favorite) = self.favorite {
            if track.favorite != favorite {
                return false;
            }
        }
        if let Some(min) = self.min_rating {
            if track.rating < min {
                return false;
            }
        }
        if let Some(min) = self.min_play_count {
            if track.play_count < min {
                return false;
            }
        }
        if let Some(genre) = &self.genre {
            if !eq_ignore_case(track.genre.as_deref(), genre) {
                return false;
            }
        }
        if let Some(artist) = &self.artist {
            if !eq_ignore_case(track.artist.as_deref(), artist) {
                return false;
            }
        }
        if let Some(text) = &self.text {
            let needle = text.to_ascii_lowercase();
            let hit = [Some(track.title.as_str()), track.artist.as_deref(), track.album.as_deref()]
                .into_iter()
                .flatten()
                .any(|field| field.to_ascii_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        true
    }
}

fn eq_ignore_case(value: Option<&str>, expected: &str) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case(expected))
}

/// Result ordering; every variant is total so scans are deterministic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackSort {
    /// Insertion order
    #[default]
    Id,
    /// Title ascending, then id
    Title,
    /// Newest import first, ties by id descending
    RecentlyAdded,
    /// Highest play count first, ties by id ascending
    MostPlayed,
    /// Highest rating first, ties by id ascending
    Rating,
}

impl TrackSort {
    /// `ORDER BY` clause matching `compare`
    pub fn order_by(self) -> &'static str {
        match self {
            Self::Id => "id ASC",
            Self::Title => "title COLLATE NOCASE ASC, id ASC",
            Self::RecentlyAdded => "added_at DESC, id DESC",
            Self::MostPlayed => "play_count DESC, id ASC",
            Self::Rating => "rating DESC, id ASC",
        }
    }

    /// In-memory ordering matching `order_by`
    pub fn compare(self, a: &Track, b: &Track) -> Ordering {
        match self {
            Self::Id => a.id.cmp(&b.id),
            Self::Title => a
                .title
                .to_ascii_lowercase()
                .cmp(&b.title.to_ascii_lowercase())
                .then(a.id.cmp(&b.id)),
            Self::RecentlyAdded => b.added_at.cmp(&a.added_at).then(b.id.cmp(&a.id)),
            Self::MostPlayed => b.play_count.cmp(&a.play_count).then(a.id.cmp(&b.id)),
            Self::Rating => b.rating.cmp(&a.rating).then(a.id.cmp(&b.id)),
        }
    }
}

/// Filtered, sorted, optionally limited scan
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrackQuery {
    pub filter: TrackFilter,
    pub sort: TrackSort,
    pub limit: Option<u32>,
}

impl TrackQuery {
    pub fn all() -> Self {
        Self::default()
    }

    /// Favorite tracks, title order
    pub fn favorites() -> Self {
        Self {
            filter: TrackFilter::favorites(),
            sort: TrackSort::Title,
            limit: None,
        }
    }

    /// Newest `limit` tracks
    pub fn recent(limit: u32) -> Self {
        Self {
            filter: TrackFilter::default(),
            sort: TrackSort::RecentlyAdded,
            limit: Some(limit),
        }
    }

    /// `limit` most played tracks
    pub fn most_played(limit: u32) -> Self {
        Self {
            filter: TrackFilter::default(),
            sort: TrackSort::MostPlayed,
            limit: Some(limit),
        }
    }

    /// Apply this query to an in-memory track list
    pub fn apply(&self, tracks: impl IntoIterator<Item = Track>) -> Vec<Track> {
        let mut selected: Vec<Track> = tracks
            .into_iter()
            .filter(|track| self.filter.matches(track))
            .collect();
        selected.sort_by(|a, b| self.sort.compare(a, b));
        if let Some(limit) = self.limit {
            selected.truncate(limit as usize);
        }
        selected
    }
}
