//! Custom smart playlist rules
//!
//! A custom rule maps `(criteria, all_tracks)` to an ordered track list. The
//! materializer persists whatever the rule returns, in that order.

use cadence_core::{CadenceError, Result, Track, TrackFilter, TrackQuery, TrackSort};
use serde::{Deserialize, Serialize};

/// Evaluator for `SmartType::Custom` playlists
pub trait CustomRule: Send + Sync {
    fn evaluate(&self, criteria: &str, tracks: Vec<Track>) -> Result<Vec<Track>>;
}

/// Parsed form of a custom criteria string
///
/// ```json
/// {"favorite": true, "genre": "jazz", "sort": "most_played", "limit": 25}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Criteria {
    pub favorite: Option<bool>,
    pub min_rating: Option<u8>,
    pub min_play_count: Option<u32>,
    pub genre: Option<String>,
    pub artist: Option<String>,
    pub text: Option<String>,
    pub sort: TrackSort,
    pub limit: Option<u32>,
}

impl Criteria {
    /// Parse a criteria string; blank means "no criteria"
    pub fn parse(criteria: &str) -> Result<Option<Self>> {
        if criteria.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(criteria)
            .map(Some)
            .map_err(|e| CadenceError::invalid_argument(format!("malformed criteria: {}", e)))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_query(&self) -> TrackQuery {
        TrackQuery {
            filter: TrackFilter {
                favorite: self.favorite,
                min_rating: self.min_rating,
                min_play_count: self.min_play_count,
                genre: self.genre.clone(),
                artist: self.artist.clone(),
                text: self.text.clone(),
            },
            sort: self.sort,
            limit: self.limit,
        }
    }
}

/// Default custom rule: JSON criteria evaluated in memory
///
/// Blank criteria select every track in the order given.
#[derive(Debug, Clone, Copy, Default)]
pub struct CriteriaRule;

impl CustomRule for CriteriaRule {
    fn evaluate(&self, criteria: &str, tracks: Vec<Track>) -> Result<Vec<Track>> {
        match Criteria::parse(criteria)? {
            Some(criteria) => Ok(criteria.to_query().apply(tracks)),
            None => Ok(tracks),
        }
    }
}
