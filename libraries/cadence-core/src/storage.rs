//! Store contracts
//!
//! Both traits are object safe so the composition root can hand out
//! `Arc<dyn TrackStore>` / `Arc<dyn PlaylistStore>`.

use crate::error::Result;
use crate::types::{
    CreatePlaylist, NewTrack, Playlist, PlaylistId, PlaylistItem, PlaylistKind, PlaylistStats,
    PlaylistTotals, Track, TrackFilter, TrackId, TrackQuery, TrackUpdate,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Access to the track library
#[async_trait]
pub trait TrackStore: Send + Sync {
    /// Point lookup; `NotFound` when the id is unknown
    async fn get_track(&self, id: TrackId) -> Result<Track>;

    /// Filtered, sorted scan
    async fn query(&self, query: &TrackQuery) -> Result<Vec<Track>>;

    /// Every track in id order
    async fn all_tracks(&self) -> Result<Vec<Track>> {
        self.query(&TrackQuery::all()).await
    }

    /// Apply a single-field update; `NotFound` when the id is unknown
    async fn update_field(&self, id: TrackId, update: TrackUpdate) -> Result<()>;

    /// Number of tracks matching `filter`
    async fn count(&self, filter: &TrackFilter) -> Result<u64>;

    /// Summed duration of tracks matching `filter`
    async fn total_duration(&self, filter: &TrackFilter) -> Result<u64>;

    async fn create_track(&self, track: NewTrack) -> Result<Track>;

    /// Delete a track and every playlist slot that referenced it
    async fn delete_track(&self, id: TrackId) -> Result<()>;

    /// Bump the play counter and stamp `last_played`
    async fn increment_play_count(&self, id: TrackId) -> Result<()>;
}

/// Access to playlists and their ordered membership
///
/// Positions are dense: after every call a playlist's items occupy exactly
/// `0..track_count`.
#[async_trait]
pub trait PlaylistStore: Send + Sync {
    async fn get_playlist(&self, id: PlaylistId) -> Result<Playlist>;

    async fn find_by_name(&self, name: &str) -> Result<Option<Playlist>>;

    async fn list_playlists(&self, kind: PlaylistKind) -> Result<Vec<Playlist>>;

    /// Create a playlist; names are unique
    async fn create_playlist(&self, playlist: CreatePlaylist) -> Result<Playlist>;

    async fn delete_playlist(&self, id: PlaylistId) -> Result<()>;

    /// Copy a playlist, rule and membership included, under `new_name`
    async fn duplicate_playlist(&self, id: PlaylistId, new_name: &str) -> Result<Playlist>;

    /// Playlists whose name contains `query` (case-insensitive)
    async fn search_playlists(&self, query: &str) -> Result<Vec<Playlist>>;

    /// Playlists that hold `track_id` in at least one slot
    async fn playlists_containing(&self, track_id: TrackId) -> Result<Vec<Playlist>>;

    async fn contains_track(&self, id: PlaylistId, track_id: TrackId) -> Result<bool>;

    /// Items in position order
    async fn get_items(&self, id: PlaylistId) -> Result<Vec<PlaylistItem>>;

    /// Member tracks in position order (duplicates preserved)
    async fn tracks(&self, id: PlaylistId) -> Result<Vec<Track>>;

    /// Atomically replace all items with `track_ids` at positions `0..n`
    /// and rewrite the aggregates. On failure nothing changes.
    async fn replace_items(&self, id: PlaylistId, track_ids: &[TrackId]) -> Result<PlaylistTotals>;

    /// Overwrite the cached aggregates
    async fn update_stats(&self, id: PlaylistId, track_count: u32, duration_ms: u64) -> Result<()>;

    /// Append a track at the end
    async fn add_track(&self, id: PlaylistId, track_id: TrackId) -> Result<PlaylistItem>;

    /// Remove the slot at `position`, closing the gap
    async fn remove_at(&self, id: PlaylistId, position: u32) -> Result<()>;

    /// Move the slot at `from` to `to`, shifting the slots between
    async fn move_item(&self, id: PlaylistId, from: u32, to: u32) -> Result<()>;

    async fn stats(&self, id: PlaylistId) -> Result<PlaylistStats>;

    /// Record a completed smart refresh
    async fn mark_refreshed(&self, id: PlaylistId, at: DateTime<Utc>) -> Result<()>;

    /// Per-slot play counter
    async fn record_item_played(&self, id: PlaylistId, position: u32) -> Result<()>;

    /// Per-slot skip counter
    async fn record_item_skipped(&self, id: PlaylistId, position: u32) -> Result<()>;
}
