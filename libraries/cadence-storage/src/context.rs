use crate::{playlists, tracks};
use async_trait::async_trait;
use cadence_core::{
    error::Result,
    storage::{PlaylistStore, TrackStore},
    types::*,
    CadenceError,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tokio::sync::broadcast;

const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// Notification published after a committed write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum StoreChange {
    TrackChanged(TrackId),
    TrackDeleted(TrackId),
    PlaylistChanged(PlaylistId),
    PlaylistDeleted(PlaylistId),
}

/// `SQLite`-backed track and playlist store
#[derive(Clone)]
pub struct LocalStore {
    pool: SqlitePool,
    changes: broadcast::Sender<StoreChange>,
}

impl LocalStore {
    pub fn new(pool: SqlitePool) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { pool, changes }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Receive a `StoreChange` for every committed write from now on
    ///
    /// Slow receivers observe `Lagged` and should re-read what they display.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }

    fn publish(&self, change: StoreChange) {
        // No receivers is not an error
        let _ = self.changes.send(change);
    }
}

#[async_trait]
impl TrackStore for LocalStore {
    async fn get_track(&self, id: TrackId) -> Result<Track> {
        tracks::get_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| CadenceError::not_found("Track", id))
    }

    async fn query(&self, query: &TrackQuery) -> Result<Vec<Track>> {
        tracks::query(&self.pool, query).await
    }

    async fn update_field(&self, id: TrackId, update: TrackUpdate) -> Result<()> {
        tracks::update_field(&self.pool, id, update).await?;
        self.publish(StoreChange::TrackChanged(id));
        Ok(())
    }

    async fn count(&self, filter: &TrackFilter) -> Result<u64> {
        tracks::count(&self.pool, filter).await
    }

    async fn total_duration(&self, filter: &TrackFilter) -> Result<u64> {
        tracks::total_duration(&self.pool, filter).await
    }

    async fn create_track(&self, track: NewTrack) -> Result<Track> {
        let track = tracks::create(&self.pool, track).await?;
        self.publish(StoreChange::TrackChanged(track.id));
        Ok(track)
    }

    async fn delete_track(&self, id: TrackId) -> Result<()> {
        let affected = tracks::delete(&self.pool, id).await?;
        self.publish(StoreChange::TrackDeleted(id));
        for playlist_id in affected {
            self.publish(StoreChange::PlaylistChanged(playlist_id));
        }
        Ok(())
    }

    async fn increment_play_count(&self, id: TrackId) -> Result<()> {
        tracks::increment_play_count(&self.pool, id).await?;
        self.publish(StoreChange::TrackChanged(id));
        Ok(())
    }
}

#[async_trait]
impl PlaylistStore for LocalStore {
    async fn get_playlist(&self, id: PlaylistId) -> Result<Playlist> {
        playlists::get_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| CadenceError::not_found("Playlist", id))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Playlist>> {
        playlists::find_by_name(&self.pool, name).await
    }

    async fn list_playlists(&self, kind: PlaylistKind) -> Result<Vec<Playlist>> {
        playlists::list(&self.pool, kind).await
    }

    async fn create_playlist(&self, playlist: CreatePlaylist) -> Result<Playlist> {
        let playlist = playlists::create(&self.pool, playlist).await?;
        self.publish(StoreChange::PlaylistChanged(playlist.id));
        Ok(playlist)
    }

    async fn delete_playlist(&self, id: PlaylistId) -> Result<()> {
        playlists::delete(&self.pool, id).await?;
        self.publish(StoreChange::PlaylistDeleted(id));
        Ok(())
    }

    async fn duplicate_playlist(&self, id: PlaylistId, new_name: &str) -> Result<Playlist> {
        let playlist = playlists::duplicate(&self.pool, id, new_name).await?;
        self.publish(StoreChange::PlaylistChanged(playlist.id));
        Ok(playlist)
    }

    async fn search_playlists(&self, query: &str) -> Result<Vec<Playlist>> {
        playlists::search(&self.pool, query).await
    }

    async fn playlists_containing(&self, track_id: TrackId) -> Result<Vec<Playlist>> {
        playlists::containing_track(&self.pool, track_id).await
    }

    async fn contains_track(&self, id: PlaylistId, track_id: TrackId) -> Result<bool> {
        playlists::contains_track(&self.pool, id, track_id).await
    }

    async fn get_items(&self, id: PlaylistId) -> Result<Vec<PlaylistItem>> {
        playlists::get_items(&self.pool, id).await
    }

    async fn tracks(&self, id: PlaylistId) -> Result<Vec<Track>> {
        playlists::get_tracks(&self.pool, id).await
    }

    async fn replace_items(&self, id: PlaylistId, track_ids: &[TrackId]) -> Result<PlaylistTotals> {
        let totals = playlists::replace_items(&self.pool, id, track_ids).await?;
        self.publish(StoreChange::PlaylistChanged(id));
        Ok(totals)
    }

    async fn update_stats(&self, id: PlaylistId, track_count: u32, duration_ms: u64) -> Result<()> {
        playlists::update_stats(&self.pool, id, track_count, duration_ms).await?;
        self.publish(StoreChange::PlaylistChanged(id));
        Ok(())
    }

    async fn add_track(&self, id: PlaylistId, track_id: TrackId) -> Result<PlaylistItem> {
        let item = playlists::add_track(&self.pool, id, track_id).await?;
        self.publish(StoreChange::PlaylistChanged(id));
        Ok(item)
    }

    async fn remove_at(&self, id: PlaylistId, position: u32) -> Result<()> {
        playlists::remove_at(&self.pool, id, position).await?;
        self.publish(StoreChange::PlaylistChanged(id));
        Ok(())
    }

    async fn move_item(&self, id: PlaylistId, from: u32, to: u32) -> Result<()> {
        playlists::move_item(&self.pool, id, from, to).await?;
        self.publish(StoreChange::PlaylistChanged(id));
        Ok(())
    }

    async fn stats(&self, id: PlaylistId) -> Result<PlaylistStats> {
        playlists::stats(&self.pool, id).await
    }

    async fn mark_refreshed(&self, id: PlaylistId, at: DateTime<Utc>) -> Result<()> {
        playlists::mark_refreshed(&self.pool, id, at).await
    }

    async fn record_item_played(&self, id: PlaylistId, position: u32) -> Result<()> {
        playlists::record_item_played(&self.pool, id, position).await
    }

    async fn record_item_skipped(&self, id: PlaylistId, position: u32) -> Result<()> {
        playlists::record_item_skipped(&self.pool, id, position).await
    }
}
