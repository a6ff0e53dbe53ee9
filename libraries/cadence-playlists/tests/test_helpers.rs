//! Test helpers for smart playlist integration tests
//!
//! Every test runs against a real SQLite file so transactions and foreign
//! keys behave as in production.

#![allow(dead_code)]

use async_trait::async_trait;
use cadence_core::types::*;
use cadence_core::{CadenceError, PlaylistStore, Result, TrackStore};
use cadence_playlists::{Materializer, MaterializerConfig};
use cadence_storage::LocalStore;
use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// Test database wrapper that cleans up on drop
pub struct TestDb {
    pub store: LocalStore,
    _temp_dir: TempDir,
}

impl TestDb {
    pub async fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_url = format!("sqlite://{}", temp_dir.path().join("test.db").display());
        let store = cadence_storage::open(&db_url)
            .await
            .expect("Failed to open store");

        Self {
            store,
            _temp_dir: temp_dir,
        }
    }

    pub fn materializer(&self) -> Materializer {
        self.materializer_with(test_config())
    }

    pub fn materializer_with(&self, config: MaterializerConfig) -> Materializer {
        Materializer::new(
            Arc::new(self.store.clone()),
            Arc::new(self.store.clone()),
            config,
        )
    }
}

/// Default config without retry pauses
pub fn test_config() -> MaterializerConfig {
    MaterializerConfig {
        retry_delay: std::time::Duration::ZERO,
        ..Default::default()
    }
}

pub fn epoch() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).expect("valid timestamp")
}

/// Test fixture: Create a track added `age_days` before `epoch()`
pub async fn add_track(store: &LocalStore, title: &str, age_days: i64) -> Track {
    store
        .create_track(
            NewTrack::new(title, MediaLocator::local(format!("/music/{}.mp3", title)))
                .with_duration_ms(60_000)
                .with_added_at(epoch() - Duration::days(age_days)),
        )
        .await
        .expect("Failed to create track")
}

pub async fn add_favorite(store: &LocalStore, title: &str) -> Track {
    store
        .create_track(
            NewTrack::new(title, MediaLocator::local(format!("/music/{}.mp3", title)))
                .with_duration_ms(60_000)
                .with_favorite(true),
        )
        .await
        .expect("Failed to create track")
}

pub async fn play(store: &LocalStore, track: &Track, times: u32) {
    for _ in 0..times {
        store
            .increment_play_count(track.id)
            .await
            .expect("Failed to count play");
    }
}

pub async fn smart_playlist(store: &LocalStore, name: &str, rule: SmartRule) -> Playlist {
    store
        .create_playlist(CreatePlaylist::smart(name, rule))
        .await
        .expect("Failed to create playlist")
}

pub async fn member_ids(store: &LocalStore, id: PlaylistId) -> Vec<TrackId> {
    store
        .get_items(id)
        .await
        .expect("Failed to get items")
        .iter()
        .map(|item| item.track_id)
        .collect()
}

/// How a `FaultyPlaylists` store misbehaves
#[derive(Debug, Clone, Copy)]
pub enum Fault {
    /// Fail the first `n` `replace_items` calls before touching the database
    FailFirst(u32),
    /// Append an unknown track id so the insert violates a foreign key
    DanglingTrack,
    /// Let writes through but fail every `mark_refreshed`
    FailMarkRefreshed,
}

/// Playlist store that injects failures into refresh writes
pub struct FaultyPlaylists {
    inner: LocalStore,
    fault: Fault,
    pub replace_calls: AtomicU32,
}

impl FaultyPlaylists {
    pub fn new(inner: LocalStore, fault: Fault) -> Self {
        Self {
            inner,
            fault,
            replace_calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.replace_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlaylistStore for FaultyPlaylists {
    async fn get_playlist(&self, id: PlaylistId) -> Result<Playlist> {
        self.inner.get_playlist(id).await
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Playlist>> {
        self.inner.find_by_name(name).await
    }

    async fn list_playlists(&self, kind: PlaylistKind) -> Result<Vec<Playlist>> {
        self.inner.list_playlists(kind).await
    }

    async fn create_playlist(&self, playlist: CreatePlaylist) -> Result<Playlist> {
        self.inner.create_playlist(playlist).await
    }

    async fn delete_playlist(&self, id: PlaylistId) -> Result<()> {
        self.inner.delete_playlist(id).await
    }

    async fn duplicate_playlist(&self, id: PlaylistId, new_name: &str) -> Result<Playlist> {
        self.inner.duplicate_playlist(id, new_name).await
    }

    async fn search_playlists(&self, query: &str) -> Result<Vec<Playlist>> {
        self.inner.search_playlists(query).await
    }

    async fn playlists_containing(&self, track_id: TrackId) -> Result<Vec<Playlist>> {
        self.inner.playlists_containing(track_id).await
    }

    async fn contains_track(&self, id: PlaylistId, track_id: TrackId) -> Result<bool> {
        self.inner.contains_track(id, track_id).await
    }

    async fn get_items(&self, id: PlaylistId) -> Result<Vec<PlaylistItem>> {
        self.inner.get_items(id).await
    }

    async fn tracks(&self, id: PlaylistId) -> Result<Vec<Track>> {
        self.inner.tracks(id).await
    }

    async fn replace_items(&self, id: PlaylistId, track_ids: &[TrackId]) -> Result<PlaylistTotals> {
        let call = self.replace_calls.fetch_add(1, Ordering::SeqCst) + 1;
        match self.fault {
            Fault::FailFirst(n) if call <= n => {
                Err(CadenceError::store(format!("injected failure {}", call)))
            }
            Fault::FailFirst(_) | Fault::FailMarkRefreshed => {
                self.inner.replace_items(id, track_ids).await
            }
            Fault::DanglingTrack => {
                let mut ids = track_ids.to_vec();
                ids.push(TrackId::new(999_999));
                self.inner.replace_items(id, &ids).await
            }
        }
    }

    async fn update_stats(&self, id: PlaylistId, track_count: u32, duration_ms: u64) -> Result<()> {
        self.inner.update_stats(id, track_count, duration_ms).await
    }

    async fn add_track(&self, id: PlaylistId, track_id: TrackId) -> Result<PlaylistItem> {
        self.inner.add_track(id, track_id).await
    }

    async fn remove_at(&self, id: PlaylistId, position: u32) -> Result<()> {
        self.inner.remove_at(id, position).await
    }

    async fn move_item(&self, id: PlaylistId, from: u32, to: u32) -> Result<()> {
        self.inner.move_item(id, from, to).await
    }

    async fn stats(&self, id: PlaylistId) -> Result<PlaylistStats> {
        self.inner.stats(id).await
    }

    async fn mark_refreshed(&self, id: PlaylistId, at: DateTime<Utc>) -> Result<()> {
        if let Fault::FailMarkRefreshed = self.fault {
            return Err(CadenceError::store("injected refresh stamp failure"));
        }
        self.inner.mark_refreshed(id, at).await
    }

    async fn record_item_played(&self, id: PlaylistId, position: u32) -> Result<()> {
        self.inner.record_item_played(id, position).await
    }

    async fn record_item_skipped(&self, id: PlaylistId, position: u32) -> Result<()> {
        self.inner.record_item_skipped(id, position).await
    }
}
