//! Shared fixtures for player integration tests

#![allow(dead_code)]

use cadence_core::{MediaLocator, NewTrack, Track, TrackStore};
use cadence_playback::{LocalFocus, PlaybackConfig, PlaybackEvent, PlaybackManager};
use cadence_player::{ClockEngine, PlayerHandle, PlayerService};
use cadence_storage::LocalStore;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

pub const TICK: Duration = Duration::from_millis(20);
pub const WAIT: Duration = Duration::from_secs(5);

/// Store on a temporary SQLite file, removed on drop
pub struct TestDb {
    pub store: LocalStore,
    _temp_dir: TempDir,
}

impl TestDb {
    pub async fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_url = format!("sqlite://{}", temp_dir.path().join("player.db").display());
        let store = cadence_storage::open(&db_url)
            .await
            .expect("Failed to open store");

        Self {
            store,
            _temp_dir: temp_dir,
        }
    }

    pub async fn add_track(&self, title: &str, duration_ms: u64) -> Track {
        self.store
            .create_track(
                NewTrack::new(title, MediaLocator::local(format!("/music/{}.mp3", title)))
                    .with_duration_ms(duration_ms),
            )
            .await
            .expect("Failed to create track")
    }

    /// Start a player whose clock engine knows `library`
    pub fn spawn_player(&self, library: &[Track]) -> (PlayerHandle, JoinHandle<()>) {
        let engine = ClockEngine::for_tracks(library);
        let manager = PlaybackManager::new(
            Box::new(engine),
            Box::new(LocalFocus::new()),
            PlaybackConfig::default(),
        );
        PlayerService::spawn(
            manager,
            Arc::new(self.store.clone()),
            Arc::new(self.store.clone()),
            TICK,
        )
    }
}

/// Wait for the first event matching `predicate`
pub async fn wait_for<F>(
    events: &mut broadcast::Receiver<PlaybackEvent>,
    mut predicate: F,
) -> PlaybackEvent
where
    F: FnMut(&PlaybackEvent) -> bool,
{
    tokio::time::timeout(WAIT, async {
        loop {
            match events.recv().await {
                Ok(event) if predicate(&event) => return event,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => panic!("event channel closed"),
            }
        }
    })
    .await
    .expect("Timed out waiting for event")
}

/// Everything already buffered on the receiver
pub fn drain(events: &mut broadcast::Receiver<PlaybackEvent>) -> Vec<PlaybackEvent> {
    let mut drained = Vec::new();
    loop {
        match events.try_recv() {
            Ok(event) => drained.push(event),
            Err(broadcast::error::TryRecvError::Lagged(_)) => {}
            Err(_) => return drained,
        }
    }
}

pub fn is_position_update(event: &PlaybackEvent) -> bool {
    matches!(event, PlaybackEvent::PositionUpdate { .. })
}
