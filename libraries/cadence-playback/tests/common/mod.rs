//! Common test utilities and fixtures
#![allow(dead_code)]

use cadence_core::{MediaLocator, Track, TrackId};
use cadence_playback::{
    EngineStatus, FocusArbiter, FocusGrant, LocalFocus, PlaybackConfig, PlaybackEngine,
    PlaybackError, PlaybackManager, Result,
};
use chrono::{TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Command received by the mock engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Load(MediaLocator),
    Play,
    Pause,
    Stop,
    Seek(Duration),
    SetSpeed(f32),
}

#[derive(Debug, Default)]
struct EngineScript {
    calls: Vec<EngineCall>,
    position: Duration,
    statuses: VecDeque<EngineStatus>,
    fail_loads: bool,
    fail_plays: bool,
}

/// Engine double that records every command
///
/// Clones share state, so a test keeps one handle after boxing another into
/// the manager.
#[derive(Debug, Clone, Default)]
pub struct MockEngine {
    script: Arc<Mutex<EngineScript>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.script.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.script.lock().unwrap().calls.clear();
    }

    pub fn set_position_ms(&self, ms: u64) {
        self.script.lock().unwrap().position = Duration::from_millis(ms);
    }

    pub fn push_status(&self, status: EngineStatus) {
        self.script.lock().unwrap().statuses.push_back(status);
    }

    pub fn fail_loads(&self, fail: bool) {
        self.script.lock().unwrap().fail_loads = fail;
    }

    pub fn fail_plays(&self, fail: bool) {
        self.script.lock().unwrap().fail_plays = fail;
    }

    /// Locator of the most recent successful load
    pub fn loaded(&self) -> Option<MediaLocator> {
        self.calls().into_iter().rev().find_map(|call| match call {
            EngineCall::Load(locator) => Some(locator),
            _ => None,
        })
    }

    fn record(&self, call: EngineCall) {
        self.script.lock().unwrap().calls.push(call);
    }
}

impl PlaybackEngine for MockEngine {
    fn load(&mut self, locator: &MediaLocator) -> Result<()> {
        let mut script = self.script.lock().unwrap();
        if script.fail_loads {
            return Err(PlaybackError::engine(format!("cannot open {}", locator)));
        }
        script.position = Duration::ZERO;
        script.calls.push(EngineCall::Load(locator.clone()));
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        if self.script.lock().unwrap().fail_plays {
            return Err(PlaybackError::engine("output device unavailable"));
        }
        self.record(EngineCall::Play);
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.record(EngineCall::Pause);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.record(EngineCall::Stop);
        Ok(())
    }

    fn seek(&mut self, position: Duration) -> Result<()> {
        let mut script = self.script.lock().unwrap();
        script.position = position;
        script.calls.push(EngineCall::Seek(position));
        Ok(())
    }

    fn set_speed(&mut self, speed: f32) -> Result<()> {
        self.record(EngineCall::SetSpeed(speed));
        Ok(())
    }

    fn position(&self) -> Duration {
        self.script.lock().unwrap().position
    }

    fn poll_status(&mut self) -> Option<EngineStatus> {
        self.script.lock().unwrap().statuses.pop_front()
    }
}

/// Focus arbiter whose blocking can be toggled from the test
#[derive(Debug, Clone, Default)]
pub struct SharedFocus {
    inner: Arc<Mutex<LocalFocus>>,
}

impl SharedFocus {
    pub fn set_blocked(&self, blocked: bool) {
        self.inner.lock().unwrap().set_blocked(blocked);
    }

    pub fn is_held(&self) -> bool {
        self.inner.lock().unwrap().is_held()
    }
}

impl FocusArbiter for SharedFocus {
    fn acquire(&mut self) -> FocusGrant {
        self.inner.lock().unwrap().acquire()
    }

    fn release(&mut self) {
        self.inner.lock().unwrap().release();
    }
}

/// Manager wired to test doubles
pub struct Harness {
    pub manager: PlaybackManager,
    pub engine: MockEngine,
    pub focus: SharedFocus,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(PlaybackConfig::default())
    }

    pub fn with_config(config: PlaybackConfig) -> Self {
        let engine = MockEngine::new();
        let focus = SharedFocus::default();
        let manager =
            PlaybackManager::new(Box::new(engine.clone()), Box::new(focus.clone()), config);
        Self {
            manager,
            engine,
            focus,
        }
    }
}

pub fn locator(id: i64) -> MediaLocator {
    MediaLocator::local(format!("/music/{}.mp3", id))
}

pub fn create_track(id: i64) -> Track {
    Track {
        id: TrackId::new(id),
        title: format!("Track {}", id),
        artist: Some("Test Artist".to_string()),
        album: Some("Test Album".to_string()),
        genre: None,
        track_number: None,
        year: None,
        duration_ms: 180_000,
        play_count: 0,
        favorite: false,
        rating: 0,
        bookmark_ms: 0,
        locator: locator(id),
        added_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        last_played: None,
    }
}

/// Tracks with ids `1..=n`
pub fn create_tracks(n: i64) -> Vec<Track> {
    (1..=n).map(create_track).collect()
}
