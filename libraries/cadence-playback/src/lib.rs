//! Cadence - Playback Management
//!
//! Platform-agnostic queue engine and playback state machine.
//!
//! This crate provides:
//! - Play queue with a cursor that stays consistent under mutation
//! - Shuffle (uniform random steps) and repeat modes (Off, One, All)
//! - Playback state machine (Idle, Playing, Paused, Stopped)
//! - Restart-on-previous, bookmark resume and playback speed
//! - Interruption handling (focus loss, phone calls)
//!
//! # Architecture
//!
//! `cadence-playback` performs no I/O:
//! - No dependency on an audio backend
//! - No dependency on cadence-storage (database)
//! - No async runtime
//!
//! The platform supplies a [`PlaybackEngine`] and a [`FocusArbiter`]. The
//! manager queues [`PlaybackEvent`]s that its owner drains after every call.
//!
//! # Example
//!
//! ```rust
//! use cadence_core::{MediaLocator, Track, TrackId};
//! use cadence_playback::{
//!     EngineStatus, LocalFocus, PlaybackConfig, PlaybackEngine, PlaybackManager,
//!     PlaybackState, Result,
//! };
//! use std::time::Duration;
//!
//! // Engine that reports no progress
//! struct Muted;
//!
//! impl PlaybackEngine for Muted {
//!     fn load(&mut self, _locator: &MediaLocator) -> Result<()> { Ok(()) }
//!     fn play(&mut self) -> Result<()> { Ok(()) }
//!     fn pause(&mut self) -> Result<()> { Ok(()) }
//!     fn stop(&mut self) -> Result<()> { Ok(()) }
//!     fn seek(&mut self, _position: Duration) -> Result<()> { Ok(()) }
//!     fn set_speed(&mut self, _speed: f32) -> Result<()> { Ok(()) }
//!     fn position(&self) -> Duration { Duration::ZERO }
//!     fn poll_status(&mut self) -> Option<EngineStatus> { None }
//! }
//!
//! let track = Track {
//!     id: TrackId::new(1),
//!     title: "My Song".to_string(),
//!     artist: Some("Artist Name".to_string()),
//!     album: None,
//!     genre: None,
//!     track_number: Some(1),
//!     year: None,
//!     duration_ms: 180_000,
//!     play_count: 0,
//!     favorite: false,
//!     rating: 0,
//!     bookmark_ms: 0,
//!     locator: MediaLocator::local("/music/song.mp3"),
//!     added_at: Default::default(),
//!     last_played: None,
//! };
//!
//! let mut manager = PlaybackManager::new(
//!     Box::new(Muted),
//!     Box::new(LocalFocus::new()),
//!     PlaybackConfig::default(),
//! );
//!
//! manager.play_queue(vec![track], 0).unwrap();
//! assert_eq!(manager.get_state(), PlaybackState::Playing);
//!
//! manager.on_engine_status(EngineStatus::Ended).unwrap();
//! assert_eq!(manager.get_state(), PlaybackState::Stopped);
//! ```

pub mod engine;
mod error;
pub mod events;
pub mod focus;
mod manager;
pub mod queue;
pub mod types;

// Public exports
pub use engine::{EngineStatus, PlaybackEngine};
pub use error::{PlaybackError, Result};
pub use events::{InterruptReason, PlaybackEvent};
pub use focus::{CallState, FocusArbiter, FocusChange, FocusGrant, LocalFocus};
pub use manager::PlaybackManager;
pub use queue::Queue;
pub use types::{
    PlaybackConfig, PlaybackSnapshot, PlaybackState, QueueChange, RepeatMode, MAX_SPEED,
    MIN_SPEED,
};
