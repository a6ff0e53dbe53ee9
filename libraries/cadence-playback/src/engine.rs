//! Platform-agnostic playback engine contract
//!
//! The engine decodes and renders media; the manager only tells it what to
//! load and when to play. Platforms provide the implementation.

use crate::error::Result;
use cadence_core::MediaLocator;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Status reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineStatus {
    /// Media prepared and able to render
    Ready,
    /// Waiting for data
    Buffering,
    /// Reached the end of the media on its own
    Ended,
    /// Nothing loaded
    Idle,
}

/// Media playback engine
///
/// Implementors must be cheap to call from a single thread; the manager never
/// calls them concurrently.
pub trait PlaybackEngine: Send {
    /// Prepare media for playback, replacing whatever was loaded
    fn load(&mut self, locator: &MediaLocator) -> Result<()>;

    /// Start or resume rendering
    fn play(&mut self) -> Result<()>;

    /// Pause rendering, keeping the position
    fn pause(&mut self) -> Result<()>;

    /// Stop rendering and release the media
    fn stop(&mut self) -> Result<()>;

    /// Jump to a position in the loaded media
    fn seek(&mut self, position: Duration) -> Result<()>;

    /// Change playback rate
    fn set_speed(&mut self, speed: f32) -> Result<()>;

    /// Current position in the loaded media
    fn position(&self) -> Duration;

    /// Next pending status change, if any
    fn poll_status(&mut self) -> Option<EngineStatus>;
}
