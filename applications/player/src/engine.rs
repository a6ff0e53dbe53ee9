//! Simulated playback engine
//!
//! Renders nothing: position advances with the tokio clock at the current
//! speed, and a track ends once its registered duration has elapsed. Used by
//! the headless binary and by tests (works with paused tokio time).

use cadence_core::{MediaLocator, Track};
use cadence_playback::{EngineStatus, PlaybackEngine, PlaybackError};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Default)]
pub struct ClockEngine {
    durations: HashMap<MediaLocator, Duration>,
    loaded: Option<MediaLocator>,
    playing: bool,
    /// Position at the last anchor point
    base: Duration,
    /// When playback last (re)started
    started: Option<Instant>,
    speed: f32,
    ended: bool,
    pending: VecDeque<EngineStatus>,
}

impl ClockEngine {
    pub fn new() -> Self {
        Self {
            speed: 1.0,
            ..Self::default()
        }
    }

    /// Engine that knows the length of every given track
    pub fn for_tracks<'a>(tracks: impl IntoIterator<Item = &'a Track>) -> Self {
        let mut engine = Self::new();
        for track in tracks {
            engine.register(track);
        }
        engine
    }

    /// Remember a track's length so it can end
    ///
    /// Media with an unknown (zero) duration plays forever.
    pub fn register(&mut self, track: &Track) {
        if !track.duration().is_zero() {
            self.durations
                .insert(track.locator.clone(), track.duration());
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn loaded(&self) -> Option<&MediaLocator> {
        self.loaded.as_ref()
    }

    fn duration(&self) -> Option<Duration> {
        self.loaded
            .as_ref()
            .and_then(|locator| self.durations.get(locator))
            .copied()
    }

    fn elapsed(&self) -> Duration {
        match self.started {
            Some(started) if self.playing => started.elapsed().mul_f64(f64::from(self.speed)),
            _ => Duration::ZERO,
        }
    }

    /// Fold elapsed time into `base` and restart the anchor
    fn reanchor(&mut self) {
        self.base = self.position();
        self.started = self.playing.then(Instant::now);
    }

    fn require_loaded(&self) -> cadence_playback::Result<()> {
        if self.loaded.is_none() {
            return Err(PlaybackError::engine("no media loaded"));
        }
        Ok(())
    }
}

impl PlaybackEngine for ClockEngine {
    fn load(&mut self, locator: &MediaLocator) -> cadence_playback::Result<()> {
        self.loaded = Some(locator.clone());
        self.playing = false;
        self.base = Duration::ZERO;
        self.started = None;
        self.ended = false;
        self.pending.push_back(EngineStatus::Ready);
        tracing::trace!(locator = ?locator, "Media loaded");
        Ok(())
    }

    fn play(&mut self) -> cadence_playback::Result<()> {
        self.require_loaded()?;
        if !self.playing {
            self.playing = true;
            self.started = Some(Instant::now());
        }
        Ok(())
    }

    fn pause(&mut self) -> cadence_playback::Result<()> {
        self.reanchor();
        self.playing = false;
        self.started = None;
        Ok(())
    }

    fn stop(&mut self) -> cadence_playback::Result<()> {
        self.loaded = None;
        self.playing = false;
        self.base = Duration::ZERO;
        self.started = None;
        self.ended = false;
        self.pending.push_back(EngineStatus::Idle);
        Ok(())
    }

    fn seek(&mut self, position: Duration) -> cadence_playback::Result<()> {
        self.require_loaded()?;
        self.base = match self.duration() {
            Some(duration) => position.min(duration),
            None => position,
        };
        self.started = self.playing.then(Instant::now);
        self.ended = false;
        Ok(())
    }

    fn set_speed(&mut self, speed: f32) -> cadence_playback::Result<()> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(PlaybackError::invalid_argument(format!(
                "speed must be positive, got {}",
                speed
            )));
        }
        self.reanchor();
        self.speed = speed;
        Ok(())
    }

    fn position(&self) -> Duration {
        let position = self.base + self.elapsed();
        match self.duration() {
            Some(duration) => position.min(duration),
            None => position,
        }
    }

    fn poll_status(&mut self) -> Option<EngineStatus> {
        if let Some(status) = self.pending.pop_front() {
            return Some(status);
        }

        let duration = self.duration()?;
        if self.playing && !self.ended && self.position() >= duration {
            self.base = duration;
            self.playing = false;
            self.started = None;
            self.ended = true;
            return Some(EngineStatus::Ended);
        }
        None
    }
}
