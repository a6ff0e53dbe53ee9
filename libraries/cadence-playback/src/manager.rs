//! Playback manager - core orchestration
//!
//! Owns the queue and drives the engine. Every transition (user command,
//! engine status, focus change, call state, tick) goes through `&mut self`,
//! so the owner decides how transitions are serialized.

use crate::{
    engine::{EngineStatus, PlaybackEngine},
    error::{PlaybackError, Result},
    events::{InterruptReason, PlaybackEvent},
    focus::{CallState, FocusArbiter, FocusChange, FocusGrant},
    queue::Queue,
    types::{
        PlaybackConfig, PlaybackSnapshot, PlaybackState, QueueChange, RepeatMode, MAX_SPEED,
        MIN_SPEED,
    },
};
use cadence_core::Track;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Playback state machine
pub struct PlaybackManager {
    state: PlaybackState,
    queue: Queue,
    engine: Box<dyn PlaybackEngine>,
    focus: Box<dyn FocusArbiter>,
    config: PlaybackConfig,

    // Track prepared in the engine; cleared by stop
    now_playing: Option<Track>,

    speed: f32,

    // Event queue for observers
    pending_events: Vec<PlaybackEvent>,
}

impl PlaybackManager {
    /// Create new playback manager
    pub fn new(
        engine: Box<dyn PlaybackEngine>,
        focus: Box<dyn FocusArbiter>,
        config: PlaybackConfig,
    ) -> Self {
        let mut queue = config.shuffle_seed.map_or_else(Queue::new, Queue::with_seed);
        queue.set_shuffle(config.shuffle);
        queue.set_repeat(config.repeat);

        Self {
            state: PlaybackState::Idle,
            queue,
            engine,
            focus,
            config,
            now_playing: None,
            speed: 1.0,
            pending_events: Vec::new(),
        }
    }

    // ===== Queue Loading =====

    /// Replace the queue and prepare `start_index` without changing state
    pub fn load(&mut self, tracks: Vec<Track>, start_index: usize) -> Result<()> {
        let saved = self.queue.clone();
        self.queue.load(tracks, start_index)?;

        if let Err(e) = self.prepare_current() {
            self.queue = saved;
            return Err(e);
        }

        info!(
            tracks = self.queue.len(),
            start_index, "Loaded queue"
        );
        self.flush_queue_changes();
        self.emit_update();
        Ok(())
    }

    /// Load a queue and start playing it
    pub fn play_queue(&mut self, tracks: Vec<Track>, start_index: usize) -> Result<()> {
        self.load(tracks, start_index)?;
        self.play()
    }

    // ===== Playback Control =====

    /// Start or resume playback
    ///
    /// A denied playback resource leaves the state untouched and is not an
    /// error.
    pub fn play(&mut self) -> Result<()> {
        if self.queue.current().is_none() {
            return Err(PlaybackError::NoTrackLoaded);
        }
        if self.state == PlaybackState::Playing {
            return Ok(());
        }

        if self.focus.acquire() == FocusGrant::Denied {
            debug!(state = self.state.as_str(), "Playback resource denied, ignoring play");
            return Ok(());
        }

        let prepared_here = self.now_playing.is_none();
        if prepared_here {
            if let Err(e) = self.prepare_current() {
                self.focus.release();
                return Err(e);
            }
        }
        if let Err(e) = self.engine.play() {
            self.focus.release();
            if prepared_here {
                self.now_playing = None;
                self.release_engine();
            }
            return Err(e);
        }

        self.state = PlaybackState::Playing;
        self.emit_update();
        Ok(())
    }

    /// Pause while playing, play otherwise
    pub fn toggle_playback(&mut self) -> Result<()> {
        if self.state == PlaybackState::Playing {
            self.pause()
        } else {
            self.play()
        }
    }

    /// Pause playback
    pub fn pause(&mut self) -> Result<()> {
        self.focus.release();
        if self.state != PlaybackState::Playing {
            return Ok(());
        }

        self.engine.pause()?;
        self.state = PlaybackState::Paused;
        self.emit_update();
        Ok(())
    }

    /// Stop playback
    ///
    /// Clears the current track (but not the queue)
    pub fn stop(&mut self) -> Result<()> {
        self.engine.stop()?;
        self.focus.release();
        self.state = PlaybackState::Stopped;
        self.now_playing = None;
        self.emit_update();
        Ok(())
    }

    /// Skip to next track
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<()> {
        if self.queue.is_empty() {
            return Ok(());
        }
        let previous = self.queue.cursor();
        self.queue.next();
        self.enter_selected(previous)
    }

    /// Go to previous track
    ///
    /// Past the restart threshold the current track is restarted instead and
    /// the cursor stays put.
    pub fn previous(&mut self) -> Result<()> {
        if self.queue.is_empty() {
            return Ok(());
        }

        if self.now_playing.is_some() && self.engine.position() > self.config.restart_threshold()
        {
            self.engine.seek(Duration::ZERO)?;
            self.pending_events
                .push(PlaybackEvent::SeekIssued { position_ms: 0 });
            self.emit_update();
            return Ok(());
        }

        let previous = self.queue.cursor();
        self.queue.previous();
        self.enter_selected(previous)
    }

    /// Select an arbitrary queue slot
    pub fn jump_to(&mut self, index: usize) -> Result<()> {
        let previous = self.queue.cursor();
        self.queue.select(index)?;
        self.enter_selected(previous)
    }

    /// Seek within the current track
    ///
    /// Positions past a known duration are clamped to it.
    pub fn seek(&mut self, position: Duration) -> Result<()> {
        let Some(track) = &self.now_playing else {
            return Err(PlaybackError::NoTrackLoaded);
        };

        let position = if track.duration_ms > 0 {
            position.min(track.duration())
        } else {
            position
        };

        self.engine.seek(position)?;
        self.pending_events.push(PlaybackEvent::SeekIssued {
            position_ms: millis(position),
        });
        self.emit_update();
        Ok(())
    }

    /// Change playback speed (0.25 to 4.0)
    pub fn set_speed(&mut self, speed: f32) -> Result<()> {
        if !(MIN_SPEED..=MAX_SPEED).contains(&speed) {
            return Err(PlaybackError::invalid_argument(format!(
                "speed {} outside [{}, {}]",
                speed, MIN_SPEED, MAX_SPEED
            )));
        }

        self.engine.set_speed(speed)?;
        self.speed = speed;
        self.emit_update();
        Ok(())
    }

    // ===== External Signals =====

    /// Handle a status reported by the engine
    pub fn on_engine_status(&mut self, status: EngineStatus) -> Result<()> {
        match status {
            EngineStatus::Ended => self.on_track_ended(),
            EngineStatus::Idle => {
                if self.state == PlaybackState::Stopped {
                    self.state = PlaybackState::Idle;
                    self.emit_update();
                }
                Ok(())
            }
            EngineStatus::Ready | EngineStatus::Buffering => {
                trace!(?status, "Engine status");
                Ok(())
            }
        }
    }

    /// Handle a focus notification
    ///
    /// Any loss pauses. Regaining focus never resumes on its own.
    pub fn on_focus_change(&mut self, change: FocusChange) -> Result<()> {
        if change.is_loss() {
            return self.interrupt(InterruptReason::FocusLost);
        }
        debug!("Playback resource regained");
        Ok(())
    }

    /// Handle a telephony notification
    pub fn on_call_state(&mut self, call: CallState) -> Result<()> {
        if call.is_active() {
            return self.interrupt(InterruptReason::PhoneCall);
        }
        Ok(())
    }

    /// Handle every status change the engine has queued
    pub fn poll_engine(&mut self) -> Result<()> {
        while let Some(status) = self.engine.poll_status() {
            self.on_engine_status(status)?;
        }
        Ok(())
    }

    /// Drain engine status changes and report the position while playing
    pub fn tick(&mut self) -> Result<()> {
        self.poll_engine()?;

        if self.state == PlaybackState::Playing {
            let duration_ms = self.now_playing.as_ref().map_or(0, |t| t.duration_ms);
            self.pending_events.push(PlaybackEvent::PositionUpdate {
                position_ms: millis(self.engine.position()),
                duration_ms,
            });
        }
        Ok(())
    }

    // ===== Shuffle & Repeat =====

    pub fn set_shuffle(&mut self, shuffle: bool) {
        self.queue.set_shuffle(shuffle);
        self.emit_update();
    }

    pub fn toggle_shuffle(&mut self) {
        self.set_shuffle(!self.queue.shuffle());
    }

    pub fn set_repeat(&mut self, mode: RepeatMode) {
        self.queue.set_repeat(mode);
        self.emit_update();
    }

    /// Off -> One -> All -> Off
    pub fn cycle_repeat(&mut self) -> RepeatMode {
        let mode = self.queue.repeat().cycle();
        self.set_repeat(mode);
        mode
    }

    // ===== Queue Management =====

    /// Add track to end of queue
    pub fn add_to_queue(&mut self, track: Track) -> Result<()> {
        let was_empty = self.queue.is_empty();
        self.queue.append(track);
        self.after_insert(was_empty)
    }

    /// Add track right after the current one
    pub fn add_next(&mut self, track: Track) -> Result<()> {
        let was_empty = self.queue.is_empty();
        self.queue.insert_next(track);
        self.after_insert(was_empty)
    }

    /// Reorder queue
    pub fn move_item(&mut self, from: usize, to: usize) -> Result<()> {
        self.queue.move_item(from, to)?;
        self.flush_queue_changes();
        self.emit_update();
        Ok(())
    }

    /// Remove track from queue
    ///
    /// Removing the current track prepares its successor in place, playing
    /// it if the manager was playing. Emptying the queue stops playback.
    pub fn remove_from_queue(&mut self, index: usize) -> Result<Track> {
        let saved = self.queue.clone();
        let was_current = self.queue.cursor() == Some(index);
        let removed = self.queue.remove(index)?;

        if self.queue.is_empty() {
            if let Err(e) = self.engine.stop() {
                self.queue = saved;
                return Err(e);
            }
            self.focus.release();
            self.state = PlaybackState::Stopped;
            self.now_playing = None;
        } else if was_current && self.now_playing.is_some() {
            if let Err(e) = self.prepare_current() {
                self.queue = saved;
                return Err(e);
            }
        }

        self.flush_queue_changes();
        self.emit_update();
        Ok(removed)
    }

    /// Clear queue and stop
    pub fn clear_queue(&mut self) -> Result<()> {
        self.engine.stop()?;
        self.focus.release();
        self.queue.clear();
        self.state = PlaybackState::Stopped;
        self.now_playing = None;
        self.flush_queue_changes();
        self.emit_update();
        Ok(())
    }

    // ===== State Queries =====

    pub fn get_state(&self) -> PlaybackState {
        self.state
    }

    /// Track currently prepared in the engine
    pub fn get_current_track(&self) -> Option<&Track> {
        self.now_playing.as_ref()
    }

    pub fn get_queue(&self) -> &[Track] {
        self.queue.tracks()
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    /// Queue cursor, -1 when nothing is selected
    pub fn cursor_index(&self) -> i64 {
        self.queue.cursor_index()
    }

    /// Position in the current track, zero when nothing is prepared
    pub fn get_position(&self) -> Duration {
        if self.now_playing.is_some() {
            self.engine.position()
        } else {
            Duration::ZERO
        }
    }

    pub fn get_speed(&self) -> f32 {
        self.speed
    }

    pub fn get_shuffle(&self) -> bool {
        self.queue.shuffle()
    }

    pub fn get_repeat(&self) -> RepeatMode {
        self.queue.repeat()
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// Everything an observer needs to render the player
    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            state: self.state,
            track: self.now_playing.clone(),
            cursor: self.queue.cursor_index(),
            queue_length: self.queue.len(),
            shuffle: self.queue.shuffle(),
            repeat: self.queue.repeat(),
            position_ms: millis(self.get_position()),
            speed: self.speed,
        }
    }

    // ===== Event Queue =====

    /// Drain all pending events
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Check if there are pending events
    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    // ===== Internal =====

    /// Load the cursor track into the engine
    ///
    /// Plays it straight away when the manager is already playing. On failure
    /// the engine is put back on the previously prepared track.
    fn prepare_current(&mut self) -> Result<()> {
        let track = self
            .queue
            .current()
            .cloned()
            .ok_or(PlaybackError::NoTrackLoaded)?;

        let resume_at = self.now_playing.as_ref().map(|_| self.engine.position());
        if let Err(e) = self.start_track(&track) {
            self.restore_engine(resume_at);
            return Err(e);
        }

        debug!(track_id = track.id.get(), title = %track.title, "Prepared track");
        self.now_playing = Some(track);
        Ok(())
    }

    fn start_track(&mut self, track: &Track) -> Result<()> {
        self.engine.load(&track.locator)?;
        if self.config.resume_from_bookmark {
            if let Some(bookmark) = track.bookmark() {
                debug!(track_id = track.id.get(), bookmark_ms = track.bookmark_ms, "Resuming from bookmark");
                self.engine.seek(bookmark)?;
            }
        }
        if self.state == PlaybackState::Playing {
            self.engine.play()?;
        }
        Ok(())
    }

    /// Reload `now_playing` at `resume_at` after a failed prepare
    fn restore_engine(&mut self, resume_at: Option<Duration>) {
        let (Some(track), Some(position)) = (self.now_playing.clone(), resume_at) else {
            self.release_engine();
            return;
        };

        let result = self
            .engine
            .load(&track.locator)
            .and_then(|()| self.engine.seek(position));
        let result = match result {
            Ok(()) if self.state == PlaybackState::Playing => self.engine.play(),
            other => other,
        };
        if let Err(e) = result {
            warn!(track_id = track.id.get(), error = %e, "Failed to restore previous track");
        }
    }

    fn release_engine(&mut self) {
        if let Err(e) = self.engine.stop() {
            warn!(error = %e, "Failed to release engine");
        }
    }

    /// Prepare the newly selected track, putting the cursor back on failure
    fn enter_selected(&mut self, previous: Option<usize>) -> Result<()> {
        if let Err(e) = self.prepare_current() {
            self.queue.restore_cursor(previous);
            self.queue.drain_changes();
            return Err(e);
        }

        self.flush_queue_changes();
        self.emit_update();
        Ok(())
    }

    fn after_insert(&mut self, was_empty: bool) -> Result<()> {
        if was_empty && self.state != PlaybackState::Stopped {
            if let Err(e) = self.prepare_current() {
                self.queue.clear();
                self.queue.drain_changes();
                return Err(e);
            }
        }

        self.flush_queue_changes();
        self.emit_update();
        Ok(())
    }

    fn on_track_ended(&mut self) -> Result<()> {
        if self.state != PlaybackState::Playing {
            debug!(state = self.state.as_str(), "Ignoring end of media");
            return Ok(());
        }
        let Some(track_id) = self.queue.current().map(|t| t.id) else {
            return Ok(());
        };

        self.pending_events
            .push(PlaybackEvent::TrackFinished { track_id });

        match self.queue.repeat() {
            RepeatMode::One => {
                self.engine.seek(Duration::ZERO)?;
                self.pending_events
                    .push(PlaybackEvent::SeekIssued { position_ms: 0 });
                self.engine.play()?;
                self.emit_update();
                Ok(())
            }
            RepeatMode::Off if self.queue.is_at_last() => {
                info!("Reached end of queue");
                self.stop()
            }
            _ => {
                let previous = self.queue.cursor();
                self.queue.next();
                self.enter_selected(previous)
            }
        }
    }

    fn interrupt(&mut self, reason: InterruptReason) -> Result<()> {
        if self.state != PlaybackState::Playing {
            return Ok(());
        }

        self.engine.pause()?;
        self.focus.release();
        self.state = PlaybackState::Paused;
        info!(?reason, "Playback interrupted");
        self.pending_events.push(PlaybackEvent::Interrupted { reason });
        self.emit_update();
        Ok(())
    }

    fn flush_queue_changes(&mut self) {
        let mut reshaped = false;
        for change in self.queue.drain_changes() {
            match change {
                QueueChange::TrackChanged { index, track_id } => {
                    self.pending_events
                        .push(PlaybackEvent::TrackChanged { index, track_id });
                }
                QueueChange::Reordered { .. }
                | QueueChange::Inserted { .. }
                | QueueChange::Removed { .. }
                | QueueChange::Cleared => reshaped = true,
            }
        }

        if reshaped {
            self.pending_events.push(PlaybackEvent::QueueChanged {
                length: self.queue.len(),
            });
        }
    }

    fn emit_update(&mut self) {
        let snapshot = self.snapshot();
        self.pending_events.push(PlaybackEvent::Update(snapshot));
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
