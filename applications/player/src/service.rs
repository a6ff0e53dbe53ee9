//! Player service
//!
//! A single tokio task owns the `PlaybackManager`. User commands, engine
//! status, focus changes, call state and position ticks all arrive as
//! messages, so transitions never overlap. Events drained from the manager
//! are fanned out on a broadcast channel.

use crate::error::{PlayerError, Result};
use cadence_core::{Playlist, PlaylistId, PlaylistStore, Track, TrackId, TrackStore};
use cadence_playback::{
    CallState, EngineStatus, FocusChange, PlaybackError, PlaybackEvent, PlaybackManager,
    PlaybackSnapshot, PlaybackState, RepeatMode,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

const COMMAND_BUFFER: usize = 64;
const EVENT_BUFFER: usize = 256;

/// User commands accepted by the player
#[derive(Debug, Clone)]
pub enum PlayerCommand {
    /// Replace the queue; start playing when `play` is set
    Load {
        tracks: Vec<Track>,
        start: usize,
        play: bool,
    },
    Play,
    Pause,
    TogglePlayback,
    Stop,
    Next,
    Previous,
    JumpTo(usize),
    Seek(Duration),
    SetSpeed(f32),
    SetShuffle(bool),
    ToggleShuffle,
    SetRepeat(RepeatMode),
    CycleRepeat,
    Enqueue(Track),
    EnqueueNext(Track),
    Move { from: usize, to: usize },
    Remove(usize),
    ClearQueue,
}

type Reply<T> = oneshot::Sender<T>;

enum Message {
    Command {
        command: PlayerCommand,
        reply: Reply<std::result::Result<PlaybackSnapshot, PlaybackError>>,
    },
    Snapshot(Reply<PlaybackSnapshot>),
    Queue(Reply<Vec<Track>>),
    Engine(EngineStatus),
    Focus(FocusChange),
    Call(CallState),
    Tick,
    Shutdown,
}

/// Handle to the player service for sending commands
#[derive(Clone)]
pub struct PlayerHandle {
    tx: mpsc::Sender<Message>,
    events: broadcast::Sender<PlaybackEvent>,
    playlists: Arc<dyn PlaylistStore>,
}

impl PlayerHandle {
    /// Run a command and return the state it left behind
    pub async fn send(&self, command: PlayerCommand) -> Result<PlaybackSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.post(Message::Command { command, reply }).await?;
        let snapshot = rx.await.map_err(|_| PlayerError::ChannelClosed)??;
        Ok(snapshot)
    }

    async fn post(&self, message: Message) -> Result<()> {
        self.tx
            .send(message)
            .await
            .map_err(|_| PlayerError::ChannelClosed)
    }

    // ===== Queue Loading =====

    pub async fn load(&self, tracks: Vec<Track>, start: usize) -> Result<PlaybackSnapshot> {
        self.send(PlayerCommand::Load {
            tracks,
            start,
            play: false,
        })
        .await
    }

    pub async fn play_tracks(&self, tracks: Vec<Track>, start: usize) -> Result<PlaybackSnapshot> {
        self.send(PlayerCommand::Load {
            tracks,
            start,
            play: true,
        })
        .await
    }

    /// Copy a playlist's members into the queue and start playing
    ///
    /// The store is read here, in the caller's task; the service only ever
    /// receives owned tracks.
    pub async fn play_playlist(&self, id: PlaylistId, start: usize) -> Result<PlaybackSnapshot> {
        let tracks = cadence_playlists::playlist_snapshot(self.playlists.as_ref(), id).await?;
        debug!(playlist_id = id.get(), tracks = tracks.len(), "Playing playlist");
        self.play_tracks(tracks, start).await
    }

    /// Write the current queue order into a new manual playlist
    pub async fn save_queue(&self, name: &str) -> Result<Playlist> {
        let (reply, rx) = oneshot::channel();
        self.post(Message::Queue(reply)).await?;
        let tracks = rx.await.map_err(|_| PlayerError::ChannelClosed)?;
        let playlist =
            cadence_playlists::save_queue_as_playlist(self.playlists.as_ref(), name, &tracks)
                .await?;
        Ok(playlist)
    }

    // ===== Playback Control =====

    pub async fn play(&self) -> Result<PlaybackSnapshot> {
        self.send(PlayerCommand::Play).await
    }

    pub async fn pause(&self) -> Result<PlaybackSnapshot> {
        self.send(PlayerCommand::Pause).await
    }

    /// Pause while playing, play otherwise
    pub async fn toggle_playback(&self) -> Result<PlaybackSnapshot> {
        self.send(PlayerCommand::TogglePlayback).await
    }

    pub async fn stop(&self) -> Result<PlaybackSnapshot> {
        self.send(PlayerCommand::Stop).await
    }

    pub async fn next(&self) -> Result<PlaybackSnapshot> {
        self.send(PlayerCommand::Next).await
    }

    pub async fn previous(&self) -> Result<PlaybackSnapshot> {
        self.send(PlayerCommand::Previous).await
    }

    pub async fn jump_to(&self, index: usize) -> Result<PlaybackSnapshot> {
        self.send(PlayerCommand::JumpTo(index)).await
    }

    pub async fn seek(&self, position: Duration) -> Result<PlaybackSnapshot> {
        self.send(PlayerCommand::Seek(position)).await
    }

    pub async fn set_speed(&self, speed: f32) -> Result<PlaybackSnapshot> {
        self.send(PlayerCommand::SetSpeed(speed)).await
    }

    // ===== Shuffle & Repeat =====

    pub async fn set_shuffle(&self, shuffle: bool) -> Result<PlaybackSnapshot> {
        self.send(PlayerCommand::SetShuffle(shuffle)).await
    }

    pub async fn toggle_shuffle(&self) -> Result<bool> {
        Ok(self.send(PlayerCommand::ToggleShuffle).await?.shuffle)
    }

    pub async fn set_repeat(&self, mode: RepeatMode) -> Result<PlaybackSnapshot> {
        self.send(PlayerCommand::SetRepeat(mode)).await
    }

    pub async fn cycle_repeat(&self) -> Result<RepeatMode> {
        Ok(self.send(PlayerCommand::CycleRepeat).await?.repeat)
    }

    // ===== Queue Management =====

    pub async fn enqueue(&self, track: Track) -> Result<PlaybackSnapshot> {
        self.send(PlayerCommand::Enqueue(track)).await
    }

    pub async fn enqueue_next(&self, track: Track) -> Result<PlaybackSnapshot> {
        self.send(PlayerCommand::EnqueueNext(track)).await
    }

    pub async fn move_item(&self, from: usize, to: usize) -> Result<PlaybackSnapshot> {
        self.send(PlayerCommand::Move { from, to }).await
    }

    pub async fn remove(&self, index: usize) -> Result<PlaybackSnapshot> {
        self.send(PlayerCommand::Remove(index)).await
    }

    pub async fn clear_queue(&self) -> Result<PlaybackSnapshot> {
        self.send(PlayerCommand::ClearQueue).await
    }

    // ===== Platform Signals =====

    pub async fn notify_engine(&self, status: EngineStatus) -> Result<()> {
        self.post(Message::Engine(status)).await
    }

    pub async fn notify_focus(&self, change: FocusChange) -> Result<()> {
        self.post(Message::Focus(change)).await
    }

    pub async fn notify_call(&self, call: CallState) -> Result<()> {
        self.post(Message::Call(call)).await
    }

    // ===== Observation =====

    pub async fn snapshot(&self) -> Result<PlaybackSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.post(Message::Snapshot(reply)).await?;
        rx.await.map_err(|_| PlayerError::ChannelClosed)
    }

    pub async fn queue(&self) -> Result<Vec<Track>> {
        let (reply, rx) = oneshot::channel();
        self.post(Message::Queue(reply)).await?;
        rx.await.map_err(|_| PlayerError::ChannelClosed)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }

    /// Stop playback and end the service task
    pub async fn shutdown(&self) -> Result<()> {
        self.post(Message::Shutdown).await
    }
}

/// Task owning the playback state machine
pub struct PlayerService {
    manager: PlaybackManager,
    rx: mpsc::Receiver<Message>,
    events: broadcast::Sender<PlaybackEvent>,
    tracks: Arc<dyn TrackStore>,
    tick_period: Duration,
    // Present only while playing
    ticker: Option<Interval>,
}

impl PlayerService {
    /// Start the service on the current runtime
    pub fn spawn(
        manager: PlaybackManager,
        tracks: Arc<dyn TrackStore>,
        playlists: Arc<dyn PlaylistStore>,
        tick_period: Duration,
    ) -> (PlayerHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let (events, _) = broadcast::channel(EVENT_BUFFER);

        let handle = PlayerHandle {
            tx,
            events: events.clone(),
            playlists,
        };

        let mut service = PlayerService {
            manager,
            rx,
            events,
            tracks,
            tick_period,
            ticker: None,
        };
        service.sync_ticker();

        let task = tokio::spawn(async move { service.run().await });
        (handle, task)
    }

    async fn run(mut self) {
        info!(tick_ms = self.tick_period.as_millis() as u64, "Player service started");

        loop {
            let message = tokio::select! {
                message = self.rx.recv() => match message {
                    Some(message) => message,
                    None => break,
                },
                () = next_tick(&mut self.ticker) => Message::Tick,
            };

            if matches!(message, Message::Shutdown) {
                if let Err(e) = self.manager.stop() {
                    warn!(error = %e, "Failed to stop playback on shutdown");
                }
                self.poll_engine();
                self.publish();
                break;
            }

            self.handle(message);
            self.poll_engine();
            self.publish();
            self.sync_ticker();
        }

        info!("Player service stopped");
    }

    fn handle(&mut self, message: Message) {
        match message {
            Message::Command { command, reply } => {
                let result = self.execute(command).map(|()| self.manager.snapshot());
                if let Err(e) = &result {
                    self.report(e);
                }
                // Caller may have given up waiting
                let _ = reply.send(result);
            }
            Message::Snapshot(reply) => {
                let _ = reply.send(self.manager.snapshot());
            }
            Message::Queue(reply) => {
                let _ = reply.send(self.manager.get_queue().to_vec());
            }
            Message::Engine(status) => {
                if let Err(e) = self.manager.on_engine_status(status) {
                    self.report(&e);
                }
            }
            Message::Focus(change) => {
                if let Err(e) = self.manager.on_focus_change(change) {
                    self.report(&e);
                }
            }
            Message::Call(call) => {
                if let Err(e) = self.manager.on_call_state(call) {
                    self.report(&e);
                }
            }
            Message::Tick => {
                if let Err(e) = self.manager.tick() {
                    self.report(&e);
                }
            }
            Message::Shutdown => {}
        }
    }

    fn execute(&mut self, command: PlayerCommand) -> cadence_playback::Result<()> {
        debug!(?command, "Executing player command");
        match command {
            PlayerCommand::Load {
                tracks,
                start,
                play: true,
            } => self.manager.play_queue(tracks, start),
            PlayerCommand::Load {
                tracks,
                start,
                play: false,
            } => self.manager.load(tracks, start),
            PlayerCommand::Play => self.manager.play(),
            PlayerCommand::Pause => self.manager.pause(),
            PlayerCommand::TogglePlayback => self.manager.toggle_playback(),
            PlayerCommand::Stop => self.manager.stop(),
            PlayerCommand::Next => self.manager.next(),
            PlayerCommand::Previous => self.manager.previous(),
            PlayerCommand::JumpTo(index) => self.manager.jump_to(index),
            PlayerCommand::Seek(position) => self.manager.seek(position),
            PlayerCommand::SetSpeed(speed) => self.manager.set_speed(speed),
            PlayerCommand::SetShuffle(shuffle) => {
                self.manager.set_shuffle(shuffle);
                Ok(())
            }
            PlayerCommand::ToggleShuffle => {
                self.manager.toggle_shuffle();
                Ok(())
            }
            PlayerCommand::SetRepeat(mode) => {
                self.manager.set_repeat(mode);
                Ok(())
            }
            PlayerCommand::CycleRepeat => {
                self.manager.cycle_repeat();
                Ok(())
            }
            PlayerCommand::Enqueue(track) => self.manager.add_to_queue(track),
            PlayerCommand::EnqueueNext(track) => self.manager.add_next(track),
            PlayerCommand::Move { from, to } => self.manager.move_item(from, to),
            PlayerCommand::Remove(index) => self.manager.remove_from_queue(index).map(|_| ()),
            PlayerCommand::ClearQueue => self.manager.clear_queue(),
        }
    }

    /// Deliver engine status changes queued while handling a message
    fn poll_engine(&mut self) {
        if let Err(e) = self.manager.poll_engine() {
            self.report(&e);
        }
    }

    fn report(&self, error: &PlaybackError) {
        warn!(error = %error, "Player command failed");
        let _ = self.events.send(PlaybackEvent::Error {
            message: error.to_string(),
        });
    }

    /// Fan out queued events and count finished tracks
    fn publish(&mut self) {
        for event in self.manager.drain_events() {
            if let PlaybackEvent::TrackFinished { track_id } = &event {
                self.count_play(*track_id);
            }
            // No subscribers is fine
            let _ = self.events.send(event);
        }
    }

    fn count_play(&self, track_id: TrackId) {
        let tracks = Arc::clone(&self.tracks);
        tokio::spawn(async move {
            if let Err(e) = tracks.increment_play_count(track_id).await {
                warn!(track_id = track_id.get(), error = %e, "Failed to record play");
            }
        });
    }

    fn sync_ticker(&mut self) {
        let playing = self.manager.get_state() == PlaybackState::Playing;
        match (playing, self.ticker.is_some()) {
            (true, false) => {
                let mut ticker =
                    tokio::time::interval_at(Instant::now() + self.tick_period, self.tick_period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                self.ticker = Some(ticker);
                debug!("Position ticker started");
            }
            (false, true) => {
                self.ticker = None;
                debug!("Position ticker stopped");
            }
            _ => {}
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}
