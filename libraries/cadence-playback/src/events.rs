//! Playback Events
//!
//! Event-based communication for observers. The manager queues events while
//! it handles a command; its owner drains and fans them out. Delivery is
//! at-least-once, so consumers must be idempotent.

use crate::types::PlaybackSnapshot;
use cadence_core::TrackId;
use serde::{Deserialize, Serialize};

/// Why playback was paused from outside
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterruptReason {
    FocusLost,
    PhoneCall,
}

/// Events emitted by the playback system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlaybackEvent {
    /// Full player state after a transition
    Update(PlaybackSnapshot),

    /// Cursor moved to another track
    TrackChanged {
        /// Queue index of the new track
        index: usize,
        /// ID of the new (current) track
        track_id: TrackId,
    },

    /// Current track was sought (restart, repeat-one, user seek)
    SeekIssued { position_ms: u64 },

    /// Track finished playing naturally (reached end)
    TrackFinished { track_id: TrackId },

    /// Position update (periodic, while playing)
    PositionUpdate { position_ms: u64, duration_ms: u64 },

    /// Queue changed (tracks added/removed/reordered)
    QueueChanged { length: usize },

    /// Playback was paused by a focus loss or a call
    Interrupted { reason: InterruptReason },

    /// Error occurred while handling a command
    Error { message: String },
}

impl PlaybackEvent {
    pub fn snapshot(&self) -> Option<&PlaybackSnapshot> {
        match self {
            Self::Update(snapshot) => Some(snapshot),
            _ => None,
        }
    }
}
