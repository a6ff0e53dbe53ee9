//! Cadence Core
//!
//! Platform-agnostic domain types, error handling and store contracts shared
//! by every Cadence crate.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, `Playlist`, `PlaylistItem`, `SmartType`, track queries
//! - **Store Contracts**: `TrackStore` and `PlaylistStore` (async, object safe)
//! - **Error Handling**: Unified `CadenceError` and `Result` types
//!
//! Nothing here performs I/O. Concrete stores live in `cadence-storage`.
//!
//! # Example
//!
//! ```rust
//! use cadence_core::types::{MediaLocator, NewTrack, SmartType};
//!
//! let track = NewTrack::new("Intro", MediaLocator::local("/music/intro.flac"))
//!     .with_artist("Someone")
//!     .with_duration_ms(93_000);
//! assert_eq!(track.duration_ms, 93_000);
//!
//! assert_eq!(SmartType::from_str("most_played"), Some(SmartType::MostPlayed));
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use error::{CadenceError, Result};
pub use storage::{PlaylistStore, TrackStore};

pub use types::{
    CreatePlaylist, MediaLocator, NewTrack, Playlist, PlaylistId, PlaylistItem, PlaylistKind,
    PlaylistStats, PlaylistTotals, SmartRule, SmartType, Track, TrackFilter, TrackId, TrackQuery,
    TrackSort, TrackUpdate,
};
