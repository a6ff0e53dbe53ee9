//! Cadence - Smart Playlists
//!
//! Regenerates smart playlists from their rules and moves tracks across the
//! queue / playlist boundary.
//!
//! This crate provides:
//! - [`Materializer`]: deterministic recomputation of Favorites, Recent,
//!   MostPlayed and Custom playlists, persisted atomically with retries
//! - [`CustomRule`] with the JSON [`CriteriaRule`] as the default evaluator
//! - [`ensure_default_playlists`] for first start
//! - [`playlist_snapshot`] and [`save_queue_as_playlist`]
//!
//! Stores are reached only through the `cadence-core` traits, so any
//! `TrackStore` / `PlaylistStore` pair works.

pub mod defaults;
pub mod materializer;
pub mod rules;
pub mod snapshot;

// Public exports
pub use defaults::{ensure_default_playlists, DEFAULT_SMART_PLAYLISTS};
pub use materializer::{
    Materializer, MaterializerConfig, RefreshOutcome, RefreshReport, DEFAULT_SMART_LIMIT,
};
pub use rules::{Criteria, CriteriaRule, CustomRule};
pub use snapshot::{playlist_snapshot, save_queue_as_playlist};
