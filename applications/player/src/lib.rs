//! Cadence Player Library
//!
//! Headless composition of the Cadence libraries: configuration, a simulated
//! clock engine, the serialized player service and the smart playlist
//! refresh scheduler.
//!
//! This library exposes the core components for the binary and for testing.

pub mod config;
pub mod engine;
pub mod error;
pub mod scheduler;
pub mod service;

// Re-export commonly used types for convenience
pub use config::PlayerConfig;
pub use engine::ClockEngine;
pub use error::{PlayerError, Result};
pub use scheduler::{RefreshScheduler, SchedulerHandle};
pub use service::{PlayerCommand, PlayerHandle, PlayerService};
