//! Error types for playback management

use cadence_core::CadenceError;
use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Bad argument (empty load, start index past the end, speed out of range)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Queue index out of bounds
    #[error("Index {index} out of range for queue of {len}")]
    OutOfRange { index: usize, len: usize },

    /// No track is currently selected
    #[error("No track loaded")]
    NoTrackLoaded,

    /// Playback resource could not be acquired
    #[error("Playback resource denied")]
    ResourceDenied,

    /// Playback engine rejected a command
    #[error("Engine error: {0}")]
    Engine(String),
}

impl PlaybackError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn engine(msg: impl Into<String>) -> Self {
        Self::Engine(msg.into())
    }
}

impl From<PlaybackError> for CadenceError {
    fn from(err: PlaybackError) -> Self {
        match err {
            PlaybackError::InvalidArgument(msg) => CadenceError::InvalidArgument(msg),
            PlaybackError::OutOfRange { index, len } => CadenceError::OutOfRange { index, len },
            PlaybackError::ResourceDenied => CadenceError::ResourceDenied,
            PlaybackError::NoTrackLoaded => CadenceError::invalid_argument("no track loaded"),
            PlaybackError::Engine(msg) => CadenceError::PlaybackFailure(msg),
        }
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
