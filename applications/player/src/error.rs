/// Player error types
use cadence_core::CadenceError;
use cadence_playback::PlaybackError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlayerError>;

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] CadenceError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),

    #[error("Player service is not running")]
    ChannelClosed,
}

impl From<cadence_storage::StorageError> for PlayerError {
    fn from(err: cadence_storage::StorageError) -> Self {
        // StorageError -> CadenceError -> PlayerError
        PlayerError::Core(err.into())
    }
}

impl From<config::ConfigError> for PlayerError {
    fn from(err: config::ConfigError) -> Self {
        PlayerError::Config(err.to_string())
    }
}
