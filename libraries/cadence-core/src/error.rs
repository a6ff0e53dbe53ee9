/// Core error types for Cadence
use thiserror::Error;

/// Result type alias using `CadenceError`
pub type Result<T> = std::result::Result<T, CadenceError>;

/// Core error type for Cadence
///
/// Every library surfaces failures through this taxonomy. Store
/// implementations wrap their backend errors in `StoreFailure` so callers
/// never depend on a particular database crate.
#[derive(Error, Debug)]
pub enum CadenceError {
    /// Bad argument (empty queue on load, bad start index, malformed criteria)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Position outside `[0, len)`
    #[error("Index {index} out of range for length {len}")]
    OutOfRange { index: usize, len: usize },

    /// Entity not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Exclusive playback resource could not be acquired
    #[error("Playback resource denied")]
    ResourceDenied,

    /// Playback engine failure
    #[error("Playback failure: {0}")]
    PlaybackFailure(String),

    /// Underlying persistence failure
    #[error("Store failure: {0}")]
    StoreFailure(String),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl CadenceError {
    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Create a store failure
    pub fn store(msg: impl Into<String>) -> Self {
        Self::StoreFailure(msg.into())
    }

    /// Whether this error is a lookup miss
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(feature = "sqlx-support")]
impl From<sqlx::Error> for CadenceError {
    fn from(err: sqlx::Error) -> Self {
        Self::StoreFailure(err.to_string())
    }
}
