/// Storage setup errors
use thiserror::Error;

/// Failures while opening or migrating a database
///
/// Query failures inside the stores surface as `CadenceError::StoreFailure`.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Database connection error
    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<StorageError> for cadence_core::CadenceError {
    fn from(err: StorageError) -> Self {
        cadence_core::CadenceError::store(err.to_string())
    }
}
