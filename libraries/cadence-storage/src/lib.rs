//! Cadence Storage
//!
//! `SQLite` implementation of the Cadence track and playlist stores.
//!
//! # Architecture
//!
//! - **Vertical Slicing**: `tracks` and `playlists` own their queries as free
//!   functions over a `SqlitePool`
//! - **Dense Positions**: every membership change rewrites the affected
//!   contiguous range of positions inside one transaction
//! - **Change Feed**: `LocalStore::subscribe` publishes a `StoreChange` after
//!   each committed write
//!
//! # Example
//!
//! ```rust,no_run
//! use cadence_core::storage::TrackStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = cadence_storage::open("sqlite://cadence.db").await?;
//! let tracks = store.all_tracks().await?;
//! # Ok(())
//! # }
//! ```

mod context;
mod error;
mod time;

// Vertical slices
pub mod playlists;
pub mod tracks;

pub use context::{LocalStore, StoreChange};
pub use error::StorageError;

use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePool;

// Embed migrations into binary
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
///
/// Call once at startup, before handing the pool to a `LocalStore`.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), StorageError> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// Create a new `SQLite` pool
///
/// # Arguments
///
/// * `database_url` - `SQLite` connection string (e.g., `<sqlite://cadence.db>`)
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, StorageError> {
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
    use std::str::FromStr;

    tracing::debug!(database_url, "Creating SQLite pool");

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(30));

    // Each in-memory connection is its own database
    let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    tracing::info!(database_url, "SQLite pool ready");

    Ok(pool)
}

/// Create a pool, run migrations and wrap it in a `LocalStore`
pub async fn open(database_url: &str) -> Result<LocalStore, StorageError> {
    let pool = create_pool(database_url).await?;
    run_migrations(&pool).await?;
    Ok(LocalStore::new(pool))
}
