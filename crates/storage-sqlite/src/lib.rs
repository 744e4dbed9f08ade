//! SQLite persistence for the Subtally rates engine.
//!
//! Implements the engine's [`RateStore`](subtally_rates::RateStore)
//! contract over Diesel with an r2d2 connection pool and embedded
//! migrations. One row per (`date`, `base_currency`, `provider`); the
//! rate mapping is stored as JSON text with decimal-string values.

pub mod db;
pub mod errors;
pub mod schema;
pub mod snapshots;

pub use db::{create_pool, get_connection, init, run_migrations, DbConnection, DbPool};
pub use errors::StorageError;
pub use snapshots::SqliteRateStore;
