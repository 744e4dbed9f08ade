//! Connection pool construction and embedded migrations.

use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::info;
use std::path::Path;
use std::sync::Arc;

use crate::errors::StorageError;

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Build an r2d2 pool over the SQLite file at `db_path`. SQLite creates
/// the file on first connect.
pub fn create_pool(db_path: &str) -> Result<Arc<DbPool>, StorageError> {
    let manager = ConnectionManager::<SqliteConnection>::new(db_path);
    let pool = Pool::builder().build(manager)?;
    Ok(Arc::new(pool))
}

pub fn get_connection(pool: &Arc<DbPool>) -> Result<DbConnection, StorageError> {
    pool.get().map_err(StorageError::from)
}

/// Apply any pending embedded migrations.
pub fn run_migrations(conn: &mut SqliteConnection) -> Result<(), StorageError> {
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| StorageError::Migration(e.to_string()))?;

    if !applied.is_empty() {
        info!("Applied {} database migration(s)", applied.len());
    }
    Ok(())
}

/// Create the database file (and its parent directory) if needed, open a
/// pool and bring the schema up to date.
pub fn init(db_path: &str) -> Result<Arc<DbPool>, StorageError> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let pool = create_pool(db_path)?;
    let mut conn = get_connection(&pool)?;
    run_migrations(&mut conn)?;
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::prelude::*;

    #[test]
    fn test_init_creates_file_and_schema() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("rates.db");
        let pool = init(db_path.to_str().unwrap()).unwrap();

        assert!(db_path.exists());

        // Re-running migrations on an up-to-date database is a no-op.
        let mut conn = get_connection(&pool).unwrap();
        run_migrations(&mut conn).unwrap();

        let count: i64 = crate::schema::rate_snapshots::table
            .count()
            .get_result(&mut conn)
            .unwrap();
        assert_eq!(count, 0);
    }
}
