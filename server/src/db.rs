//! Database pool construction and migrations.
//!
//! The pool is created once at startup and shared through application state;
//! embedded migrations bring the schema up to date before the server starts
//! accepting requests. sqlx's SQLite driver enables foreign-key enforcement
//! by default, which is what surfaces dangling `event_id` references as
//! constraint violations.

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

/// Maximum connections held by the pool.
const MAX_CONNECTIONS: u32 = 5;

/// Opens a connection pool for the given SQLite URL and applies migrations.
///
/// # Errors
///
/// Returns `sqlx::Error` if the database cannot be opened or a migration
/// fails to apply.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect(database_url)
        .await?;

    sqlx::migrate!().run(&pool).await?;

    Ok(pool)
}

/// Opens a migrated in-memory database.
///
/// Useful for tests. Limited to a single connection because every new
/// `:memory:` connection is a separate, empty database.
///
/// # Errors
///
/// Returns `sqlx::Error` if the pool cannot be created or a migration fails.
pub async fn create_memory_pool() -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    sqlx::migrate!().run(&pool).await?;

    Ok(pool)
}
