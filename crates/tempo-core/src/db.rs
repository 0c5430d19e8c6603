use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::config::Config;
use crate::error::CoreError;

// Re-export the pool for use in other parts of the core crate
pub use sqlx::SqlitePool as DbPool;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

fn is_in_memory(db_path: &str) -> bool {
    db_path.contains(":memory:") || db_path.contains("mode=memory")
}

/// Establishes a connection pool to the SQLite database and runs migrations.
///
/// # Arguments
///
/// * `db_path` - The path to the SQLite database file, or an in-memory URL
///   such as `sqlite::memory:`.
///
/// # Returns
///
/// A `Result` containing the `SqlitePool` or a `CoreError` if the connection fails
/// or migrations cannot be run.
pub async fn establish_connection(db_path: &str) -> Result<SqlitePool, CoreError> {
    connect(db_path, DEFAULT_MAX_CONNECTIONS, DEFAULT_ACQUIRE_TIMEOUT).await
}

/// Same as [`establish_connection`], with pool settings taken from `config`.
pub async fn establish_connection_with(config: &Config) -> Result<SqlitePool, CoreError> {
    connect(
        &config.database_url,
        config.max_connections,
        Duration::from_secs(config.acquire_timeout_secs),
    )
    .await
}

async fn connect(
    db_path: &str,
    max_connections: u32,
    acquire_timeout: Duration,
) -> Result<SqlitePool, CoreError> {
    let in_memory = is_in_memory(db_path);

    // Create the database directory if it doesn't exist
    if !in_memory {
        let file_path = db_path.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
        if let Some(parent) = Path::new(file_path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
    }

    let options = SqliteConnectOptions::from_str(db_path)?
        .create_if_missing(true)
        .foreign_keys(true);

    // Every connection to an in-memory database sees its own empty database.
    let max_connections = if in_memory { 1 } else { max_connections.max(1) };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .connect_with(options)
        .await?;

    // Run migrations
    sqlx::migrate!("./migrations").run(&pool).await?;

    tracing::debug!(db_path, max_connections, "database ready");
    Ok(pool)
}
