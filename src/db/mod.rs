/// Database layer for the site backend
///
/// Manages the SQLite connection pool and the embedded migrations.
use crate::error::{SiteError, SiteResult};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;

/// Database connection options
#[derive(Debug, Clone)]
pub struct DatabaseOptions {
    pub max_connections: u32,
    pub enable_wal: bool,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            max_connections: 10,
            enable_wal: true,
        }
    }
}

/// Create a SQLite connection pool
pub async fn create_pool(path: &Path, options: DatabaseOptions) -> SiteResult<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(options.max_connections)
        .connect_with(
            SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(if options.enable_wal {
                    SqliteJournalMode::Wal
                } else {
                    SqliteJournalMode::Delete
                })
                .foreign_keys(true)
                .busy_timeout(std::time::Duration::from_secs(5)),
        )
        .await?;

    Ok(pool)
}

/// Create a migrated single-connection in-memory pool
///
/// Every connection to `:memory:` is its own database, so the pool is capped at one.
pub async fn create_memory_pool() -> SiteResult<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run migrations embedded at compile time from ./migrations
pub async fn run_migrations(pool: &SqlitePool) -> SiteResult<()> {
    sqlx::migrate!("./migrations").run(pool).await?;

    Ok(())
}

/// Test database connection
pub async fn test_connection(pool: &SqlitePool) -> SiteResult<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(SiteError::Database)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_create_pool_and_migrate() {
        let dir = tempdir().unwrap();
        let pool = create_pool(&dir.path().join("nested/site.sqlite"), DatabaseOptions::default())
            .await
            .unwrap();

        run_migrations(&pool).await.unwrap();
        test_connection(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn test_memory_pool_has_schema() {
        let pool = create_memory_pool().await.unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM home_settings")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
