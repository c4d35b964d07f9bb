//! SQLite pool construction and schema setup.

use anyhow::{Context, Result};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::{path::Path, str::FromStr, time::Duration};

const SCHEMA: &str = include_str!("../migrations/0001_init.sql");

const MAX_CONNECTIONS: u32 = 5;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_LIFETIME: Duration = Duration::from_secs(300);

/// Build a pool for `database_url` without opening any connection yet.
///
/// Connections are opened on first use, so an unreachable store surfaces at
/// startup probing or request time instead of aborting here. Only a
/// malformed URL is an error.
pub fn connect_lazy(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("parsing database url `{}`", database_url))?
        .create_if_missing(true);

    if let Some(path) = sqlite_file_path(database_url) {
        ensure_parent_dir(Path::new(path))?;
    }

    Ok(SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .max_lifetime(MAX_LIFETIME)
        .test_before_acquire(true)
        .connect_lazy_with(options))
}

/// Extract the local file path SQLx will use, or `None` for in-memory URLs.
fn sqlite_file_path(database_url: &str) -> Option<&str> {
    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .trim_start_matches("file:");
    let path = path.split('?').next().unwrap_or(path);

    if path.is_empty() || path == ":memory:" || database_url.contains("mode=memory") {
        None
    } else {
        Some(path)
    }
}

/// Create the parent directory of a SQLite database file if needed.
fn ensure_parent_dir(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating database directory {:?}", parent))?;
            tracing::info!("Created missing directory {:?}", parent);
        }
    }
    Ok(())
}

/// Cheap connectivity check.
pub async fn ping(db: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(db).await?;
    Ok(())
}

/// Create the `movies` table and its index if they do not exist yet.
pub async fn apply_schema(db: &SqlitePool) -> Result<(), sqlx::Error> {
    let statements = SCHEMA
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>();

    tracing::debug!("Running {} schema statements...", statements.len());

    for stmt in statements {
        tracing::trace!("Executing schema SQL: {}", stmt);
        sqlx::query(stmt).execute(db).await?;
    }

    Ok(())
}

/// Single-connection in-memory pool with the schema applied.
///
/// The pool never recycles its connection, since that would drop the
/// database with it.
#[cfg(test)]
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("open in-memory sqlite");
    apply_schema(&pool).await.expect("apply schema");
    pool
}
