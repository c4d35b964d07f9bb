//! MovieService: CRUD operations over the `movies` table. Every operation
//! touches exactly one record and runs as a single statement or a single
//! transaction.

use crate::models::movie::{Movie, MovieCreate, MovieUpdate};
use sqlx::{Executor, SqlitePool, sqlite::Sqlite};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum MovieError {
    #[error("movie `{0}` not found")]
    NotFound(i64),
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[source] sqlx::Error),
    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for MovieError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            err @ (sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)) => MovieError::StoreUnavailable(err),
            other => MovieError::Sqlx(other),
        }
    }
}

pub type MovieResult<T> = Result<T, MovieError>;

/// MovieService provides the record operations:
/// - List movies in insertion order with skip/limit paging
/// - Get a single movie by id
/// - Create a movie (id and `created_at` assigned by the store)
/// - Partially update a movie (`updated_at` refreshed by the store)
/// - Hard-delete a movie
///
/// Input is expected to be validated already; see `ValidatedJson`.
#[derive(Clone)]
pub struct MovieService {
    /// Shared SQLite connection pool. Each call checks out its own
    /// connection and returns it when the call finishes.
    pub db: Arc<SqlitePool>,
}

impl MovieService {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// Fetch one row by primary key on any executor (pool or transaction).
    ///
    /// Returns NotFound if no row matches.
    async fn fetch_movie<'e, E>(executor: E, id: i64) -> MovieResult<Movie>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Movie>(
            "SELECT id, title, director, year, genre, rating, description, created_at, updated_at
             FROM movies WHERE id = ?",
        )
        .bind(id)
        .fetch_one(executor)
        .await
        .map_err(|err| match err {
            sqlx::Error::RowNotFound => MovieError::NotFound(id),
            other => other.into(),
        })
    }

    /// List movies ordered by id, skipping `skip` rows and returning at most
    /// `limit`. No upper bound is applied here.
    pub async fn list(&self, skip: u32, limit: u32) -> MovieResult<Vec<Movie>> {
        let movies = sqlx::query_as::<_, Movie>(
            "SELECT id, title, director, year, genre, rating, description, created_at, updated_at
             FROM movies
             ORDER BY id ASC
             LIMIT ? OFFSET ?",
        )
        .bind(i64::from(limit))
        .bind(i64::from(skip))
        .fetch_all(&*self.db)
        .await?;

        debug!(skip, limit, returned = movies.len(), "listed movies");
        Ok(movies)
    }

    pub async fn get(&self, id: i64) -> MovieResult<Movie> {
        Self::fetch_movie(&*self.db, id).await
    }

    /// Insert a new movie and return the stored row, including the generated
    /// id and `created_at`.
    pub async fn create(&self, movie: MovieCreate) -> MovieResult<Movie> {
        let created = sqlx::query_as::<_, Movie>(
            r#"
            INSERT INTO movies (title, director, year, genre, rating, description)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, title, director, year, genre, rating, description,
                      created_at, updated_at
            "#,
        )
        .bind(&movie.title)
        .bind(&movie.director)
        .bind(movie.year)
        .bind(&movie.genre)
        .bind(movie.rating)
        .bind(&movie.description)
        .fetch_one(&*self.db)
        .await?;

        info!(id = created.id, title = %created.title, "created movie");
        Ok(created)
    }

    /// Apply a partial update to an existing movie.
    ///
    /// - Reads the current row inside a transaction
    /// - Merges the fields present in `changes`
    /// - Writes the merged row and refreshes `updated_at`
    ///
    /// The transaction is opened with `BEGIN IMMEDIATE` so the write lock is
    /// held before the read; concurrent updates then queue on SQLite's busy
    /// timeout instead of failing on a lock upgrade.
    ///
    /// Returns NotFound without writing anything if the id does not exist;
    /// the transaction is rolled back when dropped.
    pub async fn update(&self, id: i64, changes: MovieUpdate) -> MovieResult<Movie> {
        let mut tx = self.db.begin_with("BEGIN IMMEDIATE").await?;
        let existing = Self::fetch_movie(&mut *tx, id).await?;

        debug!(id, fields = ?changes.present_fields(), "applying movie update");
        let merged = changes.merge_into(existing);

        let updated = sqlx::query_as::<_, Movie>(
            r#"
            UPDATE movies SET
                title = ?,
                director = ?,
                year = ?,
                genre = ?,
                rating = ?,
                description = ?,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
            WHERE id = ?
            RETURNING id, title, director, year, genre, rating, description,
                      created_at, updated_at
            "#,
        )
        .bind(&merged.title)
        .bind(&merged.director)
        .bind(merged.year)
        .bind(&merged.genre)
        .bind(merged.rating)
        .bind(&merged.description)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(id, "updated movie");
        Ok(updated)
    }

    /// Hard-delete a movie.
    ///
    /// Repeated calls return NotFound once the row is gone.
    pub async fn delete(&self, id: i64) -> MovieResult<()> {
        let result = sqlx::query("DELETE FROM movies WHERE id = ?")
            .bind(id)
            .execute(&*self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(MovieError::NotFound(id));
        }

        info!(id, "deleted movie");
        Ok(())
    }
}
