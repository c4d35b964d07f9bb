//! HTTP handlers for the movie API under `/api/movies`.
//! Bodies are validated by `ValidatedJson`; record logic lives in
//! `MovieService`.

use crate::{
    errors::AppError,
    handlers::extract::ValidatedJson,
    models::movie::{Movie, MovieCreate, MovieUpdate},
    state::AppState,
};
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
};
use serde::{Deserialize, Serialize};

const DEFAULT_LIMIT: u32 = 100;
/// Largest page the API hands out, whatever `limit` asks for.
const MAX_LIMIT: u32 = 1000;

/// Query params accepted by `GET /api/movies`.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
}

/// GET `/api/movies`: list movies, supports ?skip=&limit=
pub async fn list_movies(
    State(state): State<AppState>,
    query: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<Movie>>, AppError> {
    let Query(params) = query?;
    let limit = params.limit.min(MAX_LIMIT);
    let movies = state.movies.list(params.skip, limit).await?;
    Ok(Json(movies))
}

/// GET `/api/movies/{id}`
pub async fn get_movie(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Movie>, AppError> {
    let Path(id) = path?;
    Ok(Json(state.movies.get(id).await?))
}

/// POST `/api/movies`: create a movie from a validated body.
pub async fn create_movie(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<MovieCreate>,
) -> Result<Json<Movie>, AppError> {
    Ok(Json(state.movies.create(payload).await?))
}

/// PUT `/api/movies/{id}`: partial update; absent keys are left unchanged.
pub async fn update_movie(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    ValidatedJson(changes): ValidatedJson<MovieUpdate>,
) -> Result<Json<Movie>, AppError> {
    let Path(id) = path?;
    Ok(Json(state.movies.update(id, changes).await?))
}

/// DELETE `/api/movies/{id}`: hard delete.
pub async fn delete_movie(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<DeleteResponse>, AppError> {
    let Path(id) = path?;
    state.movies.delete(id).await?;
    Ok(Json(DeleteResponse {
        message: "Movie deleted successfully".into(),
    }))
}
