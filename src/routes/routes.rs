//! Defines routes for the movie API, the browser client and probes.
//!
//! ## Structure
//! - **Movie API**
//!   - `GET    /api/movies`       list movies (`skip`, `limit`)
//!   - `POST   /api/movies`       create movie
//!   - `GET    /api/movies/{id}`  fetch one movie
//!   - `PUT    /api/movies/{id}`  partial update
//!   - `DELETE /api/movies/{id}`  hard delete
//!
//! - **Client**
//!   - `GET /`          index page
//!   - `GET /static/*`  assets from the configured static directory
//!
//! - **Probes**: `GET /healthz`, `GET /readyz`

use crate::{
    handlers::{
        health_handlers::{healthz, readyz},
        movie_handlers::{create_movie, delete_movie, get_movie, list_movies, update_movie},
        page_handlers::index,
    },
    state::AppState,
};
use axum::{Router, routing::get};
use std::path::Path;
use tower_http::{services::ServeDir, trace::TraceLayer};

/// Build and return the router for all routes.
///
/// The router carries shared state (`AppState`) to all handlers.
pub fn routes(static_dir: impl AsRef<Path>) -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Movie API
        .route("/api/movies", get(list_movies).post(create_movie))
        .route(
            "/api/movies/{id}",
            get(get_movie).put(update_movie).delete(delete_movie),
        )
        .nest_service("/static", ServeDir::new(static_dir.as_ref()))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db,
        handlers::movie_handlers::DeleteResponse,
        models::movie::Movie,
        services::movie_service::MovieService,
        startup::StartupState,
    };
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
        response::Response,
    };
    use serde_json::{Value, json};
    use sqlx::SqlitePool;
    use std::sync::Arc;
    use tokio::sync::watch;
    use tower::ServiceExt;

    fn app_with_pool(pool: SqlitePool, startup: StartupState) -> Router {
        let (_tx, rx) = watch::channel(startup);
        let state = AppState {
            movies: MovieService::new(Arc::new(pool)),
            startup: rx,
        };
        routes(concat!(env!("CARGO_MANIFEST_DIR"), "/static")).with_state(state)
    }

    async fn app_with_state(startup: StartupState) -> Router {
        app_with_pool(db::memory_pool().await, startup)
    }

    async fn app() -> Router {
        app_with_state(StartupState::Ready).await
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        app.clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap()
    }

    async fn send_raw(app: &Router, content_type: Option<&str>, body: &'static str) -> Response {
        let mut builder = Request::builder().method("POST").uri("/api/movies");
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        app.clone()
            .oneshot(builder.body(Body::from(body)).unwrap())
            .await
            .unwrap()
    }

    async fn read_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn assert_error_body(body: &Value, status: StatusCode) {
        assert_eq!(body["status"], status.as_u16());
        assert!(body["error"].is_string(), "no error message in {body}");
    }

    #[tokio::test]
    async fn matrix_lifecycle() {
        let app = app().await;

        let response = send(
            &app,
            "POST",
            "/api/movies",
            Some(json!({ "title": "Matrix", "year": 1999, "rating": 8.7 })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let created: Movie = serde_json::from_value(read_json(response).await).unwrap();
        assert_eq!(created.id, 1);
        assert_eq!(created.title, "Matrix");
        assert!(created.updated_at.is_none());

        let response = send(&app, "GET", "/api/movies/1", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let fetched: Movie = serde_json::from_value(read_json(response).await).unwrap();
        assert_eq!(fetched, created);

        let response = send(&app, "PUT", "/api/movies/1", Some(json!({ "rating": 9.0 }))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let updated: Movie = serde_json::from_value(read_json(response).await).unwrap();
        assert_eq!(updated.rating, Some(9.0));
        assert_eq!(updated.year, Some(1999));
        assert_eq!(updated.title, "Matrix");
        assert!(updated.updated_at.is_some());

        let response = send(&app, "DELETE", "/api/movies/1", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let deleted: DeleteResponse = serde_json::from_value(read_json(response).await).unwrap();
        assert_eq!(deleted.message, "Movie deleted successfully");

        let response = send(&app, "GET", "/api/movies/1", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(read_json(response).await["error"], "Movie not found");
    }

    #[tokio::test]
    async fn response_body_matches_output_shape() {
        let app = app().await;
        let response = send(
            &app,
            "POST",
            "/api/movies",
            Some(json!({
                "title": "Dune",
                "director": "Villeneuve",
                "year": 2021,
                "genre": "Sci-Fi",
                "rating": 8.5,
                "description": "..."
            })),
        )
        .await;
        let body = read_json(response).await;

        for key in [
            "id",
            "title",
            "director",
            "year",
            "genre",
            "rating",
            "description",
            "created_at",
            "updated_at",
        ] {
            assert!(body.get(key).is_some(), "missing `{key}`");
        }
        assert!(body["created_at"].is_string());
        assert!(body["updated_at"].is_null());
    }

    #[tokio::test]
    async fn invalid_create_is_422_and_never_stored() {
        let app = app().await;

        for body in [
            json!({ "year": 1999 }),
            json!({ "title": "" }),
            json!({ "title": "Old", "year": 1800 }),
            json!({ "title": "Loud", "rating": 11.0 }),
            json!({ "title": "Typed", "year": "nineteen" }),
        ] {
            let response = send(&app, "POST", "/api/movies", Some(body.clone())).await;
            assert_eq!(
                response.status(),
                StatusCode::UNPROCESSABLE_ENTITY,
                "body {body}"
            );
        }

        let response = send(&app, "GET", "/api/movies", None).await;
        assert_eq!(read_json(response).await, json!([]));
    }

    #[tokio::test]
    async fn validation_failure_reports_fields() {
        let app = app().await;
        let response = send(
            &app,
            "POST",
            "/api/movies",
            Some(json!({ "title": "Old", "year": 1800 })),
        )
        .await;
        let body = read_json(response).await;
        assert_eq!(body["status"], 422);
        assert!(body["details"]["year"].is_array());
    }

    #[tokio::test]
    async fn update_validates_and_reports_missing() {
        let app = app().await;
        send(&app, "POST", "/api/movies", Some(json!({ "title": "Heat" }))).await;

        let response = send(&app, "PUT", "/api/movies/1", Some(json!({ "rating": 10.5 }))).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let response = send(&app, "PUT", "/api/movies/1", Some(json!({ "title": null }))).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let response = send(&app, "PUT", "/api/movies/42", Some(json!({ "rating": 5.0 }))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(&app, "GET", "/api/movies/1", None).await;
        let movie: Movie = serde_json::from_value(read_json(response).await).unwrap();
        assert_eq!(movie.title, "Heat");
        assert_eq!(movie.rating, None);
        assert!(movie.updated_at.is_none());
    }

    #[tokio::test]
    async fn explicit_null_clears_optional_field() {
        let app = app().await;
        send(
            &app,
            "POST",
            "/api/movies",
            Some(json!({ "title": "Heat", "director": "Mann", "year": 1995 })),
        )
        .await;

        let response = send(&app, "PUT", "/api/movies/1", Some(json!({ "director": null }))).await;
        let body = read_json(response).await;
        assert!(body["director"].is_null());
        assert_eq!(body["year"], 1995);
    }

    #[tokio::test]
    async fn malformed_bodies_get_json_errors() {
        let app = app().await;

        let response = send_raw(&app, Some("application/json"), r#"{"title":"#).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_error_body(&read_json(response).await, StatusCode::BAD_REQUEST);

        let response = send_raw(&app, None, r#"{"title":"Heat"}"#).await;
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_error_body(&read_json(response).await, StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let response = send(&app, "GET", "/api/movies", None).await;
        assert_eq!(read_json(response).await, json!([]));
    }

    #[tokio::test]
    async fn non_integer_id_is_422_json() {
        let app = app().await;
        for (method, body) in [
            ("GET", None),
            ("PUT", Some(json!({ "rating": 5.0 }))),
            ("DELETE", None),
        ] {
            let response = send(&app, method, "/api/movies/abc", body).await;
            assert_eq!(
                response.status(),
                StatusCode::UNPROCESSABLE_ENTITY,
                "{method} /api/movies/abc"
            );
            assert_error_body(&read_json(response).await, StatusCode::UNPROCESSABLE_ENTITY);
        }
    }

    #[tokio::test]
    async fn delete_missing_is_404() {
        let app = app().await;
        let response = send(&app, "DELETE", "/api/movies/5", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_paginates_with_defaults() {
        let app = app().await;
        for i in 0..3 {
            send(
                &app,
                "POST",
                "/api/movies",
                Some(json!({ "title": format!("Movie {i}") })),
            )
            .await;
        }

        let all = read_json(send(&app, "GET", "/api/movies", None).await).await;
        assert_eq!(all.as_array().unwrap().len(), 3);
        assert_eq!(all[0]["title"], "Movie 0");

        let page = read_json(send(&app, "GET", "/api/movies?skip=1&limit=1", None).await).await;
        assert_eq!(page.as_array().unwrap().len(), 1);
        assert_eq!(page[0]["title"], "Movie 1");

        let response = send(&app, "GET", "/api/movies?limit=-1", None).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn list_limit_is_capped_at_1000() {
        let pool = db::memory_pool().await;
        sqlx::query(
            "WITH RECURSIVE seq(n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM seq WHERE n < 1005) \
             INSERT INTO movies (title) SELECT 'Movie ' || n FROM seq",
        )
        .execute(&pool)
        .await
        .unwrap();
        let app = app_with_pool(pool, StartupState::Ready);

        let page = read_json(send(&app, "GET", "/api/movies?limit=5000", None).await).await;
        let page = page.as_array().unwrap();
        assert_eq!(page.len(), 1000);
        assert_eq!(page[999]["title"], "Movie 1000");

        let tail = read_json(send(&app, "GET", "/api/movies?skip=1000&limit=5000", None).await).await;
        assert_eq!(tail.as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn index_page_is_html() {
        let app = app().await;
        let response = send(&app, "GET", "/", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("text/html"));
    }

    #[tokio::test]
    async fn static_assets_are_served() {
        let app = app().await;
        let response = send(&app, "GET", "/static/script.js", None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(&app, "GET", "/static/missing.js", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn health_endpoints_follow_startup_state() {
        let app = app().await;
        assert_eq!(
            send(&app, "GET", "/healthz", None).await.status(),
            StatusCode::OK
        );
        let response = send(&app, "GET", "/readyz", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await["startup"], "ready");

        let failed = app_with_state(StartupState::Failed).await;
        let response = send(&failed, "GET", "/readyz", None).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(read_json(response).await["checks"]["startup"]["ok"], false);
    }
}
