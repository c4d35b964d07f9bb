use anyhow::Result;
use axum::Router;
use std::{io::ErrorKind, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod config;
mod db;
mod errors;
mod handlers;
mod models;
mod routes;
mod services;
mod startup;
mod state;

use startup::{RetryPolicy, StartupSequencer, StartupState};

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .init();

    // --- Parse config + migrate flag ---
    let (cfg, migrate) = config::AppConfig::from_env_and_args()?;

    tracing::info!("Starting movie-service with config: {:?}", cfg);

    // --- SQLite pool (connections open lazily) ---
    let db = Arc::new(db::connect_lazy(&cfg.database_url)?);

    // --- Handle migration mode ---
    if migrate {
        db::apply_schema(&db).await?;
        tracing::info!("Database schema created.");
        return Ok(()); // exit after migration
    }

    // --- Bring the store up before accepting traffic ---
    let sequencer = StartupSequencer::new(db.clone(), RetryPolicy::default());
    let startup = sequencer.subscribe();
    tracing::info!("Initializing database...");
    if sequencer.run().await == StartupState::Failed {
        tracing::warn!("Continuing without a ready database");
    }

    // --- Build router ---
    let state = state::AppState {
        movies: services::movie_service::MovieService::new(db.clone()),
        startup,
    };
    let app: Router = routes::routes::routes(&cfg.static_dir).with_state(state);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    tracing::info!("Shutting down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
}
