use crate::{services::movie_service::MovieService, startup::StartupState};
use tokio::sync::watch;

/// Shared router state. Cloned per request; holds no mutable data of its own.
#[derive(Clone)]
pub struct AppState {
    pub movies: MovieService,
    /// Published by the startup sequencer, read by `/readyz`.
    pub startup: watch::Receiver<StartupState>,
}
