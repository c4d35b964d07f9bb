//! Startup sequencing: bring the store up before serving traffic.
//!
//! `Unready -> Probing -> Ready`, or `Unready -> Probing -> Failed` once the
//! retry budget is spent. `Failed` is terminal but not fatal: the server still
//! starts and store calls report errors at request time.

use crate::db;
use serde::Serialize;
use sqlx::SqlitePool;
use std::{sync::Arc, time::Duration};
use tokio::sync::watch;

const DEFAULT_MAX_ATTEMPTS: u32 = 10;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StartupState {
    Unready,
    Probing,
    Ready,
    Failed,
}

/// Bounded retry with a fixed delay between attempts.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

pub struct StartupSequencer {
    db: Arc<SqlitePool>,
    policy: RetryPolicy,
    state: watch::Sender<StartupState>,
}

impl StartupSequencer {
    pub fn new(db: Arc<SqlitePool>, policy: RetryPolicy) -> Self {
        let (state, _) = watch::channel(StartupState::Unready);
        Self { db, policy, state }
    }

    /// Receiver that observes state transitions, e.g. for `/readyz`.
    pub fn subscribe(&self) -> watch::Receiver<StartupState> {
        self.state.subscribe()
    }

    /// Probe the store and apply the schema, retrying per the policy.
    ///
    /// Returns the terminal state (`Ready` or `Failed`).
    pub async fn run(&self) -> StartupState {
        self.state.send_replace(StartupState::Probing);
        let max = self.policy.max_attempts;

        for attempt in 1..=max {
            match self.attempt().await {
                Ok(()) => {
                    tracing::info!(attempt, "database initialized");
                    self.state.send_replace(StartupState::Ready);
                    return StartupState::Ready;
                }
                Err(err) if attempt < max => {
                    tracing::warn!(
                        "Database connection attempt {}/{} failed: {}",
                        attempt,
                        max,
                        err
                    );
                    tokio::time::sleep(self.policy.delay).await;
                }
                Err(err) => {
                    tracing::error!(
                        "Database initialization failed after {} attempts: {}. Serving anyway; store calls will fail until it recovers.",
                        max,
                        err
                    );
                }
            }
        }

        self.state.send_replace(StartupState::Failed);
        StartupState::Failed
    }

    async fn attempt(&self) -> Result<(), sqlx::Error> {
        db::ping(&self.db).await?;
        db::apply_schema(&self.db).await
    }
}
