//! # Context
//!
//! State shared by all reconciliations of the controller loop.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tracing::warn;

use crate::config::ControllerConfig;
use crate::controller::backoff::BackoffState;
use crate::controller::reconciler::{Reconciler, SecretRef};

/// Fallback delay used if the backoff table is unavailable
const FALLBACK_BACKOFF: Duration = Duration::from_secs(60);

#[derive(Debug)]
pub struct Context {
    pub reconciler: Reconciler,
    pub config: ControllerConfig,
    backoff_states: Mutex<HashMap<SecretRef, BackoffState>>,
}

impl Context {
    #[must_use]
    pub fn new(reconciler: Reconciler, config: ControllerConfig) -> Self {
        Self {
            reconciler,
            config,
            backoff_states: Mutex::new(HashMap::new()),
        }
    }

    /// Failures older than this cannot belong to a pending requeue
    fn stale_after(&self) -> Duration {
        Duration::from_secs(self.config.backoff_max_secs.saturating_mul(2))
    }

    /// Record a failure of `secret` and return the delay before its retry
    /// together with the number of consecutive failures
    ///
    /// Secrets that stopped failing without a successful reconciliation (for
    /// example because they no longer match the label selector) are dropped
    /// once their last failure is older than twice the maximum backoff.
    pub fn next_backoff(&self, secret: &SecretRef) -> (Duration, u32) {
        let stale_after = self.stale_after();
        match self.backoff_states.lock() {
            Ok(mut states) => {
                states.retain(|_, state| state.failed_within(stale_after));
                let state = states.entry(secret.clone()).or_insert_with(|| {
                    BackoffState::new(self.config.backoff_min_secs, self.config.backoff_max_secs)
                });
                state.increment_error();
                (state.backoff.next_backoff(), state.error_count)
            }
            Err(e) => {
                warn!("Failed to lock backoff_states: {}, using default backoff", e);
                (FALLBACK_BACKOFF, 0)
            }
        }
    }

    /// Forget the failures of `secret` after a successful reconciliation
    pub fn reset_backoff(&self, secret: &SecretRef) {
        let stale_after = self.stale_after();
        match self.backoff_states.lock() {
            Ok(mut states) => {
                states.remove(secret);
                states.retain(|_, state| state.failed_within(stale_after));
            }
            Err(e) => warn!("Failed to lock backoff_states: {}, backoff not reset", e),
        }
    }
}

#[cfg(test)]
impl Context {
    fn tracked_secrets(&self) -> usize {
        self.backoff_states.lock().map(|states| states.len()).unwrap_or(0)
    }
}
