// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Retry of single writes that lose an optimistic-concurrency race.
//!
//! Only [`StoreError::Conflict`] is retried here, and only for the one write that
//! hit it: the operation is expected to re-read the object before writing again.
//! Every other failure is returned immediately; retrying a whole reconciliation
//! is the dispatcher's job.

use rand::Rng;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::errors::StoreError;

/// First delay after a conflicting write
const FIRST_DELAY: Duration = Duration::from_millis(50);

/// Upper bound of the delay between attempts
const MAX_DELAY: Duration = Duration::from_secs(1);

/// Jitter applied to each delay (fraction of the delay, both directions)
const JITTER: f64 = 0.1;

/// Doubling delay between attempts of a conflicting write, with jitter.
///
/// ```text
/// 50ms, 100ms, 200ms, 400ms, 800ms, 1s, 1s, ...
/// ```
#[derive(Clone, Debug)]
pub struct ConflictBackoff {
    next: Duration,
}

impl Default for ConflictBackoff {
    fn default() -> Self {
        Self { next: FIRST_DELAY }
    }
}

impl ConflictBackoff {
    /// Delay before the next attempt. Advances the schedule.
    pub fn next_delay(&mut self) -> Duration {
        let base = self.next;
        self.next = (base * 2).min(MAX_DELAY);

        let secs = base.as_secs_f64();
        let spread = secs * JITTER;
        Duration::from_secs_f64(rand::rng().random_range((secs - spread)..=(secs + spread)))
    }

    /// Delay, before jitter, of the next attempt.
    #[must_use]
    pub fn upcoming(&self) -> Duration {
        self.next
    }
}

/// Run `operation` up to `attempts` times while it fails with [`StoreError::Conflict`].
///
/// # Errors
///
/// Returns the first non-conflict error, or the last conflict once every
/// attempt has been used.
pub async fn retry_on_conflict<T, F, Fut>(
    attempts: u32,
    mut operation: F,
    operation_name: &str,
) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let mut backoff = ConflictBackoff::default();
    let start_time = Instant::now();
    let attempts = attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(
                        operation = operation_name,
                        attempt = attempt,
                        elapsed = ?start_time.elapsed(),
                        "Write succeeded after conflict retries"
                    );
                }
                return Ok(value);
            }
            Err(e @ StoreError::Conflict { .. }) if attempt < attempts => {
                let delay = backoff.next_delay();
                warn!(
                    operation = operation_name,
                    attempt = attempt,
                    retry_after = ?delay,
                    error = %e,
                    "Write conflict, re-reading and retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod retry_tests;
