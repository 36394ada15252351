//! Bounded retry-with-backoff polling for eventual consistency.
//!
//! Generalizes the post-checkout "wait for the webhook to land" loop: poll a
//! fetcher until a predicate confirms the expected side effect, up to a
//! bounded number of attempts, then give up non-fatally with whatever was
//! last seen so the caller can proceed anyway.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub max_attempts: u32,
    pub interval: Duration,
}

#[derive(Debug, PartialEq)]
pub enum PollOutcome<T> {
    /// The predicate held on this value.
    Confirmed { value: T, attempts: u32 },
    /// All attempts exhausted. Non-fatal: `last_seen` is the most recent
    /// fetched value, if any attempt produced one.
    GaveUp { last_seen: Option<T>, attempts: u32 },
}

impl<T> PollOutcome<T> {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, PollOutcome::Confirmed { .. })
    }
}

/// Polls `fetch` until `predicate` holds, sleeping `config.interval` between
/// attempts. Fetch errors count as failed attempts and are logged, never
/// propagated: the caller asked "did the side effect land?", and the answer
/// after exhaustion is "not that we could see".
pub async fn poll_until<T, E, F, Fut, P>(
    config: PollConfig,
    mut fetch: F,
    predicate: P,
) -> PollOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
    E: Display,
    P: Fn(&T) -> bool,
{
    let mut last_seen = None;

    for attempt in 1..=config.max_attempts {
        if attempt > 1 {
            tokio::time::sleep(config.interval).await;
        }

        match fetch().await {
            Ok(Some(value)) => {
                if predicate(&value) {
                    return PollOutcome::Confirmed { value, attempts: attempt };
                }
                last_seen = Some(value);
            }
            Ok(None) => {}
            Err(e) => warn!("poll attempt {attempt} failed: {e}"),
        }
    }

    PollOutcome::GaveUp {
        last_seen,
        attempts: config.max_attempts,
    }
}
