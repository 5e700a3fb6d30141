//! # Fetchers
//!
//! The four engine operations, each built on the same pattern: derive a
//! cache key from the logical request, consult the cache, take the
//! single-flight guard on a miss, call upstream through the retry
//! helper, normalize per row, and store the whole outcome.
//!
//! | Fetcher | Operation | Cache key | TTL |
//! |---------|-----------|-----------|-----|
//! | [`UniverseFetcher`] | full fund listing | fixed | hours |
//! | [`HoldingsFetcher`] | per-fund holdings | per fund | minutes |
//! | [`BasicInfoFetcher`] | per-fund metadata | per fund | minutes |
//! | [`StockUniverseAggregator`] | deduped securities | none (composes holdings) | n/a |
//!
//! Caching stores serialized [`FetchOutcome`](crate::FetchOutcome)
//! values, so a hit reproduces a fresh fetch exactly, recorded partial
//! failures included. `Failure` outcomes are never cached; a transient
//! upstream error must not poison the window until expiry.

mod basic_info;
mod holdings;
mod stock_universe;
mod universe;

pub use basic_info::BasicInfoFetcher;
pub use holdings::HoldingsFetcher;
pub use stock_universe::StockUniverseAggregator;
pub use universe::UniverseFetcher;

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::cache::CacheStore;
use crate::{FetchError, FetchOutcome, FundCode};

/// Read a previously stored outcome. A corrupt entry (version skew
/// between deployments) is dropped and treated as a miss.
pub(crate) async fn cached_outcome<T: DeserializeOwned>(
    cache: &CacheStore,
    key: &str,
) -> Option<FetchOutcome<T>> {
    let hit = cache.get(key).await?;
    match serde_json::from_str(&hit) {
        Ok(outcome) => {
            tracing::debug!(key, "cache hit");
            Some(outcome)
        }
        Err(error) => {
            tracing::warn!(key, %error, "dropping undecodable cache entry");
            cache.invalidate(key).await;
            None
        }
    }
}

/// Store a usable outcome. `Failure` outcomes are never written.
pub(crate) async fn store_outcome<T: Serialize>(
    cache: &CacheStore,
    key: &str,
    outcome: &FetchOutcome<T>,
    ttl: Duration,
) {
    if !outcome.is_usable() {
        return;
    }
    match serde_json::to_string(outcome) {
        Ok(body) => cache.put(key, body, ttl).await,
        Err(error) => tracing::warn!(key, %error, "failed to serialize outcome for caching"),
    }
}

/// Run a per-fund operation across a batch: bounded concurrency, an
/// optional deadline, unordered results keyed by fund code.
///
/// Items still in flight when the deadline passes are abandoned and
/// reported as `Failure(Timeout)`; items that already completed keep
/// their outcome. The batch is always partial rather than
/// all-or-nothing.
pub(crate) async fn run_batch<T, F, Fut>(
    funds: &[FundCode],
    max_in_flight: usize,
    deadline: Option<Duration>,
    op: F,
) -> HashMap<FundCode, FetchOutcome<T>>
where
    T: Send + 'static,
    F: Fn(FundCode) -> Fut,
    Fut: Future<Output = FetchOutcome<T>> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(max_in_flight.max(1)));
    let deadline_at = deadline.map(|d| tokio::time::Instant::now() + d);

    let mut tasks = JoinSet::new();
    let mut keys: HashMap<tokio::task::Id, FundCode> = HashMap::with_capacity(funds.len());
    for fund in funds {
        let semaphore = semaphore.clone();
        let fut = op(fund.clone());

        let handle = tasks.spawn(async move {
            let bounded = async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("batch semaphore is never closed");
                fut.await
            };

            match deadline_at {
                Some(at) => match tokio::time::timeout_at(at, bounded).await {
                    Ok(outcome) => outcome,
                    Err(_) => FetchOutcome::failure(FetchError::Timeout),
                },
                None => bounded.await,
            }
        });
        keys.insert(handle.id(), fund.clone());
    }

    // Fund keys are held outside the tasks so that every input fund gets
    // an outcome even if its task panics.
    let mut results = HashMap::with_capacity(funds.len());
    while let Some(joined) = tasks.join_next_with_id().await {
        match joined {
            Ok((id, outcome)) => {
                if let Some(fund) = keys.remove(&id) {
                    results.insert(fund, outcome);
                }
            }
            Err(error) => {
                if let Some(fund) = keys.remove(&error.id()) {
                    tracing::warn!(%fund, %error, "batch task failed to join");
                    results.insert(
                        fund,
                        FetchOutcome::failure(FetchError::unavailable(format!(
                            "batch task failed: {error}"
                        ))),
                    );
                }
            }
        }
    }

    results
}
