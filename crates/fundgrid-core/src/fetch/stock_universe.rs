//! Stock-universe aggregation over fund holdings.

use std::collections::BTreeSet;
use std::time::Duration;

use crate::{FetchError, FetchOutcome, FundCode, HoldingsFetcher, ItemFailure, SecurityCode};

/// Derives the set of distinct securities held across a group of funds.
///
/// Purely a composition over [`HoldingsFetcher`]: no upstream calls of
/// its own and no cache entry of its own, since the per-fund holdings
/// cache already absorbs the expense. Deduplication happens on the
/// qualified code, so `"600519"` and `"600519.SH"` reported by
/// different funds collapse into one entry.
#[derive(Clone)]
pub struct StockUniverseAggregator {
    holdings: HoldingsFetcher,
}

impl StockUniverseAggregator {
    pub fn new(holdings: HoldingsFetcher) -> Self {
        Self { holdings }
    }

    /// Union the qualified security codes held by `funds`.
    ///
    /// Funds whose holdings could not be fetched at all are recorded as
    /// failures keyed by fund code; their absence shrinks the union but
    /// never aborts it. Row-level drops inside a fund are already
    /// recorded on that fund's holdings outcome and are not repeated
    /// here. An empty input is a trivial `Success` with an empty set.
    pub async fn aggregate(
        &self,
        funds: &[FundCode],
        deadline: Option<Duration>,
    ) -> FetchOutcome<BTreeSet<SecurityCode>> {
        if funds.is_empty() {
            return FetchOutcome::Success {
                value: BTreeSet::new(),
            };
        }

        let outcomes = self.holdings.holdings_batch(funds, deadline).await;

        let mut universe = BTreeSet::new();
        let mut failures = Vec::new();
        let mut usable_funds = 0usize;

        for (fund, outcome) in outcomes {
            match outcome {
                FetchOutcome::Success { value } | FetchOutcome::Partial { value, .. } => {
                    usable_funds += 1;
                    for holding in value {
                        universe.insert(holding.security_code);
                    }
                }
                FetchOutcome::Failure { error, .. } => {
                    failures.push(ItemFailure::new(fund.as_str(), error));
                }
            }
        }

        // Batch iteration order is arbitrary; sort so the recorded list
        // and the representative error are stable run to run.
        failures.sort_by(|a, b| a.item.cmp(&b.item));

        tracing::debug!(
            funds = funds.len(),
            usable = usable_funds,
            securities = universe.len(),
            failed = failures.len(),
            "stock universe aggregated"
        );

        if usable_funds == 0 {
            // Nothing contributed; surface the first failure as the
            // representative error with the full list attached.
            let representative = match failures.first() {
                Some(first) => first.error.clone(),
                None => FetchError::unavailable("no holdings outcomes produced"),
            };
            return FetchOutcome::failure_with(representative, failures);
        }
        FetchOutcome::from_parts(universe, failures)
    }
}
