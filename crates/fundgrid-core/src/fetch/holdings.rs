//! Per-fund holdings fetcher.

use std::collections::HashMap;
use std::time::Duration;

use crate::cache::{cache_key, CacheStore};
use crate::normalize::parse_weight;
use crate::provider::{MarketDataProvider, RawHoldingRow};
use crate::retry::{retry_fetch, RetryConfig};
use crate::{
    EngineConfig, FetchError, FetchOutcome, FundCode, Holding, ItemFailure, SecurityCode,
};

use super::{cached_outcome, run_batch, store_outcome};

const HOLDINGS_OP: &str = "holdings";

/// Retrieves the reported portfolio of a fund and normalizes each row
/// defensively.
///
/// Entries are keyed per fund, so one fund's failure never blocks
/// another's: a batch of N funds yields N independent outcomes. A row
/// with an unmappable security code or unparsable weight is dropped
/// with a recorded failure, never silently zeroed. A fund whose rows
/// all fail reports `Failure(AllRowsUnparsable)` with the full failure
/// list attached.
#[derive(Clone)]
pub struct HoldingsFetcher {
    cache: CacheStore,
    provider: MarketDataProvider,
    retry: RetryConfig,
    ttl: Duration,
    max_in_flight: usize,
}

impl HoldingsFetcher {
    pub fn new(config: &EngineConfig, cache: CacheStore, provider: MarketDataProvider) -> Self {
        Self {
            cache,
            provider,
            retry: config.retry.clone(),
            ttl: config.holdings_ttl,
            max_in_flight: config.max_in_flight,
        }
    }

    /// Fetch the holdings of one fund, served from cache within the TTL.
    pub async fn holdings(&self, fund: &FundCode) -> FetchOutcome<Vec<Holding>> {
        let key = cache_key(HOLDINGS_OP, &[fund.as_str()]);

        if let Some(hit) = cached_outcome(&self.cache, &key).await {
            return hit;
        }

        let _flight = self.cache.flight(&key).await;
        if let Some(hit) = cached_outcome(&self.cache, &key).await {
            return hit;
        }

        let raw = match retry_fetch(&self.retry, || self.provider.holdings(fund)).await {
            Ok(raw) => raw,
            Err(error) => return FetchOutcome::failure(error),
        };

        let row_count = raw.rows.len();
        let mut holdings = Vec::with_capacity(row_count);
        let mut failures = Vec::new();

        for row in raw.rows {
            match normalize_row(fund, row, raw.period.as_deref()) {
                Ok(holding) => holdings.push(holding),
                Err(failure) => {
                    tracing::debug!(
                        fund = %fund,
                        item = %failure.item,
                        error = %failure.error,
                        "dropping holding row"
                    );
                    failures.push(failure);
                }
            }
        }

        if holdings.is_empty() && !failures.is_empty() {
            return FetchOutcome::failure_with(FetchError::AllRowsUnparsable, failures);
        }

        let outcome = FetchOutcome::from_parts(holdings, failures);
        store_outcome(&self.cache, &key, &outcome, self.ttl).await;
        outcome
    }

    /// Fetch holdings for many funds concurrently, bounded by the
    /// configured in-flight limit and an optional deadline. The result
    /// is an unordered map keyed by fund code.
    pub async fn holdings_batch(
        &self,
        funds: &[FundCode],
        deadline: Option<Duration>,
    ) -> HashMap<FundCode, FetchOutcome<Vec<Holding>>> {
        run_batch(funds, self.max_in_flight, deadline, |fund| {
            let fetcher = self.clone();
            async move { fetcher.holdings(&fund).await }
        })
        .await
    }
}

fn normalize_row(
    fund: &FundCode,
    row: RawHoldingRow,
    period: Option<&str>,
) -> Result<Holding, ItemFailure> {
    let raw_code = row.stock_code.unwrap_or_default();
    let label = if raw_code.is_empty() {
        row.stock_name.clone().unwrap_or_else(|| String::from("<missing code>"))
    } else {
        raw_code.clone()
    };

    let security_code = SecurityCode::normalize(&raw_code)
        .map_err(|error| ItemFailure::new(label.clone(), FetchError::from(error)))?;

    let raw_weight = row.weight.unwrap_or_default();
    let weight = parse_weight(&raw_weight)
        .map_err(|error| ItemFailure::new(label.clone(), FetchError::from(error)))?;

    Holding::new(
        fund.clone(),
        raw_code,
        security_code,
        weight,
        period.map(str::to_owned),
    )
    .map_err(|error| ItemFailure::new(label, FetchError::from(error)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fund() -> FundCode {
        FundCode::normalize("000001").expect("valid code")
    }

    fn row(code: &str, weight: &str) -> RawHoldingRow {
        RawHoldingRow {
            stock_code: Some(code.to_string()),
            stock_name: None,
            weight: Some(weight.to_string()),
        }
    }

    #[test]
    fn mixed_weight_formats_normalize_to_fractions() {
        for raw in ["3.46%", "3.46", "0.0346"] {
            let holding =
                normalize_row(&fund(), row("600519", raw), Some("2024Q4")).expect("valid row");
            assert!((holding.weight - 0.0346).abs() < 1e-12);
            assert_eq!(holding.security_code.as_str(), "600519.SH");
            assert_eq!(holding.as_of_period.as_deref(), Some("2024Q4"));
        }
    }

    #[test]
    fn unparsable_weight_drops_the_row_with_a_record() {
        let failure = normalize_row(&fund(), row("600519", "N/A"), None).expect_err("bad weight");
        assert_eq!(failure.item, "600519");
        assert!(matches!(
            failure.error,
            FetchError::UnparsableWeight { .. }
        ));
    }

    #[test]
    fn unknown_exchange_prefix_drops_the_row_with_a_record() {
        let failure = normalize_row(&fund(), row("900001", "1.2%"), None).expect_err("B share");
        assert!(matches!(
            failure.error,
            FetchError::UnknownExchangePrefix { .. }
        ));
    }

    #[test]
    fn row_without_code_is_labelled_by_stock_name() {
        let failure = normalize_row(
            &fund(),
            RawHoldingRow {
                stock_code: None,
                stock_name: Some(String::from("贵州茅台")),
                weight: Some(String::from("3.46%")),
            },
            None,
        )
        .expect_err("missing code");

        assert_eq!(failure.item, "贵州茅台");
    }
}
