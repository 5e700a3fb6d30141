//! Fund universe fetcher.

use std::time::Duration;

use crate::cache::{cache_key, CacheStore};
use crate::normalize::{classify_fund_type, normalize_name};
use crate::provider::{MarketDataProvider, RawFundRow};
use crate::retry::{retry_fetch, RetryConfig};
use crate::{EngineConfig, FetchError, FetchOutcome, Fund, FundCode, ItemFailure};

use super::{cached_outcome, store_outcome};

const UNIVERSE_OP: &str = "fund_universe";

/// Retrieves and normalizes the full list of tradable funds.
///
/// This is the highest-volume call (tens of thousands of rows), so the
/// normalized list is cached under one fixed key with the longest TTL.
/// Rows normalize independently: one malformed code downgrades the
/// outcome to `Partial` with that raw code recorded, never discarding
/// the batch. Nothing is cached unless the upstream batch completed,
/// so a failed call can never pin an incomplete universe.
#[derive(Clone)]
pub struct UniverseFetcher {
    cache: CacheStore,
    provider: MarketDataProvider,
    retry: RetryConfig,
    ttl: Duration,
}

impl UniverseFetcher {
    pub fn new(config: &EngineConfig, cache: CacheStore, provider: MarketDataProvider) -> Self {
        Self {
            cache,
            provider,
            retry: config.retry.clone(),
            ttl: config.universe_ttl,
        }
    }

    /// List the fund universe, served from cache within the TTL window.
    pub async fn list_funds(&self) -> FetchOutcome<Vec<Fund>> {
        let key = cache_key(UNIVERSE_OP, &[]);

        if let Some(hit) = cached_outcome(&self.cache, &key).await {
            return hit;
        }

        let _flight = self.cache.flight(&key).await;
        if let Some(hit) = cached_outcome(&self.cache, &key).await {
            return hit;
        }

        let rows = match retry_fetch(&self.retry, || self.provider.fund_list()).await {
            Ok(rows) => rows,
            Err(error) => return FetchOutcome::failure(error),
        };

        let row_count = rows.len();
        let mut funds = Vec::with_capacity(row_count);
        let mut failures = Vec::new();

        for row in rows {
            match normalize_row(row) {
                Ok(fund) => funds.push(fund),
                Err(failure) => {
                    tracing::warn!(item = %failure.item, error = %failure.error, "dropping fund row");
                    failures.push(failure);
                }
            }
        }

        tracing::debug!(
            rows = row_count,
            funds = funds.len(),
            failed = failures.len(),
            "fund universe normalized"
        );

        let outcome = FetchOutcome::from_parts(funds, failures);
        store_outcome(&self.cache, &key, &outcome, self.ttl).await;
        outcome
    }
}

fn normalize_row(row: RawFundRow) -> Result<Fund, ItemFailure> {
    let raw_code = row.code.unwrap_or_default();
    let raw_name = row.name.unwrap_or_default();

    let code = FundCode::normalize(&raw_code).map_err(|error| {
        let label = if raw_code.is_empty() {
            raw_name.clone()
        } else {
            raw_code.clone()
        };
        ItemFailure::new(label, FetchError::from(error))
    })?;

    Ok(Fund {
        name: normalize_name(&raw_name),
        fund_type: classify_fund_type(row.fund_type.as_deref().unwrap_or_default()),
        raw_code,
        raw_name,
        code,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FundType;

    #[test]
    fn row_with_valid_code_normalizes() {
        let fund = normalize_row(RawFundRow {
            code: Some(String::from(" 000001")),
            name: Some(String::from("华夏成长  混合(后端)")),
            fund_type: Some(String::from("混合型")),
        })
        .expect("valid row");

        assert_eq!(fund.code.as_str(), "000001.OF");
        assert_eq!(fund.raw_code, " 000001");
        assert_eq!(fund.name, "华夏成长 混合");
        assert_eq!(fund.fund_type, FundType::Mixed);
    }

    #[test]
    fn row_without_code_is_recorded_under_its_name() {
        let failure = normalize_row(RawFundRow {
            code: None,
            name: Some(String::from("神秘基金")),
            fund_type: None,
        })
        .expect_err("missing code");

        assert_eq!(failure.item, "神秘基金");
        assert!(matches!(
            failure.error,
            FetchError::InvalidCodeFormat { .. }
        ));
    }

    #[test]
    fn missing_type_label_is_unknown_not_a_failure() {
        let fund = normalize_row(RawFundRow {
            code: Some(String::from("110022")),
            name: Some(String::from("易方达消费行业")),
            fund_type: None,
        })
        .expect("type label is optional");

        assert_eq!(fund.fund_type, FundType::Unknown);
    }
}
