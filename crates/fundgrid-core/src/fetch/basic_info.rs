//! Per-fund basic-info fetcher.

use std::collections::HashMap;
use std::time::Duration;

use time::macros::format_description;
use time::Date;

use crate::cache::{cache_key, CacheStore};
use crate::normalize::normalize_name;
use crate::provider::{MarketDataProvider, RawFundInfo};
use crate::retry::{retry_fetch, RetryConfig};
use crate::{EngineConfig, FetchError, FetchOutcome, FundCode, FundInfo};

use super::{cached_outcome, run_batch, store_outcome};

const BASIC_INFO_OP: &str = "basic_info";

/// Retrieves supplementary fund metadata.
///
/// The provider populates the optional fields inconsistently; whatever
/// arrives is normalized, and absent or malformed optional fields stay
/// `None`. A response carrying only the required code and name is still
/// a full `Success`; the contract is "what the provider gave us,
/// normalized", not "complete data". Missing *required* fields mean the
/// provider contract changed and surface as `UpstreamSchemaChanged`.
#[derive(Clone)]
pub struct BasicInfoFetcher {
    cache: CacheStore,
    provider: MarketDataProvider,
    retry: RetryConfig,
    ttl: Duration,
    max_in_flight: usize,
}

impl BasicInfoFetcher {
    pub fn new(config: &EngineConfig, cache: CacheStore, provider: MarketDataProvider) -> Self {
        Self {
            cache,
            provider,
            retry: config.retry.clone(),
            ttl: config.basic_info_ttl,
            max_in_flight: config.max_in_flight,
        }
    }

    /// Fetch basic info for one fund, served from cache within the TTL.
    pub async fn basic_info(&self, fund: &FundCode) -> FetchOutcome<FundInfo> {
        let key = cache_key(BASIC_INFO_OP, &[fund.as_str()]);

        if let Some(hit) = cached_outcome(&self.cache, &key).await {
            return hit;
        }

        let _flight = self.cache.flight(&key).await;
        if let Some(hit) = cached_outcome(&self.cache, &key).await {
            return hit;
        }

        let raw = match retry_fetch(&self.retry, || self.provider.basic_info(fund)).await {
            Ok(raw) => raw,
            Err(error) => return FetchOutcome::failure(error),
        };

        let outcome = match normalize_info(raw) {
            Ok(info) => FetchOutcome::Success { value: info },
            Err(error) => FetchOutcome::failure(error),
        };
        store_outcome(&self.cache, &key, &outcome, self.ttl).await;
        outcome
    }

    /// Fetch basic info for many funds concurrently, bounded by the
    /// configured in-flight limit and an optional deadline.
    pub async fn basic_info_batch(
        &self,
        funds: &[FundCode],
        deadline: Option<Duration>,
    ) -> HashMap<FundCode, FetchOutcome<FundInfo>> {
        run_batch(funds, self.max_in_flight, deadline, |fund| {
            let fetcher = self.clone();
            async move { fetcher.basic_info(&fund).await }
        })
        .await
    }
}

fn normalize_info(raw: RawFundInfo) -> Result<FundInfo, FetchError> {
    let raw_code = raw
        .code
        .ok_or_else(|| FetchError::schema_changed("required field 'code' absent from basic info"))?;
    let raw_name = raw
        .name
        .ok_or_else(|| FetchError::schema_changed("required field 'name' absent from basic info"))?;

    let code = FundCode::normalize(&raw_code)?;

    Ok(FundInfo {
        code,
        name: normalize_name(&raw_name),
        manager: raw.manager.map(|m| normalize_name(&m)).filter(|m| !m.is_empty()),
        inception: raw.inception.as_deref().and_then(parse_inception),
        benchmark: raw.benchmark.map(|b| normalize_name(&b)).filter(|b| !b.is_empty()),
        size_cny: raw.fund_size.as_deref().and_then(parse_fund_size),
        company: raw.company.map(|c| normalize_name(&c)).filter(|c| !c.is_empty()),
    })
}

fn parse_inception(raw: &str) -> Option<Date> {
    let format = format_description!("[year]-[month]-[day]");
    match Date::parse(raw.trim(), &format) {
        Ok(date) => Some(date),
        Err(error) => {
            tracing::debug!(raw, %error, "unreadable inception date, leaving absent");
            None
        }
    }
}

/// Parse the provider's fund-size text into CNY. The field arrives as
/// `"45.67亿元"`, `"1234万元"`, or occasionally a bare number.
fn parse_fund_size(raw: &str) -> Option<f64> {
    let trimmed = raw.trim().trim_end_matches('元');

    let (body, scale) = if let Some(body) = trimmed.strip_suffix('亿') {
        (body, 1e8)
    } else if let Some(body) = trimmed.strip_suffix('万') {
        (body, 1e4)
    } else {
        (trimmed, 1.0)
    };

    let value: f64 = body.trim().parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    Some(value * scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn raw_full() -> RawFundInfo {
        RawFundInfo {
            code: Some(String::from("000001")),
            name: Some(String::from("华夏成长混合")),
            manager: Some(String::from(" 王某某 ")),
            inception: Some(String::from("2001-12-18")),
            benchmark: Some(String::from("沪深300指数收益率*80%")),
            fund_size: Some(String::from("45.67亿元")),
            company: Some(String::from("华夏基金")),
        }
    }

    #[test]
    fn fully_populated_info_normalizes() {
        let info = normalize_info(raw_full()).expect("valid info");

        assert_eq!(info.code.as_str(), "000001.OF");
        assert_eq!(info.name, "华夏成长混合");
        assert_eq!(info.manager.as_deref(), Some("王某某"));
        assert_eq!(info.inception, Some(date!(2001 - 12 - 18)));
        assert_eq!(info.size_cny, Some(45.67e8));
    }

    #[test]
    fn absent_optional_fields_stay_none() {
        let raw = RawFundInfo {
            manager: None,
            inception: None,
            benchmark: None,
            fund_size: None,
            company: None,
            ..raw_full()
        };

        let info = normalize_info(raw).expect("optionals are optional");
        assert!(info.manager.is_none());
        assert!(info.inception.is_none());
        assert!(info.benchmark.is_none());
        assert!(info.size_cny.is_none());
        assert!(info.company.is_none());
    }

    #[test]
    fn malformed_optional_fields_degrade_to_none() {
        let raw = RawFundInfo {
            inception: Some(String::from("2001/12/18")),
            fund_size: Some(String::from("不详")),
            ..raw_full()
        };

        let info = normalize_info(raw).expect("malformed optionals degrade");
        assert!(info.inception.is_none());
        assert!(info.size_cny.is_none());
    }

    #[test]
    fn missing_required_field_is_schema_drift() {
        let raw = RawFundInfo {
            name: None,
            ..raw_full()
        };

        let error = normalize_info(raw).expect_err("name is required");
        assert!(matches!(error, FetchError::UpstreamSchemaChanged { .. }));
    }

    #[test]
    fn fund_size_units_scale_to_cny() {
        assert_eq!(parse_fund_size("45.67亿元"), Some(45.67e8));
        assert_eq!(parse_fund_size("1234万元"), Some(1.234e7));
        assert_eq!(parse_fund_size("12.5亿"), Some(1.25e9));
        assert_eq!(parse_fund_size("1000000"), Some(1e6));
        assert_eq!(parse_fund_size("不详"), None);
        assert_eq!(parse_fund_size("-3亿"), None);
    }
}
