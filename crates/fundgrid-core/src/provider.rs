//! Upstream market-data provider client.
//!
//! The provider is an opaque JSON API whose field formats drift over
//! time, so this module does two jobs only: transport (with the shared
//! rate budget applied) and envelope parsing. It hands back *raw* rows
//! with every field optional; all normalization and per-row failure
//! accounting happens in the fetchers.
//!
//! Envelope parsing distinguishes two failure modes:
//! - [`FetchError::UpstreamUnavailable`]: transport error, non-2xx
//!   status, or a body that is not JSON at all (gateway error pages);
//! - [`FetchError::UpstreamSchemaChanged`]: the body is valid JSON but
//!   the expected envelope fields are gone. This is the failure mode
//!   observed when the provider silently renamed parameters and NAV
//!   history started coming back empty; it is surfaced unretried.

use std::sync::Arc;

use serde::Deserialize;

use crate::http_client::{HttpClient, HttpRequest};
use crate::throttling::RequestBudget;
use crate::{EngineConfig, FetchError, FundCode};

/// One raw fund row from the universe listing.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFundRow {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub fund_type: Option<String>,
}

/// Raw holdings payload for one fund.
#[derive(Debug, Clone)]
pub struct RawHoldings {
    pub period: Option<String>,
    pub rows: Vec<RawHoldingRow>,
}

/// One raw holding row. The provider sends `weight` as either a JSON
/// string or a bare number depending on its mood; both arrive here as
/// the original text.
#[derive(Debug, Clone)]
pub struct RawHoldingRow {
    pub stock_code: Option<String>,
    pub stock_name: Option<String>,
    pub weight: Option<String>,
}

/// Raw basic-info payload for one fund.
#[derive(Debug, Clone)]
pub struct RawFundInfo {
    pub code: Option<String>,
    pub name: Option<String>,
    pub manager: Option<String>,
    pub inception: Option<String>,
    pub benchmark: Option<String>,
    pub fund_size: Option<String>,
    pub company: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FundListEnvelope {
    #[serde(default)]
    data: Option<Vec<RawFundRow>>,
}

#[derive(Debug, Deserialize)]
struct HoldingsEnvelope {
    #[serde(default)]
    data: Option<HoldingsData>,
}

#[derive(Debug, Deserialize)]
struct HoldingsData {
    #[serde(default)]
    period: Option<String>,
    #[serde(default)]
    rows: Option<Vec<WireHoldingRow>>,
}

#[derive(Debug, Deserialize)]
struct WireHoldingRow {
    #[serde(default)]
    stock_code: Option<String>,
    #[serde(default)]
    stock_name: Option<String>,
    #[serde(default)]
    weight: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct BasicInfoEnvelope {
    #[serde(default)]
    data: Option<WireFundInfo>,
}

#[derive(Debug, Deserialize)]
struct WireFundInfo {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    manager: Option<String>,
    #[serde(default)]
    inception: Option<String>,
    #[serde(default)]
    benchmark: Option<String>,
    #[serde(default)]
    fund_size: Option<serde_json::Value>,
    #[serde(default)]
    company: Option<String>,
}

/// HTTP client for the upstream fund-data provider.
#[derive(Clone)]
pub struct MarketDataProvider {
    http: Arc<dyn HttpClient>,
    budget: RequestBudget,
    base_url: String,
    request_timeout_ms: u64,
}

impl MarketDataProvider {
    pub fn new(config: &EngineConfig, http: Arc<dyn HttpClient>) -> Self {
        Self {
            http,
            budget: RequestBudget::new(config.quota_window, config.quota_limit),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            request_timeout_ms: config.request_timeout.as_millis() as u64,
        }
    }

    /// Fetch the full fund universe listing. Tens of thousands of rows
    /// in one response; rows come back raw and unvalidated.
    pub async fn fund_list(&self) -> Result<Vec<RawFundRow>, FetchError> {
        let body = self.execute("/api/funds", "fund_list").await?;
        let envelope: FundListEnvelope = parse_json(&body)?;

        envelope.data.ok_or_else(|| {
            schema_drift("fund_list", "field 'data' absent from fund list response")
        })
    }

    /// Fetch the reported holdings of one fund.
    pub async fn holdings(&self, fund: &FundCode) -> Result<RawHoldings, FetchError> {
        let path = format!("/api/funds/{}/holdings", urlencoding::encode(fund.body()));
        let body = self.execute(&path, "holdings").await?;
        let envelope: HoldingsEnvelope = parse_json(&body)?;

        let data = envelope
            .data
            .ok_or_else(|| schema_drift("holdings", "field 'data' absent from holdings response"))?;
        let rows = data
            .rows
            .ok_or_else(|| schema_drift("holdings", "field 'rows' absent from holdings response"))?;

        Ok(RawHoldings {
            period: data.period,
            rows: rows
                .into_iter()
                .map(|row| RawHoldingRow {
                    stock_code: row.stock_code,
                    stock_name: row.stock_name,
                    weight: row.weight.map(value_to_text),
                })
                .collect(),
        })
    }

    /// Fetch supplementary metadata for one fund.
    pub async fn basic_info(&self, fund: &FundCode) -> Result<RawFundInfo, FetchError> {
        let path = format!("/api/funds/{}/info", urlencoding::encode(fund.body()));
        let body = self.execute(&path, "basic_info").await?;
        let envelope: BasicInfoEnvelope = parse_json(&body)?;

        let data = envelope.data.ok_or_else(|| {
            schema_drift("basic_info", "field 'data' absent from basic info response")
        })?;

        Ok(RawFundInfo {
            code: data.code,
            name: data.name,
            manager: data.manager,
            inception: data.inception,
            benchmark: data.benchmark,
            fund_size: data.fund_size.map(value_to_text),
            company: data.company,
        })
    }

    async fn execute(&self, path: &str, operation: &str) -> Result<String, FetchError> {
        // The quota protects the real provider; canned transports skip it.
        if !self.http.is_mock() {
            self.budget.acquire().await;
        }

        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(operation, %url, "upstream request");

        let request = HttpRequest::get(&url).with_timeout_ms(self.request_timeout_ms);
        let response = self
            .http
            .execute(request)
            .await
            .map_err(|e| FetchError::unavailable(format!("{operation} transport error: {e}")))?;

        if !response.is_success() {
            return Err(FetchError::unavailable(format!(
                "{operation} returned status {}",
                response.status
            )));
        }

        Ok(response.body)
    }
}

fn parse_json<'a, T: Deserialize<'a>>(body: &'a str) -> Result<T, FetchError> {
    serde_json::from_str(body)
        .map_err(|e| FetchError::unavailable(format!("response body is not valid JSON: {e}")))
}

fn schema_drift(operation: &str, reason: &str) -> FetchError {
    tracing::warn!(operation, reason, "upstream schema drift detected");
    FetchError::schema_changed(reason)
}

/// Render a JSON scalar as the text the provider meant to send.
fn value_to_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}
