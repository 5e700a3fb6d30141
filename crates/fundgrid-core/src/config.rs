use std::time::Duration;

use crate::retry::RetryConfig;

/// Engine-wide configuration: provider endpoint, cache TTLs, and the
/// concurrency budget for upstream calls.
///
/// TTLs follow how often each dataset actually changes: the fund
/// universe moves on listing events (hours), holdings and basic info
/// on reporting cycles (minutes).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Base URL of the upstream market-data provider.
    pub base_url: String,
    /// Per-request transport timeout.
    pub request_timeout: Duration,
    /// Maximum concurrent in-flight upstream requests across a batch.
    pub max_in_flight: usize,
    /// Rate quota window and limit for upstream calls.
    pub quota_window: Duration,
    pub quota_limit: u32,
    pub universe_ttl: Duration,
    pub holdings_ttl: Duration,
    pub basic_info_ttl: Duration,
    pub retry: RetryConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("https://fundapi.example.com"),
            request_timeout: Duration::from_secs(10),
            max_in_flight: 8,
            quota_window: Duration::from_secs(1),
            quota_limit: 10,
            universe_ttl: Duration::from_secs(6 * 60 * 60),
            holdings_ttl: Duration::from_secs(30 * 60),
            basic_info_ttl: Duration::from_secs(30 * 60),
            retry: RetryConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}
