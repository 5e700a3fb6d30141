//! Engine facade.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::CacheStore;
use crate::fetch::{
    BasicInfoFetcher, HoldingsFetcher, StockUniverseAggregator, UniverseFetcher,
};
use crate::http_client::HttpClient;
use crate::provider::MarketDataProvider;
use crate::{EngineConfig, FetchOutcome, Fund, FundCode, FundInfo, Holding, SecurityCode};

/// The aggregation engine: one shared cache, one provider client, and
/// the four fetch operations behind a single handle.
///
/// Construction takes the transport as `Arc<dyn HttpClient>`, so the
/// whole engine runs offline under test with a mock client. The handle
/// is cheap to clone; clones share the cache and the rate budget.
#[derive(Clone)]
pub struct FundDataEngine {
    cache: CacheStore,
    universe: UniverseFetcher,
    holdings: HoldingsFetcher,
    basic_info: BasicInfoFetcher,
    stock_universe: StockUniverseAggregator,
}

impl FundDataEngine {
    pub fn new(config: EngineConfig, http: Arc<dyn HttpClient>) -> Self {
        let cache = CacheStore::new();
        let provider = MarketDataProvider::new(&config, http);

        let universe = UniverseFetcher::new(&config, cache.clone(), provider.clone());
        let holdings = HoldingsFetcher::new(&config, cache.clone(), provider.clone());
        let basic_info = BasicInfoFetcher::new(&config, cache.clone(), provider);
        let stock_universe = StockUniverseAggregator::new(holdings.clone());

        Self {
            cache,
            universe,
            holdings,
            basic_info,
            stock_universe,
        }
    }

    /// List the full fund universe.
    pub async fn list_funds(&self) -> FetchOutcome<Vec<Fund>> {
        self.universe.list_funds().await
    }

    /// Fetch the holdings of one fund.
    pub async fn holdings(&self, fund: &FundCode) -> FetchOutcome<Vec<Holding>> {
        self.holdings.holdings(fund).await
    }

    /// Fetch holdings for many funds with bounded concurrency.
    pub async fn holdings_batch(
        &self,
        funds: &[FundCode],
        deadline: Option<Duration>,
    ) -> HashMap<FundCode, FetchOutcome<Vec<Holding>>> {
        self.holdings.holdings_batch(funds, deadline).await
    }

    /// Fetch supplementary metadata for one fund.
    pub async fn basic_info(&self, fund: &FundCode) -> FetchOutcome<FundInfo> {
        self.basic_info.basic_info(fund).await
    }

    /// Fetch metadata for many funds with bounded concurrency.
    pub async fn basic_info_batch(
        &self,
        funds: &[FundCode],
        deadline: Option<Duration>,
    ) -> HashMap<FundCode, FetchOutcome<FundInfo>> {
        self.basic_info.basic_info_batch(funds, deadline).await
    }

    /// Aggregate the distinct securities held across `funds`.
    pub async fn stock_universe(
        &self,
        funds: &[FundCode],
        deadline: Option<Duration>,
    ) -> FetchOutcome<BTreeSet<SecurityCode>> {
        self.stock_universe.aggregate(funds, deadline).await
    }

    /// The shared cache behind every fetcher, exposed for housekeeping
    /// (periodic `clear_expired` / `prune_flights`) and inspection.
    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }
}
