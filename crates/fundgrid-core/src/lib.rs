//! # Fundgrid Core
//!
//! Aggregation and caching engine for Chinese public-fund market data.
//!
//! ## Overview
//!
//! Downstream services need fund data that the upstream provider serves
//! slowly, inconsistently, and in drifting formats. This crate sits in
//! between:
//!
//! - **Canonical domain models** for funds, holdings, and security codes
//! - **Defensive normalization** of codes, names, and weight formats
//! - **Tagged fetch outcomes** distinguishing full, partial, and failed results
//! - **TTL caching with single-flight** so concurrent misses fetch once
//! - **Bounded concurrent batches** with per-item deadline handling
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cache`] | TTL key/value cache with single-flight coordination |
//! | [`config`] | Engine configuration and production defaults |
//! | [`domain`] | Domain models (FundCode, SecurityCode, Fund, Holding, FundInfo) |
//! | [`engine`] | `FundDataEngine` facade |
//! | [`error`] | Normalization and fetch error types |
//! | [`fetch`] | The four fetch operations |
//! | [`http_client`] | HTTP client abstraction |
//! | [`normalize`] | Pure normalization functions |
//! | [`outcome`] | `FetchOutcome` tagged results |
//! | [`provider`] | Upstream provider client and wire parsing |
//! | [`retry`] | Bounded retry with backoff |
//! | [`throttling`] | Rate limiting support |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use fundgrid_core::{EngineConfig, FundCode, FundDataEngine, ReqwestHttpClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = FundDataEngine::new(
//!         EngineConfig::default(),
//!         Arc::new(ReqwestHttpClient::new()),
//!     );
//!
//!     let fund = FundCode::normalize("000001")?;
//!     let outcome = engine.holdings(&fund).await;
//!
//!     if let Some(holdings) = outcome.value() {
//!         for holding in holdings {
//!             println!("{} {:.2}%", holding.security_code, holding.weight * 100.0);
//!         }
//!     }
//!     for failure in outcome.failures() {
//!         eprintln!("dropped {}: {}", failure.item, failure.error);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Fetch operations never return a bare `Result`; they return
//! [`FetchOutcome`], which makes partial success a first-class state.
//! Row-level problems (a malformed code, an unparsable weight) drop the
//! row and record it; only whole-call problems (upstream down, schema
//! drift, timeout) produce a `Failure`. [`FetchError::retryable`] tells
//! the retry layer which failures are worth another attempt.

pub mod cache;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod http_client;
pub mod normalize;
pub mod outcome;
pub mod provider;
pub mod retry;
pub mod throttling;

// Re-export commonly used types at crate root for convenience

// Caching
pub use cache::{cache_key, CacheStore};

// Configuration
pub use config::EngineConfig;

// Domain models
pub use domain::{Fund, FundCode, FundInfo, FundType, Holding, SecurityCode};

// Engine facade
pub use engine::FundDataEngine;

// Error types
pub use error::{FetchError, NormalizeError};

// Fetchers
pub use fetch::{BasicInfoFetcher, HoldingsFetcher, StockUniverseAggregator, UniverseFetcher};

// HTTP client types
pub use http_client::{
    HttpClient, HttpError, HttpRequest, HttpResponse, NoopHttpClient, ReqwestHttpClient,
};

// Outcome types
pub use outcome::{FetchOutcome, ItemFailure};

// Provider client
pub use provider::MarketDataProvider;

// Retry logic
pub use retry::{Backoff, RetryConfig};

// Throttling
pub use throttling::RequestBudget;
