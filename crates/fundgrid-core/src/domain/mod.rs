//! # Domain Models
//!
//! Canonical domain types for the fund data engine.
//!
//! All identifier types validate and normalize at construction, so a
//! `FundCode` or `SecurityCode` in circulation is always canonical:
//!
//! | Type | Description |
//! |------|-------------|
//! | [`FundCode`] | Exchange-qualified fund identifier (`000001.OF`) |
//! | [`SecurityCode`] | Exchange-qualified security ticker (`600519.SH`) |
//! | [`Fund`] | Universe entry with raw and normalized fields |
//! | [`Holding`] | Portfolio row with fractional weight |
//! | [`FundInfo`] | Per-fund metadata with explicitly optional fields |
//! | [`FundType`] | Broad category derived from the provider label |

mod codes;
mod models;

pub use codes::{FundCode, SecurityCode};
pub use models::{Fund, FundInfo, FundType, Holding};
