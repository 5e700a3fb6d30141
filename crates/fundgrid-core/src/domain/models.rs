use serde::{Deserialize, Serialize};
use time::Date;

use crate::{FundCode, NormalizeError, SecurityCode};

/// Broad fund category derived from the provider's type label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundType {
    Equity,
    Bond,
    Mixed,
    MoneyMarket,
    Index,
    Other,
    Unknown,
}

/// One fund in the tradable universe.
///
/// Immutable once produced; a universe refresh supersedes the whole
/// list rather than mutating entries in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fund {
    /// Identifier exactly as the provider reported it.
    pub raw_code: String,
    pub code: FundCode,
    pub raw_name: String,
    pub name: String,
    pub fund_type: FundType,
}

/// One normalized holding row of a fund's portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub fund_code: FundCode,
    /// Security identifier exactly as the provider reported it.
    pub raw_security_code: String,
    pub security_code: SecurityCode,
    /// Portfolio weight as a decimal fraction in `[0, 1]`, never a
    /// percentage.
    pub weight: f64,
    /// Reporting period label, e.g. `2024Q4`, when the provider sends one.
    pub as_of_period: Option<String>,
}

impl Holding {
    pub fn new(
        fund_code: FundCode,
        raw_security_code: impl Into<String>,
        security_code: SecurityCode,
        weight: f64,
        as_of_period: Option<String>,
    ) -> Result<Self, NormalizeError> {
        let raw_security_code = raw_security_code.into();
        if !weight.is_finite() || !(0.0..=1.0).contains(&weight) {
            return Err(NormalizeError::UnparsableWeight {
                raw: weight.to_string(),
            });
        }

        Ok(Self {
            fund_code,
            raw_security_code,
            security_code,
            weight,
            as_of_period,
        })
    }
}

/// Supplementary per-fund metadata.
///
/// The provider populates the optional fields inconsistently; absent
/// fields stay `None` rather than carrying sentinel values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundInfo {
    pub code: FundCode,
    pub name: String,
    pub manager: Option<String>,
    pub inception: Option<Date>,
    pub benchmark: Option<String>,
    /// Assets under management in CNY, when reported.
    pub size_cny: Option<f64>,
    pub company: Option<String>,
}
