use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced by the pure normalization layer.
///
/// These are per-item errors: a bad code or weight invalidates one row,
/// never the batch that contains it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("invalid fund code format: '{raw}'")]
    InvalidCodeFormat { raw: String },
    #[error("unknown exchange prefix in security code: '{raw}'")]
    UnknownExchangePrefix { raw: String },
    #[error("unparsable weight field: '{raw}'")]
    UnparsableWeight { raw: String },
}

/// Fetch-level error taxonomy shared by every fetcher.
///
/// Serializable so that recorded failures inside a cached outcome
/// round-trip through the cache unchanged.
#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FetchError {
    #[error("invalid fund code format: '{raw}'")]
    InvalidCodeFormat { raw: String },

    #[error("unknown exchange prefix in security code: '{raw}'")]
    UnknownExchangePrefix { raw: String },

    #[error("unparsable weight field: '{raw}'")]
    UnparsableWeight { raw: String },

    /// Every holding row of a fund failed normalization.
    #[error("all holding rows were unparsable")]
    AllRowsUnparsable,

    /// Transport failure or non-2xx upstream status.
    #[error("upstream unavailable: {reason}")]
    UpstreamUnavailable { reason: String },

    /// The response parsed as JSON but the expected fields are gone.
    /// This is provider contract drift; retrying will not fix it.
    #[error("upstream schema changed: {reason}")]
    UpstreamSchemaChanged { reason: String },

    #[error("operation exceeded its deadline")]
    Timeout,
}

impl FetchError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::UpstreamUnavailable {
            reason: reason.into(),
        }
    }

    pub fn schema_changed(reason: impl Into<String>) -> Self {
        Self::UpstreamSchemaChanged {
            reason: reason.into(),
        }
    }

    /// Whether a bounded retry can plausibly succeed.
    pub const fn retryable(&self) -> bool {
        matches!(
            self,
            Self::UpstreamUnavailable { .. } | Self::Timeout
        )
    }

    /// Stable machine-readable code for downstream response mapping.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidCodeFormat { .. } => "normalize.invalid_code_format",
            Self::UnknownExchangePrefix { .. } => "normalize.unknown_exchange_prefix",
            Self::UnparsableWeight { .. } => "normalize.unparsable_weight",
            Self::AllRowsUnparsable => "fetch.all_rows_unparsable",
            Self::UpstreamUnavailable { .. } => "fetch.upstream_unavailable",
            Self::UpstreamSchemaChanged { .. } => "fetch.upstream_schema_changed",
            Self::Timeout => "fetch.timeout",
        }
    }
}

impl From<NormalizeError> for FetchError {
    fn from(error: NormalizeError) -> Self {
        match error {
            NormalizeError::InvalidCodeFormat { raw } => Self::InvalidCodeFormat { raw },
            NormalizeError::UnknownExchangePrefix { raw } => Self::UnknownExchangePrefix { raw },
            NormalizeError::UnparsableWeight { raw } => Self::UnparsableWeight { raw },
        }
    }
}
