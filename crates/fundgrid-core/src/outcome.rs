//! Tagged fetch results.
//!
//! Every fetcher returns a [`FetchOutcome`] so that callers can always
//! distinguish "fully usable", "usable with recorded failures", and
//! "nothing usable" without exceptions-as-control-flow. Outcomes are
//! serializable: the cache stores whole outcomes, which makes a cache
//! hit indistinguishable in content from a fresh fetch.

use serde::{Deserialize, Serialize};

use crate::FetchError;

/// One recorded per-item failure inside a partial result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemFailure {
    /// The offending item as received, e.g. a raw code or row label.
    pub item: String,
    pub error: FetchError,
}

impl ItemFailure {
    pub fn new(item: impl Into<String>, error: impl Into<FetchError>) -> Self {
        Self {
            item: item.into(),
            error: error.into(),
        }
    }
}

/// Result contract shared by every fetcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FetchOutcome<T> {
    /// Everything requested was fetched and normalized.
    Success { value: T },
    /// Some items were usable; the rest failed for recorded reasons.
    Partial {
        value: T,
        failures: Vec<ItemFailure>,
    },
    /// Nothing usable. `failures` carries the per-item records that led
    /// here, when there are any (e.g. every row of a batch failed).
    Failure {
        error: FetchError,
        #[serde(default)]
        failures: Vec<ItemFailure>,
    },
}

impl<T> FetchOutcome<T> {
    /// Build an outcome from a value and its recorded failures,
    /// collapsing an empty failure list to `Success`.
    pub fn from_parts(value: T, failures: Vec<ItemFailure>) -> Self {
        if failures.is_empty() {
            Self::Success { value }
        } else {
            Self::Partial { value, failures }
        }
    }

    pub fn failure(error: impl Into<FetchError>) -> Self {
        Self::Failure {
            error: error.into(),
            failures: Vec::new(),
        }
    }

    pub fn failure_with(error: impl Into<FetchError>, failures: Vec<ItemFailure>) -> Self {
        Self::Failure {
            error: error.into(),
            failures,
        }
    }

    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Whether the outcome carries any usable value.
    pub const fn is_usable(&self) -> bool {
        !matches!(self, Self::Failure { .. })
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Success { value } | Self::Partial { value, .. } => Some(value),
            Self::Failure { .. } => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Success { value } | Self::Partial { value, .. } => Some(value),
            Self::Failure { .. } => None,
        }
    }

    pub fn failures(&self) -> &[ItemFailure] {
        match self {
            Self::Partial { failures, .. } | Self::Failure { failures, .. } => failures,
            Self::Success { .. } => &[],
        }
    }

    pub fn error(&self) -> Option<&FetchError> {
        match self {
            Self::Failure { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FetchOutcome<U> {
        match self {
            Self::Success { value } => FetchOutcome::Success { value: f(value) },
            Self::Partial { value, failures } => FetchOutcome::Partial {
                value: f(value),
                failures,
            },
            Self::Failure { error, failures } => FetchOutcome::Failure { error, failures },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_failure_list_collapses_to_success() {
        let outcome = FetchOutcome::from_parts(vec![1, 2, 3], Vec::new());
        assert!(outcome.is_success());
        assert!(outcome.failures().is_empty());
    }

    #[test]
    fn partial_keeps_value_and_failures() {
        let failures = vec![ItemFailure::new("000002", FetchError::AllRowsUnparsable)];
        let outcome = FetchOutcome::from_parts(vec![1], failures);

        assert!(!outcome.is_success());
        assert!(outcome.is_usable());
        assert_eq!(outcome.value(), Some(&vec![1]));
        assert_eq!(outcome.failures().len(), 1);
    }

    #[test]
    fn failure_carries_no_value() {
        let outcome: FetchOutcome<Vec<u8>> = FetchOutcome::failure(FetchError::Timeout);
        assert!(!outcome.is_usable());
        assert!(outcome.value().is_none());
        assert_eq!(outcome.error(), Some(&FetchError::Timeout));
    }

    #[test]
    fn outcomes_round_trip_through_json() {
        let outcome = FetchOutcome::from_parts(
            vec![String::from("600519.SH")],
            vec![ItemFailure::new(
                "N/A",
                FetchError::UnparsableWeight {
                    raw: String::from("N/A"),
                },
            )],
        );

        let json = serde_json::to_string(&outcome).expect("serializes");
        let back: FetchOutcome<Vec<String>> = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(back, outcome);
    }
}
