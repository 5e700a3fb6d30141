//! Pure normalization helpers for malformed provider fields.
//!
//! The upstream provider reports portfolio weights in three formats,
//! sometimes within a single response: a percentage string with a
//! trailing `%`, a bare percentage number, or a bare fraction.
//! [`parse_weight`] resolves all three to a decimal fraction.

use crate::{FundType, NormalizeError};

/// Tokens the provider appends to fund names that carry no information.
const NAME_NOISE_TOKENS: [&str; 3] = ["(前端)", "(后端)", "(场内)"];

/// Parse a provider weight field into a fraction in `[0, 1]`.
///
/// Accepted formats, all resolving to `0.0346`:
/// - `"3.46%"`: percentage with suffix
/// - `"3.46"`: bare number above 1, assumed to be a percentage
/// - `"0.0346"`: bare number at or below 1, taken as a fraction
///
/// Anything else (`"N/A"`, `"--"`, empty strings, negatives,
/// percentages above 100) fails with [`NormalizeError::UnparsableWeight`].
pub fn parse_weight(raw: &str) -> Result<f64, NormalizeError> {
    let unparsable = || NormalizeError::UnparsableWeight {
        raw: raw.to_string(),
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(unparsable());
    }

    let (body, explicit_percent) = match trimmed.strip_suffix('%') {
        Some(body) => (body.trim(), true),
        None => (trimmed, false),
    };

    let value: f64 = body.parse().map_err(|_| unparsable())?;
    if !value.is_finite() || value < 0.0 {
        return Err(unparsable());
    }

    let fraction = if explicit_percent || value > 1.0 {
        value / 100.0
    } else {
        value
    };

    if fraction > 1.0 {
        return Err(unparsable());
    }

    Ok(fraction)
}

/// Clean a provider-reported name: trim, collapse runs of whitespace
/// (including full-width U+3000), and strip known noise tokens.
pub fn normalize_name(raw: &str) -> String {
    let mut cleaned = raw.trim().trim_start_matches('*').to_string();

    for token in NAME_NOISE_TOKENS {
        cleaned = cleaned.replace(token, "");
    }

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Classify the provider's Chinese fund-type label.
///
/// Unrecognized labels map to [`FundType::Unknown`] rather than failing;
/// the label is descriptive metadata, not an identifier. The provider's
/// own catch-all category ("其他") maps to [`FundType::Other`].
pub fn classify_fund_type(label: &str) -> FundType {
    let label = label.trim();

    // Index funds also carry "股票型" in some labels, so check first.
    if label.contains("指数") || label.contains("联接") || label.contains("ETF") {
        FundType::Index
    } else if label.contains("股票") {
        FundType::Equity
    } else if label.contains("债券") || label.contains("定开债") {
        FundType::Bond
    } else if label.contains("混合") {
        FundType::Mixed
    } else if label.contains("货币") || label.contains("理财") {
        FundType::MoneyMarket
    } else if label.contains("其他") {
        FundType::Other
    } else {
        FundType::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weight_formats_resolve_to_the_same_fraction() {
        for raw in ["3.46%", "3.46", "0.0346", " 3.46 % "] {
            let fraction = parse_weight(raw).expect("parsable weight");
            assert!(
                (fraction - 0.0346).abs() < 1e-12,
                "raw '{raw}' parsed to {fraction}"
            );
        }
    }

    #[test]
    fn boundary_weights_parse() {
        assert_eq!(parse_weight("0").expect("zero"), 0.0);
        assert_eq!(parse_weight("1").expect("full fraction"), 1.0);
        assert_eq!(parse_weight("100%").expect("full percentage"), 1.0);
        assert_eq!(parse_weight("0.5").expect("half fraction"), 0.5);
        assert_eq!(parse_weight("50").expect("half percentage"), 0.5);
    }

    #[test]
    fn garbage_weights_are_rejected_not_zeroed() {
        for raw in ["N/A", "--", "", "  ", "-3.2", "250", "101%", "abc", "NaN", "inf"] {
            assert!(
                parse_weight(raw).is_err(),
                "raw '{raw}' should be unparsable"
            );
        }
    }

    #[test]
    fn names_are_trimmed_collapsed_and_denoised() {
        assert_eq!(normalize_name("  华夏成长  混合 "), "华夏成长 混合");
        assert_eq!(normalize_name("易方达消费行业(后端)"), "易方达消费行业");
        assert_eq!(normalize_name("*ST基金\u{3000}A"), "ST基金 A");
    }

    #[test]
    fn fund_type_labels_classify() {
        assert_eq!(classify_fund_type("股票型"), FundType::Equity);
        assert_eq!(classify_fund_type("债券型"), FundType::Bond);
        assert_eq!(classify_fund_type("混合型"), FundType::Mixed);
        assert_eq!(classify_fund_type("货币型"), FundType::MoneyMarket);
        assert_eq!(classify_fund_type("指数型-股票"), FundType::Index);
        assert_eq!(classify_fund_type("其他型"), FundType::Other);
    }

    #[test]
    fn unrecognized_or_absent_labels_are_unknown() {
        assert_eq!(classify_fund_type("QDII"), FundType::Unknown);
        assert_eq!(classify_fund_type("FOF"), FundType::Unknown);
        assert_eq!(classify_fund_type(""), FundType::Unknown);
        assert_eq!(classify_fund_type("  "), FundType::Unknown);
    }
}
