use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::NormalizeError;

const CODE_BODY_LEN: usize = 6;

/// Suffix for open-ended funds on the fund market.
const FUND_SUFFIX: &str = "OF";

const SECURITY_SUFFIXES: [&str; 3] = ["SH", "SZ", "BJ"];

/// Canonical exchange-qualified fund identifier, e.g. `000001.OF`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FundCode(String);

impl FundCode {
    /// Normalize a raw provider code to canonical form.
    ///
    /// Accepts a bare 6-digit code (`"000001"`) or an already-canonical
    /// code (`"000001.OF"`). Normalization is idempotent: canonical
    /// input is returned unchanged.
    pub fn normalize(raw: &str) -> Result<Self, NormalizeError> {
        let trimmed = raw.trim();

        let body = match trimmed.split_once('.') {
            Some((body, suffix)) if suffix.eq_ignore_ascii_case(FUND_SUFFIX) => body,
            Some(_) => {
                return Err(NormalizeError::InvalidCodeFormat {
                    raw: raw.to_string(),
                })
            }
            None => trimmed,
        };

        if body.len() != CODE_BODY_LEN || !body.bytes().all(|b| b.is_ascii_digit()) {
            return Err(NormalizeError::InvalidCodeFormat {
                raw: raw.to_string(),
            });
        }

        Ok(Self(format!("{body}.{FUND_SUFFIX}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The 6-digit numeric body without the exchange suffix, as the
    /// upstream provider expects it in request parameters.
    pub fn body(&self) -> &str {
        &self.0[..CODE_BODY_LEN]
    }
}

impl Display for FundCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for FundCode {
    type Error = NormalizeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::normalize(&value)
    }
}

impl TryFrom<&str> for FundCode {
    type Error = NormalizeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::normalize(value)
    }
}

impl From<FundCode> for String {
    fn from(value: FundCode) -> Self {
        value.0
    }
}

/// Exchange-qualified security ticker, e.g. `600519.SH`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SecurityCode(String);

impl SecurityCode {
    /// Normalize a raw security code to its exchange-qualified form.
    ///
    /// The exchange is inferred from the leading digit: `6` lists on
    /// Shanghai, `0` and `3` on Shenzhen, `4` and `8` on the Beijing
    /// board. Already-qualified input with a known suffix is validated
    /// and returned unchanged, so normalization is idempotent.
    pub fn normalize(raw: &str) -> Result<Self, NormalizeError> {
        let trimmed = raw.trim();

        if let Some((body, suffix)) = trimmed.split_once('.') {
            let suffix = suffix.to_ascii_uppercase();
            if !SECURITY_SUFFIXES.contains(&suffix.as_str()) {
                return Err(NormalizeError::UnknownExchangePrefix {
                    raw: raw.to_string(),
                });
            }
            validate_body(body, raw)?;
            return Ok(Self(format!("{body}.{suffix}")));
        }

        validate_body(trimmed, raw)?;
        let suffix = match trimmed.as_bytes()[0] {
            b'6' => "SH",
            b'0' | b'3' => "SZ",
            b'4' | b'8' => "BJ",
            _ => {
                return Err(NormalizeError::UnknownExchangePrefix {
                    raw: raw.to_string(),
                })
            }
        };

        Ok(Self(format!("{trimmed}.{suffix}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn validate_body(body: &str, raw: &str) -> Result<(), NormalizeError> {
    if body.len() != CODE_BODY_LEN || !body.bytes().all(|b| b.is_ascii_digit()) {
        return Err(NormalizeError::InvalidCodeFormat {
            raw: raw.to_string(),
        });
    }
    Ok(())
}

impl Display for SecurityCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for SecurityCode {
    type Error = NormalizeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::normalize(&value)
    }
}

impl TryFrom<&str> for SecurityCode {
    type Error = NormalizeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::normalize(value)
    }
}

impl From<SecurityCode> for String {
    fn from(value: SecurityCode) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fund_code_appends_suffix_and_trims() {
        let code = FundCode::normalize(" 000001 ").expect("valid code");
        assert_eq!(code.as_str(), "000001.OF");
        assert_eq!(code.body(), "000001");
    }

    #[test]
    fn fund_code_normalization_is_idempotent() {
        let once = FundCode::normalize("110022").expect("valid code");
        let twice = FundCode::normalize(once.as_str()).expect("canonical input stays valid");
        assert_eq!(once, twice);
    }

    #[test]
    fn fund_code_rejects_wrong_length_and_charset() {
        assert!(FundCode::normalize("12345").is_err());
        assert!(FundCode::normalize("1234567").is_err());
        assert!(FundCode::normalize("00a001").is_err());
        assert!(FundCode::normalize("000001.SH").is_err());
        assert!(FundCode::normalize("").is_err());
    }

    #[test]
    fn security_code_maps_prefix_to_exchange() {
        assert_eq!(
            SecurityCode::normalize("600519").expect("valid").as_str(),
            "600519.SH"
        );
        assert_eq!(
            SecurityCode::normalize("000858").expect("valid").as_str(),
            "000858.SZ"
        );
        assert_eq!(
            SecurityCode::normalize("300750").expect("valid").as_str(),
            "300750.SZ"
        );
        assert_eq!(
            SecurityCode::normalize("830799").expect("valid").as_str(),
            "830799.BJ"
        );
    }

    #[test]
    fn security_code_normalization_is_idempotent() {
        let once = SecurityCode::normalize("600519").expect("valid");
        let twice = SecurityCode::normalize(once.as_str()).expect("canonical stays valid");
        assert_eq!(once, twice);
    }

    #[test]
    fn security_code_rejects_unknown_prefix() {
        let error = SecurityCode::normalize("900001").expect_err("B-share prefix is unmapped");
        assert!(matches!(error, NormalizeError::UnknownExchangePrefix { .. }));

        let error = SecurityCode::normalize("600519.XX").expect_err("unknown suffix");
        assert!(matches!(error, NormalizeError::UnknownExchangePrefix { .. }));
    }
}
