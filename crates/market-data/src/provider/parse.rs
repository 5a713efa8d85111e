//! Lenient numeric parsing for provider payloads.
//!
//! Vendors disagree on whether numbers are JSON numbers or strings, and
//! some append a `%` to percent fields. Everything funnels into `Decimal`.

use std::str::FromStr;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::Deserialize;

/// A JSON value that is either a number or a numeric string.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub(crate) enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    pub(crate) fn to_decimal(&self) -> Option<Decimal> {
        match self {
            Numeric::Number(n) => decimal_from_f64(*n),
            Numeric::Text(s) => parse_decimal(s),
        }
    }

    pub(crate) fn to_volume(&self) -> Option<u64> {
        match self {
            Numeric::Number(n) => volume_from_f64(*n),
            Numeric::Text(s) => parse_volume(s),
        }
    }
}

/// Parse a decimal, tolerating surrounding whitespace and a trailing `%`.
pub(crate) fn parse_decimal(s: &str) -> Option<Decimal> {
    let trimmed = s.trim().trim_end_matches('%').trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed)
        .ok()
        .or_else(|| trimmed.parse::<f64>().ok().and_then(decimal_from_f64))
}

/// Go through the shortest round-trip string so `4.17` stays `4.17`
/// instead of picking up binary noise.
pub(crate) fn decimal_from_f64(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_str(&value.to_string())
        .ok()
        .or_else(|| Decimal::from_f64(value))
}

/// Volumes sometimes arrive as `"12345.0"`; truncate to whole shares.
pub(crate) fn parse_volume(s: &str) -> Option<u64> {
    let trimmed = s.trim();
    trimmed
        .parse::<u64>()
        .ok()
        .or_else(|| trimmed.parse::<f64>().ok().and_then(volume_from_f64))
}

pub(crate) fn volume_from_f64(value: f64) -> Option<u64> {
    if value.is_finite() && value >= 0.0 {
        Decimal::from_f64(value.trunc()).and_then(|d| d.to_u64())
    } else {
        None
    }
}
