//! Money input handling.
//!
//! Prices arrive either as JSON numbers or as strings typed by people who use
//! a comma as the decimal separator ("150,00", "1.250,90"). Both forms are
//! normalised to a positive `Decimal` with two fractional digits.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize, Serializer};
use std::str::FromStr;
use validator::ValidationError;

/// Largest value a NUMERIC(10,2) column holds.
pub const MAX_MONEY: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2); // 99_999_999.99

pub const PRICE_MESSAGE: &str = "Price must be a positive number";
pub const PRICE_NUMBER_MESSAGE: &str = "Price must be positive";

/// A price as submitted by a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceValue {
    Number(serde_json::Number),
    Text(String),
}

impl Default for PriceValue {
    fn default() -> Self {
        PriceValue::Text(String::new())
    }
}

impl From<Decimal> for PriceValue {
    fn from(value: Decimal) -> Self {
        PriceValue::Text(value.to_string())
    }
}

impl PriceValue {
    /// Canonical two-decimal value, or the message explaining the rejection.
    pub fn normalize(&self) -> Result<Decimal, &'static str> {
        match self {
            PriceValue::Number(n) => {
                parse_plain(&n.to_string()).map_err(|_| PRICE_NUMBER_MESSAGE).and_then(|d| {
                    finish(d).map_err(|e| if e == PRICE_MESSAGE { PRICE_NUMBER_MESSAGE } else { e })
                })
            }
            PriceValue::Text(s) => {
                let canonical = canonical_separators(s.trim()).ok_or(PRICE_MESSAGE)?;
                let parsed = parse_plain(&canonical).map_err(|_| PRICE_MESSAGE)?;
                finish(parsed)
            }
        }
    }
}

/// Rewrites `raw` so that `.` is the only (decimal) separator.
///
/// When both `,` and `.` appear, whichever occurs last is the decimal
/// separator and the other is grouping. A separator that appears more than
/// once on its own is grouping.
fn canonical_separators(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }

    let last_comma = raw.rfind(',');
    let last_dot = raw.rfind('.');

    let decimal_sep = match (last_comma, last_dot) {
        (Some(c), Some(d)) => Some(if c > d { ',' } else { '.' }),
        (Some(_), None) if raw.matches(',').count() == 1 => Some(','),
        (None, Some(_)) if raw.matches('.').count() == 1 => Some('.'),
        _ => None,
    };

    if let Some(sep) = decimal_sep {
        if raw.matches(sep).count() > 1 {
            return None;
        }
    }

    let out: String = raw
        .chars()
        .filter_map(|c| match c {
            ',' | '.' if Some(c) == decimal_sep => Some('.'),
            ',' | '.' => None,
            other => Some(other),
        })
        .collect();

    Some(out)
}

fn parse_plain(s: &str) -> Result<Decimal, rust_decimal::Error> {
    Decimal::from_str(s).or_else(|_| Decimal::from_scientific(s))
}

fn finish(value: Decimal) -> Result<Decimal, &'static str> {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if rounded <= Decimal::ZERO {
        return Err(PRICE_MESSAGE);
    }
    if rounded > MAX_MONEY {
        return Err("Price is too large");
    }
    rounded.rescale(2);
    Ok(rounded)
}

/// `validator` hook for required and optional price fields.
pub fn validate_price(value: &PriceValue) -> Result<(), ValidationError> {
    value.normalize().map(|_| ()).map_err(|message| {
        let mut err = ValidationError::new("price");
        err.message = Some(message.into());
        err
    })
}

/// Serializes money as a string with exactly two fractional digits.
pub fn serialize_money<S>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut v = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    v.rescale(2);
    serializer.serialize_str(&v.to_string())
}
