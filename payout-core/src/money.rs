//! Turning registrar-supplied amounts into [`Decimal`] values.
//!
//! Registrar files carry brokerage as free text: `₹1,23,456.78`,
//! `Rs. 500`, `INR 12,000.50`, or `(250.00)` for reversals. Everything
//! downstream of this module works on [`Decimal`], which is always finite,
//! so parse failures surface here as [`PayoutError::InvalidAmount`].

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

use crate::PayoutError;

static CURRENCY_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)₹|\brs\.?|\binr\b").expect("currency marker pattern is valid")
});

// Western (1,234,567) and Indian (12,34,567) grouping, or no grouping at all.
static AMOUNT_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(\d{1,3}(,\d{2,3})*|\d+)(\.\d+)?$").expect("amount pattern is valid")
});

/// Parses a registrar-formatted amount.
///
/// Currency markers and grouping commas are stripped; an amount wrapped in
/// parentheses is negative.
///
/// # Errors
///
/// Returns [`PayoutError::InvalidAmount`] for empty input or anything that is
/// not a number once markers are removed.
///
/// ```
/// use rust_decimal_macros::dec;
/// use payout_core::money::parse_amount;
///
/// assert_eq!(parse_amount("₹1,23,456.78").unwrap(), dec!(123456.78));
/// assert_eq!(parse_amount("Rs. 500").unwrap(), dec!(500));
/// assert_eq!(parse_amount("(250.00)").unwrap(), dec!(-250.00));
/// assert!(parse_amount("n/a").is_err());
/// ```
pub fn parse_amount(input: &str) -> Result<Decimal, PayoutError> {
    let trimmed = input.trim();
    let (negated, body) = match trimmed
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
    {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };

    let stripped = CURRENCY_MARKER.replace_all(body, "");
    let compact: String = stripped.chars().filter(|c| !c.is_whitespace()).collect();

    if compact.is_empty() {
        return Err(PayoutError::InvalidAmount(format!("'{input}' is empty")));
    }
    if !AMOUNT_SHAPE.is_match(&compact) {
        tracing::debug!(input = %input, "rejected malformed amount");
        return Err(PayoutError::InvalidAmount(format!("'{input}' is not a number")));
    }

    let value: Decimal = compact
        .replace(',', "")
        .parse()
        .map_err(|e| PayoutError::InvalidAmount(format!("'{input}': {e}")))?;

    Ok(if negated { -value } else { value })
}

/// Converts a floating-point amount, rejecting NaN and infinities.
///
/// # Errors
///
/// Returns [`PayoutError::InvalidAmount`] when `value` is not finite or is
/// outside the range a [`Decimal`] can hold.
///
/// ```
/// use payout_core::money::amount_from_f64;
///
/// assert!(amount_from_f64(1250.75).is_ok());
/// assert!(amount_from_f64(f64::NAN).is_err());
/// ```
pub fn amount_from_f64(value: f64) -> Result<Decimal, PayoutError> {
    if !value.is_finite() {
        return Err(PayoutError::InvalidAmount(format!("{value} is not finite")));
    }
    Decimal::try_from(value).map_err(|e| PayoutError::InvalidAmount(format!("{value}: {e}")))
}
