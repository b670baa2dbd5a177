//! Cent-level rounding shared by the payout calculations.
//!
//! Two distinct rules are in play and must not be mixed up: expense and net
//! pool use [`round_half_up`], per-level shares use [`floor_cents`].

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// Values at exactly 0.005 are rounded up to 0.01 (away from zero).
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use payout_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(185.184)), dec!(185.18));
/// assert_eq!(round_half_up(dec!(185.185)), dec!(185.19));
/// assert_eq!(round_half_up(dec!(-185.185)), dec!(-185.19)); // Away from zero
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    to_cents(value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

/// Floors a decimal value to two decimal places.
///
/// Equivalent to `floor(value × 100) / 100`, so negative values move away
/// from zero (`-0.001` becomes `-0.01`). Negative shares only arise from a
/// negative gross or a negative percentage.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use payout_core::calculations::common::floor_cents;
///
/// assert_eq!(floor_cents(dec!(346.2954)), dec!(346.29));
/// assert_eq!(floor_cents(dec!(127.50)), dec!(127.50));
/// assert_eq!(floor_cents(dec!(-0.001)), dec!(-0.01));
/// ```
pub fn floor_cents(value: Decimal) -> Decimal {
    to_cents(value.round_dp_with_strategy(2, RoundingStrategy::ToNegativeInfinity))
}

// Pads an already-rounded value so it always carries two decimal places.
fn to_cents(mut rounded: Decimal) -> Decimal {
    rounded.rescale(2);
    rounded
}

/// `value × pct / 100`, or `None` on overflow.
pub(crate) fn percent_of(
    value: Decimal,
    pct: Decimal,
) -> Option<Decimal> {
    value.checked_mul(pct)?.checked_div(Decimal::ONE_HUNDRED)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    // =========================================================================
    // round_half_up tests
    // =========================================================================

    #[test]
    fn round_half_up_rounds_down_below_midpoint() {
        assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
    }

    #[test]
    fn round_half_up_rounds_up_at_midpoint() {
        assert_eq!(round_half_up(dec!(0.125)), dec!(0.13));
    }

    #[test]
    fn round_half_up_handles_negative_values() {
        assert_eq!(round_half_up(dec!(-0.125)), dec!(-0.13));
    }

    #[test]
    fn round_half_up_carries_into_whole_units() {
        assert_eq!(round_half_up(dec!(999999.995)), dec!(1000000.00));
    }

    // =========================================================================
    // floor_cents tests
    // =========================================================================

    #[test]
    fn floor_cents_truncates_positive_fractions() {
        assert_eq!(floor_cents(dec!(33.0033)), dec!(33.00));
        assert_eq!(floor_cents(dec!(0.019)), dec!(0.01));
    }

    #[test]
    fn floor_cents_never_rounds_up() {
        assert_eq!(floor_cents(dec!(12.999999)), dec!(12.99));
    }

    #[test]
    fn floor_cents_moves_negative_values_down() {
        assert_eq!(floor_cents(dec!(-12.341)), dec!(-12.35));
    }

    #[test]
    fn rounded_values_always_carry_two_places() {
        assert_eq!(round_half_up(dec!(150)).to_string(), "150.00");
        assert_eq!(floor_cents(dec!(127.5)).to_string(), "127.50");
    }

    #[test]
    fn floor_cents_preserves_exact_cents() {
        assert_eq!(floor_cents(dec!(42.50)), dec!(42.50));
        assert_eq!(floor_cents(Decimal::ZERO), Decimal::ZERO);
    }

    // =========================================================================
    // percent_of tests
    // =========================================================================

    #[test]
    fn percent_of_scales_by_hundred() {
        assert_eq!(percent_of(dec!(850), dec!(15)), Some(dec!(127.5)));
    }

    #[test]
    fn percent_of_reports_overflow() {
        assert_eq!(percent_of(Decimal::MAX, dec!(200)), None);
    }
}
