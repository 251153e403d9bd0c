//! Rounding rules for money, factors and percentages.

use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places kept for currency amounts.
pub const MONEY_DP: u32 = 2;

/// Decimal places kept for attendance factors.
pub const FACTOR_DP: u32 = 4;

/// Rounds a currency amount to cents, half away from zero.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::round_money;
/// use rust_decimal::Decimal;
///
/// assert_eq!(round_money(Decimal::new(12345, 3)), Decimal::new(1235, 2));
/// ```
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds an attendance factor to four places, half away from zero.
pub fn round_factor(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(FACTOR_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Returns `part / whole × 100` rounded to two places, or zero when `whole` is zero.
pub fn percentage(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    (part / whole * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_round_money_midpoint_goes_away_from_zero() {
        assert_eq!(round_money(dec("2.345")), dec("2.35"));
        assert_eq!(round_money(dec("-2.345")), dec("-2.35"));
        assert_eq!(round_money(dec("2.344")), dec("2.34"));
    }

    #[test]
    fn test_round_factor_keeps_four_places() {
        assert_eq!(round_factor(dec("0.666666")), dec("0.6667"));
        assert_eq!(round_factor(dec("0.75")), dec("0.75"));
    }

    #[test]
    fn test_percentage_guards_zero_whole() {
        assert_eq!(percentage(dec("3"), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_percentage_rounds_to_two_places() {
        assert_eq!(percentage(dec("1"), dec("3")), dec("33.33"));
        assert_eq!(percentage(dec("2"), dec("3")), dec("66.67"));
        assert_eq!(percentage(dec("4"), dec("4")), dec("100"));
    }
}
