//! Decimal helpers for currency arithmetic.
//!
//! Amounts are never compared bit-exactly; every equality check goes
//! through [`approx_eq`] with the configured tolerance.

use rust_decimal::{Decimal, RoundingStrategy};

/// `true` when `a` and `b` differ by at most `tolerance`.
pub fn approx_eq(a: Decimal, b: Decimal, tolerance: Decimal) -> bool {
    (a - b).abs() <= tolerance
}

/// Round an amount to `scale` decimal places, halves away from zero.
pub fn round_to_scale(amount: Decimal, scale: u32) -> Decimal {
    amount.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
}

/// Split `total` in proportion to the non-negative `raw` portions, in whole
/// minor units, so the result sums to `total` exactly.
///
/// The portions are first rescaled to sum to `total`, then rounded toward
/// zero. The few minor units lost to rounding go back one each to the first
/// portions in order. No portion ends up negative or moves more than one
/// minor unit away from its rescaled value.
///
/// Any residual finer than one minor unit (a `total` carrying more precision
/// than `scale`) is folded into the first portion.
///
/// # Examples
///
/// ```
/// use expense_ledger::core::money::allocate;
/// use rust_decimal_macros::dec;
///
/// let third = dec!(100) / dec!(3);
/// let parts = allocate(dec!(100), &[third, third, third], 2);
/// assert_eq!(parts, vec![dec!(33.34), dec!(33.33), dec!(33.33)]);
/// ```
pub fn allocate(total: Decimal, raw: &[Decimal], scale: u32) -> Vec<Decimal> {
    if raw.is_empty() {
        return Vec::new();
    }

    let raw_sum: Decimal = raw.iter().sum();
    let factor = if raw_sum > Decimal::ZERO {
        total / raw_sum
    } else {
        Decimal::ONE
    };
    let mut parts: Vec<Decimal> = raw
        .iter()
        .map(|r| (*r * factor).round_dp_with_strategy(scale, RoundingStrategy::ToZero))
        .collect();

    let minor_unit = Decimal::new(1, scale);
    let residual = total - parts.iter().sum::<Decimal>();
    let units = (residual / minor_unit).trunc();
    if units > Decimal::ZERO {
        let n = Decimal::from(parts.len());
        let each = (units / n).trunc() * minor_unit;
        let extra = units % n;
        for (i, part) in parts.iter_mut().enumerate() {
            *part += each;
            if Decimal::from(i) < extra {
                *part += minor_unit;
            }
        }
    }

    let leftover = total - parts.iter().sum::<Decimal>();
    if !leftover.is_zero() {
        parts[0] += leftover;
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_approx_eq_within_tolerance() {
        assert!(approx_eq(dec!(99.995), dec!(100), dec!(0.01)));
        assert!(approx_eq(dec!(100.01), dec!(100), dec!(0.01)));
        assert!(!approx_eq(dec!(100.02), dec!(100), dec!(0.01)));
    }

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(round_to_scale(dec!(0.125), 2), dec!(0.13));
        assert_eq!(round_to_scale(dec!(-0.125), 2), dec!(-0.13));
    }

    #[test]
    fn test_allocate_exact_division() {
        let parts = allocate(dec!(90), &[dec!(30), dec!(30), dec!(30)], 2);
        assert_eq!(parts, vec![dec!(30), dec!(30), dec!(30)]);
    }

    #[test]
    fn test_allocate_two_thirds() {
        let two_thirds = dec!(2) / dec!(3);
        let parts = allocate(dec!(2), &[two_thirds, two_thirds, two_thirds], 2);
        assert_eq!(parts.iter().sum::<Decimal>(), dec!(2));
        assert_eq!(parts, vec![dec!(0.67), dec!(0.67), dec!(0.66)]);
    }

    #[test]
    fn test_allocate_rescales_raw_not_summing_to_total() {
        // 100.01% and 0% of a million
        let parts = allocate(dec!(1000000), &[dec!(1000100), dec!(0)], 2);
        assert_eq!(parts, vec![dec!(1000000), dec!(0)]);

        let parts = allocate(dec!(100), &[dec!(40), dec!(40)], 2);
        assert_eq!(parts, vec![dec!(50), dec!(50)]);
    }

    #[test]
    fn test_allocate_large_total_is_bounded() {
        let half = dec!(50005000);
        let parts = allocate(dec!(100000000), &[half, half], 2);
        assert_eq!(parts, vec![dec!(50000000), dec!(50000000)]);
    }

    #[test]
    fn test_allocate_zero_portion_stays_zero() {
        let parts = allocate(dec!(10), &[dec!(3.3333), dec!(0), dec!(6.6667)], 2);
        assert_eq!(parts[1], Decimal::ZERO);
        assert_eq!(parts.iter().sum::<Decimal>(), dec!(10));
        assert!(parts.iter().all(|p| *p >= Decimal::ZERO));
    }

    #[test]
    fn test_allocate_sub_unit_total() {
        let half = dec!(10.005) / dec!(2);
        let parts = allocate(dec!(10.005), &[half, half], 2);
        assert_eq!(parts.iter().sum::<Decimal>(), dec!(10.005));
    }

    #[test]
    fn test_allocate_empty() {
        assert!(allocate(dec!(10), &[], 2).is_empty());
    }
}
