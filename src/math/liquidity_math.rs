use crate::error::{Error, MathError, StateError};
use crate::math::math_helpers::{checked_u64, full_mul, mul_div_floor};
use crate::math::sqrt_price_math::{get_delta_a, get_delta_b};
use crate::math::tick_math::get_sqrt_price_at_tick;
use alloy_primitives::U256;

/// Applies a signed liquidity delta to an unsigned total.
pub fn add_delta(x: u128, y: i128) -> Result<u128, MathError> {
    if y < 0 {
        x.checked_sub(y.unsigned_abs())
            .ok_or(MathError::LiquidityUnderflow)
    } else {
        x.checked_add(y as u128)
            .ok_or(MathError::LiquidityOverflow)
    }
}

/// Token amounts backing `liquidity` over `[tick_lower, tick_upper)`
/// given the pool's current tick and √price.
///
/// Three regions: entirely above the current tick is all A, entirely
/// below is all B, and a straddling range holds both. `round_up` is
/// set when the amounts are owed to the pool.
pub fn get_amounts_for_liquidity(
    sqrt_price_current: u128,
    tick_current: i32,
    tick_lower: i32,
    tick_upper: i32,
    liquidity: u128,
    round_up: bool,
) -> Result<(u64, u64), Error> {
    let sqrt_price_lower = get_sqrt_price_at_tick(tick_lower)?;
    let sqrt_price_upper = get_sqrt_price_at_tick(tick_upper)?;

    let (amount_a, amount_b) = if tick_current < tick_lower {
        (
            get_delta_a(sqrt_price_lower, sqrt_price_upper, liquidity, round_up)?,
            U256::ZERO,
        )
    } else if tick_current < tick_upper {
        (
            get_delta_a(sqrt_price_current, sqrt_price_upper, liquidity, round_up)?,
            get_delta_b(sqrt_price_lower, sqrt_price_current, liquidity, round_up)?,
        )
    } else {
        (
            U256::ZERO,
            get_delta_b(sqrt_price_lower, sqrt_price_upper, liquidity, round_up)?,
        )
    };

    Ok((checked_u64(amount_a)?, checked_u64(amount_b)?))
}

/// Inverts the region formula: from a fixed amount of one token,
/// derives the liquidity it buys over the range and the matching
/// amount of the other token.
///
/// Returns `(delta_liquidity, amount_a, amount_b)`. Liquidity rounds
/// down and the counterpart amount rounds up, both in the pool's
/// favour. Fixing a token the range cannot absorb fails with
/// `AmountIncorrect`.
pub fn get_liquidity_from_amount(
    amount: u64,
    tick_lower: i32,
    tick_upper: i32,
    tick_current: i32,
    sqrt_price_current: u128,
    fix_amount_a: bool,
) -> Result<(u128, u64, u64), Error> {
    let sqrt_price_lower = get_sqrt_price_at_tick(tick_lower)?;
    let sqrt_price_upper = get_sqrt_price_at_tick(tick_upper)?;

    if fix_amount_a {
        let (bound_lower, bound_upper) = if tick_current < tick_lower {
            (sqrt_price_lower, sqrt_price_upper)
        } else if tick_current < tick_upper {
            (sqrt_price_current, sqrt_price_upper)
        } else {
            return Err(StateError::AmountIncorrect.into());
        };

        // invert delta_a: L = amount * (lo * hi >> 64) / (hi - lo)
        let geometric = checked_u128_shifted(full_mul(bound_lower, bound_upper))?;
        let liquidity = mul_div_floor(amount as u128, geometric, bound_upper - bound_lower)?;

        let amount_b = if tick_current < tick_lower {
            0
        } else {
            checked_u64(get_delta_b(
                sqrt_price_lower,
                sqrt_price_current,
                liquidity,
                true,
            )?)?
        };
        Ok((liquidity, amount, amount_b))
    } else {
        let (bound_lower, bound_upper) = if tick_current >= tick_upper {
            (sqrt_price_lower, sqrt_price_upper)
        } else if tick_current >= tick_lower {
            (sqrt_price_lower, sqrt_price_current)
        } else {
            return Err(StateError::AmountIncorrect.into());
        };

        // invert delta_b: L = (amount << 64) / (hi - lo); a price sitting
        // exactly on the lower bound leaves no room for B
        if bound_upper == bound_lower {
            return Err(StateError::AmountIncorrect.into());
        }
        let liquidity = u128::try_from(
            (U256::from(amount) << 64) / U256::from(bound_upper - bound_lower),
        )
        .map_err(|_| MathError::MultiplicationOverflow)?;

        let amount_a = if tick_current >= tick_upper {
            0
        } else {
            checked_u64(get_delta_a(
                sqrt_price_current,
                sqrt_price_upper,
                liquidity,
                true,
            )?)?
        };
        Ok((liquidity, amount_a, amount))
    }
}

#[inline(always)]
fn checked_u128_shifted(product: U256) -> Result<u128, MathError> {
    u128::try_from(product >> 64).map_err(|_| MathError::MultiplicationOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Q64;

    #[test]
    fn add_delta_adds_positive_delta() {
        assert_eq!(add_delta(100, 20).unwrap(), 120);
    }

    #[test]
    fn add_delta_subtracts_negative_delta() {
        assert_eq!(add_delta(100, -20).unwrap(), 80);
    }

    #[test]
    fn add_delta_zero_delta_returns_same() {
        assert_eq!(add_delta(123_456_789, 0).unwrap(), 123_456_789);
    }

    #[test]
    fn add_delta_positive_overflow() {
        assert!(matches!(
            add_delta(u128::MAX, 1),
            Err(MathError::LiquidityOverflow)
        ));
    }

    #[test]
    fn add_delta_negative_no_underflow_at_boundary() {
        assert_eq!(add_delta(1_000, -1_000).unwrap(), 0);
    }

    #[test]
    fn add_delta_negative_underflow() {
        assert!(matches!(
            add_delta(100, -200),
            Err(MathError::LiquidityUnderflow)
        ));
    }

    #[test]
    fn amounts_below_range_are_all_a() {
        let (a, b) =
            get_amounts_for_liquidity(Q64, 0, 100, 200, 10u128.pow(12), true).unwrap();
        assert!(a > 0);
        assert_eq!(b, 0);
    }

    #[test]
    fn amounts_above_range_are_all_b() {
        let (a, b) =
            get_amounts_for_liquidity(Q64, 0, -200, -100, 10u128.pow(12), true).unwrap();
        assert_eq!(a, 0);
        assert!(b > 0);
    }

    #[test]
    fn amounts_in_range_hold_both() {
        let (a, b) =
            get_amounts_for_liquidity(Q64, 0, -100, 100, 10u128.pow(12), true).unwrap();
        assert!(a > 0);
        assert!(b > 0);
    }

    #[test]
    fn round_up_dominates_round_down() {
        let liquidity = 987_654_321_987u128;
        let up = get_amounts_for_liquidity(Q64, 0, -100, 100, liquidity, true).unwrap();
        let down = get_amounts_for_liquidity(Q64, 0, -100, 100, liquidity, false).unwrap();
        assert!(up.0 >= down.0 && up.0 - down.0 <= 1);
        assert!(up.1 >= down.1 && up.1 - down.1 <= 1);
    }

    #[test]
    fn fix_a_round_trips_through_amounts() {
        let amount_a = 1_000_000u64;
        let (liquidity, got_a, got_b) =
            get_liquidity_from_amount(amount_a, -100, 100, 0, Q64, true).unwrap();
        assert_eq!(got_a, amount_a);
        assert!(liquidity > 0);
        assert!(got_b > 0);

        // the fixed side is never exceeded by the forward conversion
        let (need_a, _need_b) =
            get_amounts_for_liquidity(Q64, 0, -100, 100, liquidity, true).unwrap();
        assert!(need_a <= amount_a);
    }

    #[test]
    fn fix_b_round_trips_through_amounts() {
        let amount_b = 1_000_000u64;
        let (liquidity, got_a, got_b) =
            get_liquidity_from_amount(amount_b, -100, 100, 0, Q64, false).unwrap();
        assert_eq!(got_b, amount_b);
        assert!(liquidity > 0);
        assert!(got_a > 0);

        let (_need_a, need_b) =
            get_amounts_for_liquidity(Q64, 0, -100, 100, liquidity, true).unwrap();
        assert!(need_b <= amount_b);
    }

    #[test]
    fn fix_token_on_the_wrong_side_fails() {
        // current tick above the range: no A can be placed
        let sqrt_price = get_sqrt_price_at_tick(300).unwrap();
        let result = get_liquidity_from_amount(1_000, -100, 100, 300, sqrt_price, true);
        assert!(matches!(
            result,
            Err(Error::StateError(StateError::AmountIncorrect))
        ));

        // current tick below the range: no B can be placed
        let sqrt_price = get_sqrt_price_at_tick(-300).unwrap();
        let result = get_liquidity_from_amount(1_000, -100, 100, -300, sqrt_price, false);
        assert!(matches!(
            result,
            Err(Error::StateError(StateError::AmountIncorrect))
        ));
    }
}
