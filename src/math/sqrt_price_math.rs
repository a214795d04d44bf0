use crate::error::{Error, MathError, StateError};
use crate::math::math_helpers::{div_rounding_up, full_mul, unlikely};
use crate::math::tick_math::{MAX_SQRT_PRICE, MIN_SQRT_PRICE};
use alloy_primitives::U256;

/// Amount of token A held between two √prices at a given liquidity:
/// `L * (√P_hi - √P_lo) / (√P_hi * √P_lo)`, optionally rounded up.
///
/// Returned as a `U256` so callers can compare against a remaining
/// budget before narrowing to `u64`.
pub fn get_delta_a(
    sqrt_price_0: u128,
    sqrt_price_1: u128,
    liquidity: u128,
    round_up: bool,
) -> Result<U256, Error> {
    let (lo, hi) = if sqrt_price_0 <= sqrt_price_1 {
        (sqrt_price_0, sqrt_price_1)
    } else {
        (sqrt_price_1, sqrt_price_0)
    };
    let diff = hi - lo;
    if diff == 0 || liquidity == 0 {
        return Ok(U256::ZERO);
    }
    if unlikely(lo == 0) {
        return Err(StateError::InvalidSqrtPrice.into());
    }

    let numerator = full_mul(liquidity, diff);
    if numerator.leading_zeros() < 64 {
        return Err(MathError::MultiplicationOverflow.into());
    }
    let numerator = numerator << 64;
    let denominator = full_mul(hi, lo);

    if round_up {
        div_rounding_up(numerator, denominator).map_err(Error::from)
    } else {
        Ok(numerator / denominator)
    }
}

/// Amount of token B held between two √prices at a given liquidity:
/// `L * (√P_hi - √P_lo) >> 64`, optionally rounded up.
pub fn get_delta_b(
    sqrt_price_0: u128,
    sqrt_price_1: u128,
    liquidity: u128,
    round_up: bool,
) -> Result<U256, Error> {
    let diff = sqrt_price_0.abs_diff(sqrt_price_1);
    if diff == 0 || liquidity == 0 {
        return Ok(U256::ZERO);
    }

    let product = full_mul(liquidity, diff);
    let mut quotient = product >> 64;
    if round_up && !(product & U256::from(u64::MAX)).is_zero() {
        quotient += U256::ONE;
    }
    Ok(quotient)
}

/// Next √price after adding (`by_add`) or removing token A, rounded up
/// so the move always favours the pool:
/// `L * √P << 64 / (L << 64 ± amount * √P)`.
pub fn get_next_sqrt_price_a_up(
    sqrt_price: u128,
    liquidity: u128,
    amount: u64,
    by_add: bool,
) -> Result<u128, Error> {
    if amount == 0 {
        return Ok(sqrt_price);
    }

    let numerator = full_mul(liquidity, sqrt_price);
    if numerator.leading_zeros() < 64 {
        return Err(MathError::MultiplicationOverflow.into());
    }
    let numerator = numerator << 64;
    let liquidity_shl: U256 = U256::from(liquidity) << 64;
    let product = full_mul(amount as u128, sqrt_price);

    let denominator = if by_add {
        liquidity_shl + product
    } else {
        liquidity_shl
            .checked_sub(product)
            .ok_or(StateError::NotEnoughLiquidity)?
    };

    let next = u128::try_from(div_rounding_up(numerator, denominator)?)
        .map_err(|_| MathError::MultiplicationOverflow)?;
    check_sqrt_price_in_range(next)?;
    Ok(next)
}

/// Next √price after adding (`by_add`) or removing token B:
/// `√P ± (amount << 64) / L`, with the delta rounded against the user.
pub fn get_next_sqrt_price_b_down(
    sqrt_price: u128,
    liquidity: u128,
    amount: u64,
    by_add: bool,
) -> Result<u128, Error> {
    if liquidity == 0 {
        return Err(StateError::LiquidityZero.into());
    }
    let numerator = U256::from(amount) << 64;
    let liquidity = U256::from(liquidity);

    // adding B rounds the price delta down, removing B rounds it up
    let delta = if by_add {
        numerator / liquidity
    } else {
        div_rounding_up(numerator, liquidity)?
    };
    let delta = u128::try_from(delta).map_err(|_| MathError::MultiplicationOverflow)?;

    let next = if by_add {
        sqrt_price
            .checked_add(delta)
            .ok_or(MathError::MultiplicationOverflow)?
    } else {
        sqrt_price
            .checked_sub(delta)
            .ok_or(StateError::NotEnoughLiquidity)?
    };
    check_sqrt_price_in_range(next)?;
    Ok(next)
}

/// Next √price when swapping `amount_in` *into* the pool, choosing the
/// correct branch for token A/token B depending on the direction.
pub fn get_next_sqrt_price_from_input(
    sqrt_price: u128,
    liquidity: u128,
    amount_in: u64,
    a_to_b: bool,
) -> Result<u128, Error> {
    if unlikely(liquidity == 0) {
        return Err(StateError::LiquidityZero.into());
    }
    if a_to_b {
        get_next_sqrt_price_a_up(sqrt_price, liquidity, amount_in, true)
    } else {
        get_next_sqrt_price_b_down(sqrt_price, liquidity, amount_in, true)
    }
}

/// Next √price when swapping `amount_out` *out of* the pool.
pub fn get_next_sqrt_price_from_output(
    sqrt_price: u128,
    liquidity: u128,
    amount_out: u64,
    a_to_b: bool,
) -> Result<u128, Error> {
    if unlikely(liquidity == 0) {
        return Err(StateError::LiquidityZero.into());
    }
    if a_to_b {
        get_next_sqrt_price_b_down(sqrt_price, liquidity, amount_out, false)
    } else {
        get_next_sqrt_price_a_up(sqrt_price, liquidity, amount_out, false)
    }
}

/// Input amount needed to move the price between the two bounds,
/// rounded up (the swapper owes the pool).
pub fn get_delta_up_from_input(
    sqrt_price_current: u128,
    sqrt_price_target: u128,
    liquidity: u128,
    a_to_b: bool,
) -> Result<U256, Error> {
    if a_to_b {
        get_delta_a(sqrt_price_current, sqrt_price_target, liquidity, true)
    } else {
        get_delta_b(sqrt_price_current, sqrt_price_target, liquidity, true)
    }
}

/// Output amount released by moving the price between the two bounds,
/// rounded down (the pool owes the swapper).
pub fn get_delta_down_from_output(
    sqrt_price_current: u128,
    sqrt_price_target: u128,
    liquidity: u128,
    a_to_b: bool,
) -> Result<U256, Error> {
    if a_to_b {
        get_delta_b(sqrt_price_current, sqrt_price_target, liquidity, false)
    } else {
        get_delta_a(sqrt_price_current, sqrt_price_target, liquidity, false)
    }
}

#[inline(always)]
fn check_sqrt_price_in_range(sqrt_price: u128) -> Result<(), StateError> {
    if (MIN_SQRT_PRICE..=MAX_SQRT_PRICE).contains(&sqrt_price) {
        Ok(())
    } else {
        Err(StateError::InvalidSqrtPrice)
    }
}
