use crate::error::MathError;
use alloy_primitives::U256;

#[cold]
const fn cold() {}

#[inline(always)]
pub(crate) const fn unlikely(b: bool) -> bool {
    if b {
        cold();
    }
    b
}

/// Full-width product of two `u128`s. Cannot overflow.
#[inline(always)]
pub fn full_mul(a: u128, b: u128) -> U256 {
    U256::from(a) * U256::from(b)
}

#[inline(always)]
pub fn checked_u128(value: U256) -> Result<u128, MathError> {
    u128::try_from(value).map_err(|_| MathError::MultiplicationOverflow)
}

#[inline(always)]
pub fn checked_u64(value: U256) -> Result<u64, MathError> {
    u64::try_from(value).map_err(|_| MathError::MultiplicationOverflow)
}

/// Computes `floor(a * b / denominator)` through a 256-bit intermediate.
///
/// This underpins most of the higher-level swap and liquidity
/// calculations; the result must fit back into 128 bits.
#[inline(always)]
pub fn mul_div_floor(a: u128, b: u128, denominator: u128) -> Result<u128, MathError> {
    if unlikely(denominator == 0) {
        return Err(MathError::DivByZero);
    }
    checked_u128(full_mul(a, b) / U256::from(denominator))
}

/// Like [`mul_div_floor`], but rounds the quotient up when there is a
/// non-zero remainder.
#[inline(always)]
pub fn mul_div_ceil(a: u128, b: u128, denominator: u128) -> Result<u128, MathError> {
    if unlikely(denominator == 0) {
        return Err(MathError::DivByZero);
    }
    let denominator = U256::from(denominator);
    checked_u128((full_mul(a, b) + (denominator - U256::ONE)) / denominator)
}

/// Like [`mul_div_floor`], but rounds half away from zero.
#[inline(always)]
pub fn mul_div_round(a: u128, b: u128, denominator: u128) -> Result<u128, MathError> {
    if unlikely(denominator == 0) {
        return Err(MathError::DivByZero);
    }
    let denominator = U256::from(denominator);
    checked_u128((full_mul(a, b) + (denominator >> 1)) / denominator)
}

/// Computes `(a * b) >> shift` through a 256-bit intermediate.
#[inline(always)]
pub fn mul_shr(a: u128, b: u128, shift: u32) -> Result<u128, MathError> {
    checked_u128(full_mul(a, b) >> (shift as usize))
}

/// Divides `a` by `b`, rounding the result up to the next integer when
/// there is a non-zero remainder.
#[inline(always)]
pub fn div_rounding_up(a: U256, b: U256) -> Result<U256, MathError> {
    if unlikely(b.is_zero()) {
        return Err(MathError::DivByZero);
    }
    let (quotient, remainder) = a.div_rem(b);
    Ok(if remainder.is_zero() {
        quotient
    } else {
        quotient + U256::ONE
    })
}

/// `floor(a * b / denominator)` on `u64` operands.
#[inline(always)]
pub fn mul_div_floor_u64(a: u64, b: u64, denominator: u64) -> Result<u64, MathError> {
    if unlikely(denominator == 0) {
        return Err(MathError::DivByZero);
    }
    let result = (a as u128) * (b as u128) / (denominator as u128);
    u64::try_from(result).map_err(|_| MathError::MultiplicationOverflow)
}

/// `ceil(a * b / denominator)` on `u64` operands.
#[inline(always)]
pub fn mul_div_ceil_u64(a: u64, b: u64, denominator: u64) -> Result<u64, MathError> {
    if unlikely(denominator == 0) {
        return Err(MathError::DivByZero);
    }
    let result = ((a as u128) * (b as u128) + (denominator as u128 - 1)) / (denominator as u128);
    u64::try_from(result).map_err(|_| MathError::MultiplicationOverflow)
}
