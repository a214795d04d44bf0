use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MathError {
    #[error("Math error - multiplication overflow")]
    MultiplicationOverflow,
    #[error("Math error - division by zero")]
    DivByZero,
    #[error("Math error - liquidity overflow")]
    LiquidityOverflow,
    #[error("Math error - liquidity underflow")]
    LiquidityUnderflow,
    #[error("Math error - fee accrual overflow")]
    FeeOverflow,
    #[error("Math error - reward accrual overflow")]
    RewardOverflow,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StateError {
    #[error("State error - tick out of bounds or misaligned")]
    InvalidTick,
    #[error("State error - sqrt price out of bounds")]
    InvalidSqrtPrice,
    #[error("State error - fee rate out of bounds")]
    InvalidFeeRate,
    #[error("State error - clock moved backwards")]
    InvalidTime,
    #[error("State error - pool tokens must differ")]
    SameTokenType,
    #[error("State error - asset amount does not match what is owed")]
    AmountIncorrect,
    #[error("State error - input amount above limit")]
    AmountInAboveLimit,
    #[error("State error - output amount below limit")]
    AmountOutBelowLimit,
    #[error("State error - liquidity is zero")]
    LiquidityZero,
    #[error("State error - no active tick remains in the swap direction")]
    NotEnoughLiquidity,
    #[error("State error - swap remainder underflow")]
    RemainderUnderflow,
    #[error("State error - sqrt price limit on the wrong side of the current price")]
    WrongSqrtPriceLimit,
    #[error("State error - position does not exist")]
    PositionNotExist,
    #[error("State error - caller does not hold the position")]
    PositionOwnerError,
    #[error("State error - pool is paused")]
    PoolIsPaused,
    #[error("State error - position still holds liquidity, fees or rewards")]
    PoolLiquidityIsNotZero,
    #[error("State error - delta liquidity is invalid")]
    InvalidDeltaLiquidity,
    #[error("State error - rewarder index out of range")]
    InvalidRewardIndex,
    #[error("State error - reward balance cannot cover the emission rate")]
    RewardAmountInsufficient,
    #[error("State error - caller is not the rewarder authority")]
    RewardAuthError,
    #[error("State error - function is disabled")]
    FuncDisabled,
    #[error("State error - caller lacks the required privilege")]
    NoPrivilege,
    #[error("State error - internal invariant violated")]
    InvariantViolated,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    MathError(#[from] MathError),

    #[error(transparent)]
    StateError(#[from] StateError),
}
