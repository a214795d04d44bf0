pub mod asset;
pub mod collab;
pub mod error;
pub mod events;
mod hash;
pub mod math;
pub mod pool;

pub use hash::FastMap;

pub use asset::Asset;
pub use pool::clmm_pool::Pool;
pub use pool::position::{AddLiquidityReceipt, Position};
pub use pool::rewarder::{Rewarder, REWARDER_NUM};
pub use pool::swap::{CalculatedSwapResult, FlashSwapReceipt, SwapStepTrace};

/// Q64.64 one: the fixed-point representation of 1.0.
pub const Q64: u128 = 1u128 << 64;

/// Swap fees are expressed in parts per million of the input amount.
pub const FEE_RATE_DENOMINATOR: u64 = 1_000_000;

/// Hard cap on a pool's swap fee rate (20%).
pub const MAX_FEE_RATE: u64 = 200_000;

/// Protocol and partner referral rates are expressed in parts per ten thousand.
pub const PROTOCOL_FEE_RATE_DENOMINATOR: u64 = 10_000;

/// Protocol share of swap fees applied to freshly created pools (20%).
pub const DEFAULT_PROTOCOL_FEE_RATE: u64 = 2_000;

pub const SECONDS_PER_DAY: u64 = 86_400;
