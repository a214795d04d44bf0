//! Outbound events. The engine pushes these onto the pool's buffer as
//! operations commit; the host drains them with [`crate::Pool::take_events`]
//! and forwards them to its own event transport.

use alloy_primitives::Address;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePool {
    pub creator: Address,
    pub pool_address: Address,
    pub collection_name: String,
    pub token_a: Address,
    pub token_b: Address,
    pub tick_spacing: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenPosition {
    pub user: Address,
    pub pool: Address,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub index: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosePosition {
    pub user: Address,
    pub pool: Address,
    pub index: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddLiquidity {
    pub pool: Address,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub liquidity: u128,
    pub amount_a: u64,
    pub amount_b: u64,
    pub index: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveLiquidity {
    pub pool: Address,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub liquidity: u128,
    pub amount_a: u64,
    pub amount_b: u64,
    pub index: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Swap {
    pub a_to_b: bool,
    pub pool: Address,
    pub swap_from: Address,
    pub partner: String,
    pub amount_in: u64,
    pub amount_out: u64,
    pub ref_amount: u64,
    pub fee_amount: u64,
    pub vault_a_amount: u64,
    pub vault_b_amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectFee {
    pub user: Address,
    pub pool: Address,
    pub index: u64,
    pub amount_a: u64,
    pub amount_b: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectProtocolFee {
    pub user: Address,
    pub pool: Address,
    pub amount_a: u64,
    pub amount_b: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectReward {
    pub user: Address,
    pub pool: Address,
    pub index: u64,
    pub rewarder_index: usize,
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateFeeRate {
    pub pool: Address,
    pub old_fee_rate: u64,
    pub new_fee_rate: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateEmission {
    pub pool: Address,
    pub rewarder_token: Address,
    pub emissions_per_second: u128,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRewardAuth {
    pub pool: Address,
    pub rewarder_index: usize,
    pub old_authority: Address,
    pub new_authority: Address,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptRewardAuth {
    pub pool: Address,
    pub rewarder_index: usize,
    pub authority: Address,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    CreatePool(CreatePool),
    OpenPosition(OpenPosition),
    ClosePosition(ClosePosition),
    AddLiquidity(AddLiquidity),
    RemoveLiquidity(RemoveLiquidity),
    Swap(Swap),
    CollectFee(CollectFee),
    CollectProtocolFee(CollectProtocolFee),
    CollectReward(CollectReward),
    UpdateFeeRate(UpdateFeeRate),
    UpdateEmission(UpdateEmission),
    TransferRewardAuth(TransferRewardAuth),
    AcceptRewardAuth(AcceptRewardAuth),
}
