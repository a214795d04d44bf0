//! Interfaces the pool engine consumes from its collaborators.
//!
//! The engine itself owns no global state: authorities, fee tiers,
//! partners and the position NFT collection all live behind these
//! traits, supplied per call by the host runtime.

use crate::asset::Asset;
use alloy_primitives::Address;

/// Wall-clock seconds, non-decreasing between consecutive rewarder
/// updates of the same pool.
pub trait Clock {
    fn now_seconds(&self) -> u64;
}

/// Role predicates backing privileged pool operations, plus the
/// protocol-wide pause switch.
pub trait AccessControl {
    fn is_protocol_authority(&self, who: Address) -> bool;
    fn is_pool_create_authority(&self, who: Address) -> bool;
    fn is_protocol_fee_claim_authority(&self, who: Address) -> bool;
    fn allow_reset_initial_price(&self, who: Address) -> bool;
    fn allow_set_position_uri(&self, who: Address) -> bool;
    fn is_protocol_paused(&self) -> bool;
}

/// Named partners earn a share of the protocol fee on trades they
/// route. Rates are parts per ten thousand.
pub trait PartnerRegistry {
    fn ref_fee_rate(&self, name: &str) -> u64;
    fn receive_ref_fee(&mut self, name: &str, fee: Asset);
}

/// Maps a tick spacing to the swap fee rate of that tier, in parts
/// per million. `None` means the spacing has no registered tier.
pub trait FeeTierRegistry {
    fn fee_rate_for_spacing(&self, tick_spacing: u32) -> Option<u64>;
}

/// Mint/burn surface of the position NFT collection. The engine
/// authorizes position operations by asking who holds the token.
pub trait PositionNft {
    fn create_collection(&mut self, pool: Address, pool_index: u64) -> String;
    fn position_name(&self, pool_index: u64, position_index: u64) -> String;
    fn mint(&mut self, owner: Address, pool: Address, position_index: u64, name: &str);
    fn burn(&mut self, pool: Address, position_index: u64);
    fn holder_of(&self, pool: Address, position_index: u64) -> Option<Address>;
}
