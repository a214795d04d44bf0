//! Shared fixtures for the pool test modules: permissive collaborator
//! mocks, a pool builder and a few assertion helpers.

use crate::asset::Asset;
use crate::collab::{AccessControl, Clock, FeeTierRegistry, PartnerRegistry, PositionNft};
use crate::error::{Error, StateError};
use crate::pool::clmm_pool::Pool;
use crate::FastMap;
use alloy_primitives::Address;
use std::cell::Cell;

pub const ALICE: Address = Address::repeat_byte(0x11);
pub const BOB: Address = Address::repeat_byte(0x22);
pub const TOKEN_A: Address = Address::repeat_byte(0xA0);
pub const TOKEN_B: Address = Address::repeat_byte(0xB0);
pub const TOKEN_R: Address = Address::repeat_byte(0xC0);
pub const POOL_ADDR: Address = Address::repeat_byte(0xF0);

pub const TEST_FEE_RATE: u64 = 1_000; // 0.1%

/// `None` roles allow everyone, which keeps most tests short; pin a
/// role to lock it down.
#[derive(Default)]
pub struct TestAcl {
    pub protocol_authority: Option<Address>,
    pub pool_create_authority: Option<Address>,
    pub fee_claim_authority: Option<Address>,
    pub reset_price_authority: Option<Address>,
    pub set_uri_authority: Option<Address>,
    pub protocol_paused: bool,
}

fn allowed(role: Option<Address>, who: Address) -> bool {
    role.map(|addr| addr == who).unwrap_or(true)
}

impl AccessControl for TestAcl {
    fn is_protocol_authority(&self, who: Address) -> bool {
        allowed(self.protocol_authority, who)
    }
    fn is_pool_create_authority(&self, who: Address) -> bool {
        allowed(self.pool_create_authority, who)
    }
    fn is_protocol_fee_claim_authority(&self, who: Address) -> bool {
        allowed(self.fee_claim_authority, who)
    }
    fn allow_reset_initial_price(&self, who: Address) -> bool {
        allowed(self.reset_price_authority, who)
    }
    fn allow_set_position_uri(&self, who: Address) -> bool {
        allowed(self.set_uri_authority, who)
    }
    fn is_protocol_paused(&self) -> bool {
        self.protocol_paused
    }
}

pub struct TestClock {
    now: Cell<u64>,
}

impl TestClock {
    pub fn at(now: u64) -> Self {
        Self { now: Cell::new(now) }
    }

    pub fn advance(&self, seconds: u64) {
        self.now.set(self.now.get() + seconds);
    }
}

impl Clock for TestClock {
    fn now_seconds(&self) -> u64 {
        self.now.get()
    }
}

#[derive(Default)]
pub struct TestNft {
    holders: FastMap<u64, Address>,
}

impl PositionNft for TestNft {
    fn create_collection(&mut self, _pool: Address, pool_index: u64) -> String {
        format!("Pool {pool_index} Positions")
    }
    fn position_name(&self, pool_index: u64, position_index: u64) -> String {
        format!("Pool {pool_index} Position {position_index}")
    }
    fn mint(&mut self, owner: Address, _pool: Address, position_index: u64, _name: &str) {
        self.holders.insert(position_index, owner);
    }
    fn burn(&mut self, _pool: Address, position_index: u64) {
        self.holders.remove(&position_index);
    }
    fn holder_of(&self, _pool: Address, position_index: u64) -> Option<Address> {
        self.holders.get(&position_index).copied()
    }
}

#[derive(Default)]
pub struct TestPartners {
    pub rates: FastMap<String, u64>,
    pub received: Vec<(String, u64)>,
}

impl TestPartners {
    pub fn with_rate(name: &str, rate: u64) -> Self {
        let mut partners = Self::default();
        partners.rates.insert(name.to_string(), rate);
        partners
    }
}

impl PartnerRegistry for TestPartners {
    fn ref_fee_rate(&self, name: &str) -> u64 {
        self.rates.get(name).copied().unwrap_or(0)
    }
    fn receive_ref_fee(&mut self, name: &str, fee: Asset) {
        self.received.push((name.to_string(), fee.amount()));
        drop(fee);
    }
}

#[derive(Default)]
pub struct TestFeeTiers;

impl FeeTierRegistry for TestFeeTiers {
    fn fee_rate_for_spacing(&self, tick_spacing: u32) -> Option<u64> {
        // 999 plays the unregistered tier in tests
        (tick_spacing != 999).then_some(TEST_FEE_RATE)
    }
}

pub fn test_pool(tick_spacing: u32, init_sqrt_price: u128) -> Pool {
    let acl = TestAcl::default();
    let fee_tiers = TestFeeTiers;
    let mut nft = TestNft::default();
    let clock = TestClock::at(1_000);
    Pool::new(
        ALICE,
        POOL_ADDR,
        1,
        TOKEN_A,
        TOKEN_B,
        tick_spacing,
        init_sqrt_price,
        String::from("ipfs://pool"),
        &acl,
        &fee_tiers,
        &mut nft,
        &clock,
    )
    .expect("test pool must build")
}

/// Funds the vault so swaps and collects have something to pay out of.
pub fn fund_vault(pool: &mut Pool, amount_a: u64, amount_b: u64) {
    pool.deposit(Asset::new(TOKEN_A, amount_a));
    pool.deposit(Asset::new(TOKEN_B, amount_b));
}

pub fn assert_state_err(result: Result<(), Error>, expected: StateError) {
    match result {
        Err(Error::StateError(err)) if err == expected => {}
        other => panic!("expected {expected:?}, got {other:?}"),
    }
}

pub fn drain_asset(asset: Asset) {
    drop(asset);
}

pub fn drain_assets(asset_a: Asset, asset_b: Asset) {
    drop(asset_a);
    drop(asset_b);
}
