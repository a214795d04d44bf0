use crate::asset::Asset;
use crate::collab::{AccessControl, Clock, FeeTierRegistry, PositionNft};
use crate::error::{Error, StateError};
use crate::events::{self, Event};
use crate::math::tick_math::{
    get_tick_at_sqrt_price, MAX_SQRT_PRICE, MIN_SQRT_PRICE,
};
use crate::pool::position::Position;
use crate::pool::rewarder::{Rewarder, REWARDER_NUM};
use crate::pool::tick::{Tick, TickDirectory};
use crate::{FastMap, MAX_FEE_RATE, DEFAULT_PROTOCOL_FEE_RATE, PROTOCOL_FEE_RATE_DENOMINATOR};
use alloy_primitives::Address;

/// One concentrated-liquidity pool: a (token_a, token_b, tick_spacing)
/// market plus everything it owns, from positions and ticks to the
/// rewarders and the asset vault.
///
/// The pool is a deterministic state machine. One call is one atomic
/// operation; collaborators (clock, ACL, partner registry, position
/// NFTs) are passed in per call and never stored.
#[derive(Debug)]
pub struct Pool {
    pub address: Address,
    pub index: u64,
    pub uri: String,
    pub token_a: Address,
    pub token_b: Address,
    pub tick_spacing: u32,
    /// Swap fee in parts per million.
    pub fee_rate: u64,
    /// Protocol share of swap fees in parts per ten thousand.
    pub protocol_fee_rate: u64,
    pub sqrt_price_current: u128,
    pub tick_current: i32,
    /// Sum of the liquidity of every position whose range contains
    /// `tick_current`.
    pub liquidity_active: u128,
    pub fee_growth_global_a: u128,
    pub fee_growth_global_b: u128,
    pub fee_protocol_a: u64,
    pub fee_protocol_b: u64,
    pub rewarders: Vec<Rewarder>,
    pub rewarder_last_update_time: u64,
    pub paused: bool,
    pub(crate) positions: FastMap<u64, Position>,
    pub(crate) position_seq: u64,
    pub(crate) ticks: FastMap<i32, Tick>,
    pub(crate) tick_directory: TickDirectory,
    vault: FastMap<Address, u64>,
    events: Vec<Event>,
}

impl Pool {
    /// Creates the pool at an initial price. The factory has already
    /// resolved the address and running index; the fee tier registry
    /// decides the swap fee for the requested tick spacing.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        creator: Address,
        address: Address,
        index: u64,
        token_a: Address,
        token_b: Address,
        tick_spacing: u32,
        init_sqrt_price: u128,
        uri: String,
        acl: &impl AccessControl,
        fee_tiers: &impl FeeTierRegistry,
        nft: &mut impl PositionNft,
        clock: &impl Clock,
    ) -> Result<Self, Error> {
        if !acl.is_pool_create_authority(creator) {
            return Err(StateError::NoPrivilege.into());
        }
        if token_a == token_b {
            return Err(StateError::SameTokenType.into());
        }
        if tick_spacing == 0 {
            return Err(StateError::InvalidTick.into());
        }
        if !(MIN_SQRT_PRICE..=MAX_SQRT_PRICE).contains(&init_sqrt_price) {
            return Err(StateError::InvalidSqrtPrice.into());
        }
        let fee_rate = fee_tiers
            .fee_rate_for_spacing(tick_spacing)
            .filter(|rate| *rate <= MAX_FEE_RATE)
            .ok_or(StateError::InvalidFeeRate)?;

        let tick_current = get_tick_at_sqrt_price(init_sqrt_price)?;
        let collection_name = nft.create_collection(address, index);

        let mut pool = Self {
            address,
            index,
            uri,
            token_a,
            token_b,
            tick_spacing,
            fee_rate,
            protocol_fee_rate: DEFAULT_PROTOCOL_FEE_RATE,
            sqrt_price_current: init_sqrt_price,
            tick_current,
            liquidity_active: 0,
            fee_growth_global_a: 0,
            fee_growth_global_b: 0,
            fee_protocol_a: 0,
            fee_protocol_b: 0,
            rewarders: Vec::new(),
            rewarder_last_update_time: clock.now_seconds(),
            paused: false,
            positions: FastMap::default(),
            position_seq: 1,
            ticks: FastMap::default(),
            tick_directory: TickDirectory::new(tick_spacing),
            vault: FastMap::default(),
            events: Vec::new(),
        };
        pool.push_event(Event::CreatePool(events::CreatePool {
            creator,
            pool_address: address,
            collection_name,
            token_a,
            token_b,
            tick_spacing,
        }));
        Ok(pool)
    }

    // ---------------------------------------------------------------
    // events
    // ---------------------------------------------------------------

    pub(crate) fn push_event(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Drains the events accumulated by committed operations.
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    // ---------------------------------------------------------------
    // vault
    // ---------------------------------------------------------------

    pub fn vault_balance(&self, token: Address) -> u64 {
        self.vault.get(&token).copied().unwrap_or(0)
    }

    /// Deposits an asset into the pool vault. Used by the repay paths
    /// and by hosts funding reward emissions.
    pub fn deposit(&mut self, asset: Asset) {
        let balance = self.vault.entry(asset.token()).or_insert(0);
        *balance = balance.saturating_add(asset.amount());
    }

    pub(crate) fn withdraw(&mut self, token: Address, amount: u64) -> Result<Asset, Error> {
        let balance = self.vault.entry(token).or_insert(0);
        if *balance < amount {
            return Err(StateError::InvariantViolated.into());
        }
        *balance -= amount;
        Ok(Asset::new(token, amount))
    }

    // ---------------------------------------------------------------
    // shared checks & lookups
    // ---------------------------------------------------------------

    pub(crate) fn check_active(&self, acl: &impl AccessControl) -> Result<(), Error> {
        if self.paused || acl.is_protocol_paused() {
            return Err(StateError::PoolIsPaused.into());
        }
        Ok(())
    }

    pub fn position(&self, index: u64) -> Option<&Position> {
        self.positions.get(&index)
    }

    pub fn tick(&self, index: i32) -> Option<&Tick> {
        self.ticks.get(&index)
    }

    pub(crate) fn rewarder_growth_globals(&self) -> [u128; REWARDER_NUM] {
        let mut globals = [0u128; REWARDER_NUM];
        for (slot, rewarder) in self.rewarders.iter().enumerate() {
            globals[slot] = rewarder.growth_global;
        }
        globals
    }

    // ---------------------------------------------------------------
    // admin
    // ---------------------------------------------------------------

    pub fn update_fee_rate(
        &mut self,
        caller: Address,
        acl: &impl AccessControl,
        new_fee_rate: u64,
    ) -> Result<(), Error> {
        if !acl.is_protocol_authority(caller) {
            return Err(StateError::NoPrivilege.into());
        }
        if new_fee_rate > MAX_FEE_RATE {
            return Err(StateError::InvalidFeeRate.into());
        }
        let old_fee_rate = self.fee_rate;
        self.fee_rate = new_fee_rate;
        self.push_event(Event::UpdateFeeRate(events::UpdateFeeRate {
            pool: self.address,
            old_fee_rate,
            new_fee_rate,
        }));
        Ok(())
    }

    pub fn set_protocol_fee_rate(
        &mut self,
        caller: Address,
        acl: &impl AccessControl,
        new_rate: u64,
    ) -> Result<(), Error> {
        if !acl.is_protocol_authority(caller) {
            return Err(StateError::NoPrivilege.into());
        }
        if new_rate > PROTOCOL_FEE_RATE_DENOMINATOR {
            return Err(StateError::InvalidFeeRate.into());
        }
        self.protocol_fee_rate = new_rate;
        Ok(())
    }

    pub fn pause(&mut self, caller: Address, acl: &impl AccessControl) -> Result<(), Error> {
        if !acl.is_protocol_authority(caller) {
            return Err(StateError::NoPrivilege.into());
        }
        self.paused = true;
        Ok(())
    }

    pub fn unpause(&mut self, caller: Address, acl: &impl AccessControl) -> Result<(), Error> {
        if !acl.is_protocol_authority(caller) {
            return Err(StateError::NoPrivilege.into());
        }
        self.paused = false;
        Ok(())
    }

    pub fn update_uri(
        &mut self,
        caller: Address,
        acl: &impl AccessControl,
        uri: String,
    ) -> Result<(), Error> {
        if !acl.allow_set_position_uri(caller) {
            return Err(StateError::NoPrivilege.into());
        }
        self.uri = uri;
        Ok(())
    }

    /// Re-anchors the pool price before trading starts. Only possible
    /// while no position has ever been funded.
    pub fn reset_init_price(
        &mut self,
        caller: Address,
        acl: &impl AccessControl,
        new_sqrt_price: u128,
    ) -> Result<(), Error> {
        if !acl.allow_reset_initial_price(caller) {
            return Err(StateError::NoPrivilege.into());
        }
        if !self.positions.is_empty() || self.liquidity_active != 0 {
            return Err(StateError::PoolLiquidityIsNotZero.into());
        }
        if !(MIN_SQRT_PRICE..=MAX_SQRT_PRICE).contains(&new_sqrt_price) {
            return Err(StateError::InvalidSqrtPrice.into());
        }
        self.sqrt_price_current = new_sqrt_price;
        self.tick_current = get_tick_at_sqrt_price(new_sqrt_price)?;
        Ok(())
    }

    /// Drains the accrued protocol fees into assets for the claim
    /// authority.
    pub fn collect_protocol_fee(
        &mut self,
        caller: Address,
        acl: &impl AccessControl,
    ) -> Result<(Asset, Asset), Error> {
        if !acl.is_protocol_fee_claim_authority(caller) {
            return Err(StateError::NoPrivilege.into());
        }
        let amount_a = self.fee_protocol_a;
        let amount_b = self.fee_protocol_b;
        self.fee_protocol_a = 0;
        self.fee_protocol_b = 0;
        let asset_a = self.withdraw(self.token_a, amount_a)?;
        let asset_b = self.withdraw(self.token_b, amount_b)?;
        self.push_event(Event::CollectProtocolFee(events::CollectProtocolFee {
            user: caller,
            pool: self.address,
            amount_a,
            amount_b,
        }));
        Ok((asset_a, asset_b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::testing::*;

    #[test]
    fn new_pool_validates_inputs() {
        let acl = TestAcl::default();
        let fee_tiers = TestFeeTiers::default();
        let mut nft = TestNft::default();
        let clock = TestClock::at(1_000);

        // same token on both sides
        let result = Pool::new(
            ALICE,
            POOL_ADDR,
            1,
            TOKEN_A,
            TOKEN_A,
            10,
            crate::Q64,
            String::new(),
            &acl,
            &fee_tiers,
            &mut nft,
            &clock,
        );
        assert_state_err(result.map(|_| ()), StateError::SameTokenType);

        // unregistered tick spacing
        let result = Pool::new(
            ALICE,
            POOL_ADDR,
            1,
            TOKEN_A,
            TOKEN_B,
            999,
            crate::Q64,
            String::new(),
            &acl,
            &fee_tiers,
            &mut nft,
            &clock,
        );
        assert_state_err(result.map(|_| ()), StateError::InvalidFeeRate);

        // price outside the valid range
        let result = Pool::new(
            ALICE,
            POOL_ADDR,
            1,
            TOKEN_A,
            TOKEN_B,
            10,
            MAX_SQRT_PRICE + 1,
            String::new(),
            &acl,
            &fee_tiers,
            &mut nft,
            &clock,
        );
        assert_state_err(result.map(|_| ()), StateError::InvalidSqrtPrice);

        // unauthorized creator
        let mut acl_locked = TestAcl::default();
        acl_locked.pool_create_authority = Some(BOB);
        let result = Pool::new(
            ALICE,
            POOL_ADDR,
            1,
            TOKEN_A,
            TOKEN_B,
            10,
            crate::Q64,
            String::new(),
            &acl_locked,
            &fee_tiers,
            &mut nft,
            &clock,
        );
        assert_state_err(result.map(|_| ()), StateError::NoPrivilege);
    }

    #[test]
    fn new_pool_emits_create_event_and_sets_tick() {
        let mut pool = test_pool(10, crate::Q64);
        assert_eq!(pool.tick_current, 0);
        assert_eq!(pool.fee_rate, TEST_FEE_RATE);
        assert_eq!(pool.position_seq, 1);

        let events = pool.take_events();
        assert!(matches!(events.first(), Some(Event::CreatePool(e)) if e.tick_spacing == 10));
        // drained
        assert!(pool.take_events().is_empty());
    }

    #[test]
    fn admin_ops_require_privilege() {
        let mut pool = test_pool(10, crate::Q64);
        let mut acl = TestAcl::default();
        acl.protocol_authority = Some(ALICE);

        assert_state_err(pool.update_fee_rate(BOB, &acl, 5_000), StateError::NoPrivilege);
        pool.update_fee_rate(ALICE, &acl, 5_000).unwrap();
        assert_eq!(pool.fee_rate, 5_000);
        assert_state_err(
            pool.update_fee_rate(ALICE, &acl, MAX_FEE_RATE + 1),
            StateError::InvalidFeeRate,
        );

        assert_state_err(
            pool.set_protocol_fee_rate(ALICE, &acl, PROTOCOL_FEE_RATE_DENOMINATOR + 1),
            StateError::InvalidFeeRate,
        );
        pool.set_protocol_fee_rate(ALICE, &acl, 1_000).unwrap();
        assert_eq!(pool.protocol_fee_rate, 1_000);

        pool.pause(ALICE, &acl).unwrap();
        assert!(pool.paused);
        assert_state_err(pool.check_active(&acl), StateError::PoolIsPaused);
        pool.unpause(ALICE, &acl).unwrap();
        pool.check_active(&acl).unwrap();
    }

    #[test]
    fn protocol_pause_blocks_operations() {
        let pool = test_pool(10, crate::Q64);
        let mut acl = TestAcl::default();
        acl.protocol_paused = true;
        assert_state_err(pool.check_active(&acl), StateError::PoolIsPaused);
    }

    #[test]
    fn reset_init_price_only_on_empty_pool() {
        let mut pool = test_pool(10, crate::Q64);
        let acl = TestAcl::default();
        let target = crate::math::tick_math::get_sqrt_price_at_tick(5_000).unwrap();

        pool.reset_init_price(ALICE, &acl, target).unwrap();
        assert_eq!(pool.sqrt_price_current, target);
        assert_eq!(pool.tick_current, 5_000);

        // open a position: the reset becomes unavailable
        let mut nft = TestNft::default();
        pool.open_position(ALICE, &acl, &mut nft, -100, 100).unwrap();
        assert_state_err(
            pool.reset_init_price(ALICE, &acl, crate::Q64),
            StateError::PoolLiquidityIsNotZero,
        );
    }

    #[test]
    fn collect_protocol_fee_drains_counters() {
        let mut pool = test_pool(10, crate::Q64);
        let mut acl = TestAcl::default();
        acl.fee_claim_authority = Some(ALICE);

        pool.deposit(Asset::new(TOKEN_A, 500));
        pool.deposit(Asset::new(TOKEN_B, 700));
        pool.fee_protocol_a = 120;
        pool.fee_protocol_b = 340;

        assert_state_err(
            pool.collect_protocol_fee(BOB, &acl).map(|_| ()),
            StateError::NoPrivilege,
        );

        let (asset_a, asset_b) = pool.collect_protocol_fee(ALICE, &acl).unwrap();
        assert_eq!(asset_a.amount(), 120);
        assert_eq!(asset_b.amount(), 340);
        assert_eq!(pool.fee_protocol_a, 0);
        assert_eq!(pool.fee_protocol_b, 0);
        assert_eq!(pool.vault_balance(TOKEN_A), 380);
        assert_eq!(pool.vault_balance(TOKEN_B), 360);
        drain_assets(asset_a, asset_b);
    }

    #[test]
    fn vault_withdraw_guards_balance() {
        let mut pool = test_pool(10, crate::Q64);
        pool.deposit(Asset::new(TOKEN_A, 100));
        assert_state_err(
            pool.withdraw(TOKEN_A, 101).map(|_| ()),
            StateError::InvariantViolated,
        );
        let asset = pool.withdraw(TOKEN_A, 100).unwrap();
        assert_eq!(asset.amount(), 100);
        drain_asset(asset);
    }
}
