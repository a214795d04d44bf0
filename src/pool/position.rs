use crate::asset::Asset;
use crate::collab::{AccessControl, Clock, PositionNft};
use crate::error::{Error, MathError, StateError};
use crate::events::{self, Event};
use crate::math::liquidity_math::{get_amounts_for_liquidity, get_liquidity_from_amount};
use crate::math::math_helpers::mul_shr;
use crate::math::tick_math::{get_sqrt_price_at_tick, is_valid_tick};
use crate::pool::clmm_pool::Pool;
use crate::pool::rewarder::REWARDER_NUM;
use crate::pool::tick::{fee_growth_inside, rewarder_growth_inside, Tick};
use alloy_primitives::Address;
use std::mem;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PositionRewardInfo {
    pub growth_inside_snapshot: u128,
    pub amount_owed: u64,
}

/// An LP's commitment of liquidity to one tick range, together with
/// the fee and reward accruals measured against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub pool: Address,
    pub index: u64,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub liquidity: u128,
    pub fee_growth_inside_snapshot_a: u128,
    pub fee_growth_inside_snapshot_b: u128,
    pub fee_owed_a: u64,
    pub fee_owed_b: u64,
    pub rewarder_infos: [PositionRewardInfo; REWARDER_NUM],
}

impl Position {
    fn new(pool: Address, index: u64, tick_lower: i32, tick_upper: i32) -> Self {
        Self {
            pool,
            index,
            tick_lower,
            tick_upper,
            liquidity: 0,
            fee_growth_inside_snapshot_a: 0,
            fee_growth_inside_snapshot_b: 0,
            fee_owed_a: 0,
            fee_owed_b: 0,
            rewarder_infos: [PositionRewardInfo::default(); REWARDER_NUM],
        }
    }

    /// True when nothing is left to withdraw: the precondition for
    /// closing.
    pub fn is_empty(&self) -> bool {
        self.liquidity == 0
            && self.fee_owed_a == 0
            && self.fee_owed_b == 0
            && self.rewarder_infos.iter().all(|info| info.amount_owed == 0)
    }

    // Banks the growth accumulated since the last snapshot into the
    // owed counters. Growth deltas wrap; the owed additions do not.
    fn accrue(
        &mut self,
        fee_inside: (u128, u128),
        reward_inside: &[u128; REWARDER_NUM],
    ) -> Result<(), Error> {
        let delta_a = fee_inside.0.wrapping_sub(self.fee_growth_inside_snapshot_a);
        let delta_b = fee_inside.1.wrapping_sub(self.fee_growth_inside_snapshot_b);

        let earned_a = mul_shr(self.liquidity, delta_a, 64)
            .ok()
            .and_then(|v| u64::try_from(v).ok())
            .ok_or(MathError::FeeOverflow)?;
        let earned_b = mul_shr(self.liquidity, delta_b, 64)
            .ok()
            .and_then(|v| u64::try_from(v).ok())
            .ok_or(MathError::FeeOverflow)?;
        self.fee_owed_a = self
            .fee_owed_a
            .checked_add(earned_a)
            .ok_or(MathError::FeeOverflow)?;
        self.fee_owed_b = self
            .fee_owed_b
            .checked_add(earned_b)
            .ok_or(MathError::FeeOverflow)?;
        self.fee_growth_inside_snapshot_a = fee_inside.0;
        self.fee_growth_inside_snapshot_b = fee_inside.1;

        for (info, inside) in self.rewarder_infos.iter_mut().zip(reward_inside) {
            let delta = inside.wrapping_sub(info.growth_inside_snapshot);
            let earned = mul_shr(delta, self.liquidity, 64)
                .ok()
                .and_then(|v| u64::try_from(v).ok())
                .ok_or(MathError::RewardOverflow)?;
            info.amount_owed = info
                .amount_owed
                .checked_add(earned)
                .ok_or(MathError::RewardOverflow)?;
            info.growth_inside_snapshot = *inside;
        }
        Ok(())
    }
}

/// Debt created by an add-liquidity call. The receipt cannot be
/// cloned, stored or dropped; the only way out is
/// [`Pool::repay_add_liquidity`] within the same operation, which
/// enforces two-phase settlement without locks.
#[derive(Debug)]
#[must_use = "the receipt must be settled with Pool::repay_add_liquidity"]
pub struct AddLiquidityReceipt {
    pool: Address,
    amount_a: u64,
    amount_b: u64,
}

impl AddLiquidityReceipt {
    pub fn pool(&self) -> Address {
        self.pool
    }

    pub fn amounts(&self) -> (u64, u64) {
        (self.amount_a, self.amount_b)
    }

    fn settle(self) -> (Address, u64, u64) {
        let parts = (self.pool, self.amount_a, self.amount_b);
        mem::forget(self);
        parts
    }
}

impl Drop for AddLiquidityReceipt {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            debug_assert!(
                false,
                "add-liquidity receipt dropped without repay_add_liquidity"
            );
        }
    }
}

impl Pool {
    /// Opens an empty position over `[tick_lower, tick_upper)` and
    /// mints its NFT. Liquidity arrives through the add calls.
    pub fn open_position(
        &mut self,
        caller: Address,
        acl: &impl AccessControl,
        nft: &mut impl PositionNft,
        tick_lower: i32,
        tick_upper: i32,
    ) -> Result<u64, Error> {
        self.check_active(acl)?;
        if tick_lower >= tick_upper
            || !is_valid_tick(tick_lower, self.tick_spacing)
            || !is_valid_tick(tick_upper, self.tick_spacing)
        {
            return Err(StateError::InvalidTick.into());
        }

        let index = self.position_seq;
        self.position_seq += 1;
        self.positions
            .insert(index, Position::new(self.address, index, tick_lower, tick_upper));

        let name = nft.position_name(self.index, index);
        nft.mint(caller, self.address, index, &name);

        self.push_event(Event::OpenPosition(events::OpenPosition {
            user: caller,
            pool: self.address,
            tick_lower,
            tick_upper,
            index,
        }));
        Ok(index)
    }

    /// Adds liquidity by a fixed liquidity delta. Returns the receipt
    /// carrying the amounts owed to the vault.
    #[allow(clippy::too_many_arguments)]
    pub fn add_liquidity(
        &mut self,
        caller: Address,
        acl: &impl AccessControl,
        nft: &impl PositionNft,
        clock: &impl Clock,
        index: u64,
        delta_liquidity: u128,
    ) -> Result<AddLiquidityReceipt, Error> {
        self.check_active(acl)?;
        if delta_liquidity == 0 {
            return Err(StateError::InvalidDeltaLiquidity.into());
        }
        self.authorize_position(caller, nft, index)?;
        self.settle_rewarders(clock.now_seconds())?;
        self.refresh_position(index)?;

        let (tick_lower, tick_upper) = self.position_range(index)?;
        let (amount_a, amount_b) = get_amounts_for_liquidity(
            self.sqrt_price_current,
            self.tick_current,
            tick_lower,
            tick_upper,
            delta_liquidity,
            true,
        )?;
        self.commit_liquidity_add(index, delta_liquidity, amount_a, amount_b)
    }

    /// Adds liquidity by fixing the amount of one token; the liquidity
    /// delta and the other amount are derived from the current price.
    #[allow(clippy::too_many_arguments)]
    pub fn add_liquidity_fix_token(
        &mut self,
        caller: Address,
        acl: &impl AccessControl,
        nft: &impl PositionNft,
        clock: &impl Clock,
        index: u64,
        amount: u64,
        fix_amount_a: bool,
    ) -> Result<AddLiquidityReceipt, Error> {
        self.check_active(acl)?;
        if amount == 0 {
            return Err(StateError::AmountIncorrect.into());
        }
        self.authorize_position(caller, nft, index)?;
        self.settle_rewarders(clock.now_seconds())?;
        self.refresh_position(index)?;

        let (tick_lower, tick_upper) = self.position_range(index)?;
        let (delta_liquidity, amount_a, amount_b) = get_liquidity_from_amount(
            amount,
            tick_lower,
            tick_upper,
            self.tick_current,
            self.sqrt_price_current,
            fix_amount_a,
        )?;
        if delta_liquidity == 0 {
            return Err(StateError::InvalidDeltaLiquidity.into());
        }
        self.commit_liquidity_add(index, delta_liquidity, amount_a, amount_b)
    }

    /// Settles an add-liquidity receipt: both amounts must match
    /// exactly and land in the vault.
    pub fn repay_add_liquidity(
        &mut self,
        asset_a: Asset,
        asset_b: Asset,
        receipt: AddLiquidityReceipt,
    ) -> Result<(), Error> {
        let (pool, amount_a, amount_b) = receipt.settle();
        if pool != self.address
            || asset_a.token() != self.token_a
            || asset_b.token() != self.token_b
            || asset_a.amount() != amount_a
            || asset_b.amount() != amount_b
        {
            return Err(StateError::AmountIncorrect.into());
        }
        self.deposit(asset_a);
        self.deposit(asset_b);
        Ok(())
    }

    /// Withdraws `delta_liquidity` from the position and returns the
    /// freed amounts, rounded down.
    #[allow(clippy::too_many_arguments)]
    pub fn remove_liquidity(
        &mut self,
        caller: Address,
        acl: &impl AccessControl,
        nft: &impl PositionNft,
        clock: &impl Clock,
        index: u64,
        delta_liquidity: u128,
    ) -> Result<(Asset, Asset), Error> {
        self.check_active(acl)?;
        if delta_liquidity == 0 {
            return Err(StateError::InvalidDeltaLiquidity.into());
        }
        self.authorize_position(caller, nft, index)?;
        self.settle_rewarders(clock.now_seconds())?;
        self.refresh_position(index)?;

        let (tick_lower, tick_upper) = self.position_range(index)?;
        let position = self
            .positions
            .get_mut(&index)
            .ok_or(StateError::PositionNotExist)?;
        position.liquidity = position
            .liquidity
            .checked_sub(delta_liquidity)
            .ok_or(MathError::LiquidityUnderflow)?;

        self.debit_tick(tick_lower, delta_liquidity, true)?;
        self.debit_tick(tick_upper, delta_liquidity, false)?;
        if tick_lower <= self.tick_current && self.tick_current < tick_upper {
            self.liquidity_active = self
                .liquidity_active
                .checked_sub(delta_liquidity)
                .ok_or(MathError::LiquidityUnderflow)?;
        }

        let (amount_a, amount_b) = get_amounts_for_liquidity(
            self.sqrt_price_current,
            self.tick_current,
            tick_lower,
            tick_upper,
            delta_liquidity,
            false,
        )?;
        let asset_a = self.withdraw(self.token_a, amount_a)?;
        let asset_b = self.withdraw(self.token_b, amount_b)?;

        self.push_event(Event::RemoveLiquidity(events::RemoveLiquidity {
            pool: self.address,
            tick_lower,
            tick_upper,
            liquidity: delta_liquidity,
            amount_a,
            amount_b,
            index,
        }));
        Ok((asset_a, asset_b))
    }

    /// Pays out the position's accrued fees. `recalculate` refreshes
    /// the accruals against the current growth first.
    pub fn collect_fee(
        &mut self,
        caller: Address,
        acl: &impl AccessControl,
        nft: &impl PositionNft,
        index: u64,
        recalculate: bool,
    ) -> Result<(Asset, Asset), Error> {
        self.check_active(acl)?;
        self.authorize_position(caller, nft, index)?;
        if recalculate {
            self.refresh_position(index)?;
        }

        let position = self
            .positions
            .get_mut(&index)
            .ok_or(StateError::PositionNotExist)?;
        let amount_a = mem::take(&mut position.fee_owed_a);
        let amount_b = mem::take(&mut position.fee_owed_b);

        let asset_a = self.withdraw(self.token_a, amount_a)?;
        let asset_b = self.withdraw(self.token_b, amount_b)?;
        self.push_event(Event::CollectFee(events::CollectFee {
            user: caller,
            pool: self.address,
            index,
            amount_a,
            amount_b,
        }));
        Ok((asset_a, asset_b))
    }

    /// Pays out one rewarder slot's accrued emissions.
    #[allow(clippy::too_many_arguments)]
    pub fn collect_rewarder(
        &mut self,
        caller: Address,
        acl: &impl AccessControl,
        nft: &impl PositionNft,
        clock: &impl Clock,
        index: u64,
        rewarder_index: usize,
        recalculate: bool,
    ) -> Result<Asset, Error> {
        self.check_active(acl)?;
        self.authorize_position(caller, nft, index)?;
        if rewarder_index >= self.rewarders.len() {
            return Err(StateError::InvalidRewardIndex.into());
        }
        if recalculate {
            self.settle_rewarders(clock.now_seconds())?;
            self.refresh_position(index)?;
        }

        let position = self
            .positions
            .get_mut(&index)
            .ok_or(StateError::PositionNotExist)?;
        let amount = mem::take(&mut position.rewarder_infos[rewarder_index].amount_owed);

        let token = self.rewarders[rewarder_index].token;
        let asset = self.withdraw(token, amount)?;
        self.push_event(Event::CollectReward(events::CollectReward {
            user: caller,
            pool: self.address,
            index,
            rewarder_index,
            amount,
        }));
        Ok(asset)
    }

    /// Closes an emptied position and burns its NFT. Anything still
    /// owed keeps the position open.
    pub fn close_position(
        &mut self,
        caller: Address,
        acl: &impl AccessControl,
        nft: &mut impl PositionNft,
        index: u64,
    ) -> Result<(), Error> {
        self.check_active(acl)?;
        self.authorize_position(caller, nft, index)?;

        let position = self
            .positions
            .get(&index)
            .ok_or(StateError::PositionNotExist)?;
        if !position.is_empty() {
            return Err(StateError::PoolLiquidityIsNotZero.into());
        }
        self.positions.remove(&index);
        nft.burn(self.address, index);
        self.push_event(Event::ClosePosition(events::ClosePosition {
            user: caller,
            pool: self.address,
            index,
        }));
        Ok(())
    }

    // ---------------------------------------------------------------
    // internals
    // ---------------------------------------------------------------

    fn position_range(&self, index: u64) -> Result<(i32, i32), Error> {
        let position = self
            .positions
            .get(&index)
            .ok_or(StateError::PositionNotExist)?;
        Ok((position.tick_lower, position.tick_upper))
    }

    fn authorize_position(
        &self,
        caller: Address,
        nft: &impl PositionNft,
        index: u64,
    ) -> Result<(), Error> {
        if !self.positions.contains_key(&index) {
            return Err(StateError::PositionNotExist.into());
        }
        match nft.holder_of(self.address, index) {
            Some(holder) if holder == caller => Ok(()),
            _ => Err(StateError::PositionOwnerError.into()),
        }
    }

    /// Banks fee and reward growth into the position before its
    /// liquidity changes, measuring against the prior liquidity.
    pub(crate) fn refresh_position(&mut self, index: u64) -> Result<(), Error> {
        let (tick_lower, tick_upper) = self.position_range(index)?;
        let fee_inside = fee_growth_inside(
            self.tick_current,
            tick_lower,
            self.ticks.get(&tick_lower),
            tick_upper,
            self.ticks.get(&tick_upper),
            self.fee_growth_global_a,
            self.fee_growth_global_b,
        );
        let reward_inside = rewarder_growth_inside(
            self.tick_current,
            tick_lower,
            self.ticks.get(&tick_lower),
            tick_upper,
            self.ticks.get(&tick_upper),
            &self.rewarder_growth_globals(),
        );
        let position = self
            .positions
            .get_mut(&index)
            .ok_or(StateError::PositionNotExist)?;
        position.accrue(fee_inside, &reward_inside)
    }

    fn commit_liquidity_add(
        &mut self,
        index: u64,
        delta_liquidity: u128,
        amount_a: u64,
        amount_b: u64,
    ) -> Result<AddLiquidityReceipt, Error> {
        let (tick_lower, tick_upper) = self.position_range(index)?;

        let position = self
            .positions
            .get_mut(&index)
            .ok_or(StateError::PositionNotExist)?;
        position.liquidity = position
            .liquidity
            .checked_add(delta_liquidity)
            .ok_or(MathError::LiquidityOverflow)?;

        self.upsert_tick(tick_lower, delta_liquidity, true)?;
        self.upsert_tick(tick_upper, delta_liquidity, false)?;
        if tick_lower <= self.tick_current && self.tick_current < tick_upper {
            self.liquidity_active = self
                .liquidity_active
                .checked_add(delta_liquidity)
                .ok_or(MathError::LiquidityOverflow)?;
        }

        self.push_event(Event::AddLiquidity(events::AddLiquidity {
            pool: self.address,
            tick_lower,
            tick_upper,
            liquidity: delta_liquidity,
            amount_a,
            amount_b,
            index,
        }));
        Ok(AddLiquidityReceipt {
            pool: self.address,
            amount_a,
            amount_b,
        })
    }

    fn upsert_tick(
        &mut self,
        tick_index: i32,
        delta_liquidity: u128,
        is_lower: bool,
    ) -> Result<(), Error> {
        if !self.ticks.contains_key(&tick_index) {
            let sqrt_price = get_sqrt_price_at_tick(tick_index)?;
            let mut tick = Tick::new(tick_index, sqrt_price);
            tick.seed(
                self.tick_current,
                self.fee_growth_global_a,
                self.fee_growth_global_b,
                &self.rewarder_growth_globals(),
            );
            self.ticks.insert(tick_index, tick);
            self.tick_directory.mark(tick_index);
        }

        let signed =
            i128::try_from(delta_liquidity).map_err(|_| MathError::LiquidityOverflow)?;
        let tick = self
            .ticks
            .get_mut(&tick_index)
            .ok_or(StateError::InvariantViolated)?;
        tick.liquidity_gross = tick
            .liquidity_gross
            .checked_add(delta_liquidity)
            .ok_or(MathError::LiquidityOverflow)?;
        tick.liquidity_net = if is_lower {
            tick.liquidity_net.checked_add(signed)
        } else {
            tick.liquidity_net.checked_sub(signed)
        }
        .ok_or(MathError::LiquidityOverflow)?;
        Ok(())
    }

    fn debit_tick(
        &mut self,
        tick_index: i32,
        delta_liquidity: u128,
        is_lower: bool,
    ) -> Result<(), Error> {
        let signed =
            i128::try_from(delta_liquidity).map_err(|_| MathError::LiquidityUnderflow)?;
        let tick = self
            .ticks
            .get_mut(&tick_index)
            .ok_or(StateError::InvariantViolated)?;
        tick.liquidity_gross = tick
            .liquidity_gross
            .checked_sub(delta_liquidity)
            .ok_or(MathError::LiquidityUnderflow)?;
        tick.liquidity_net = if is_lower {
            tick.liquidity_net.checked_sub(signed)
        } else {
            tick.liquidity_net.checked_add(signed)
        }
        .ok_or(MathError::LiquidityOverflow)?;

        if tick.liquidity_gross == 0 {
            self.ticks.remove(&tick_index);
            self.tick_directory.unmark(tick_index);
        }
        Ok(())
    }
}
