use crate::collab::{AccessControl, Clock};
use crate::error::{Error, StateError};
use crate::events::{self, Event};
use crate::math::math_helpers::{full_mul, mul_shr};
use crate::pool::clmm_pool::Pool;
use crate::SECONDS_PER_DAY;
use alloy_primitives::{Address, U256};

/// Number of parallel liquidity-mining slots a pool can carry.
pub const REWARDER_NUM: usize = 3;

/// One liquidity-mining program: a token emitted at a fixed per-second
/// rate, accounted per unit of active liquidity exactly like swap
/// fees. Slots are permanent once added; switching a program off means
/// setting its emission to zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewarder {
    pub token: Address,
    pub authority: Address,
    pub pending_authority: Option<Address>,
    /// Emission rate in token units per second, Q64.64.
    pub emissions_per_second: u128,
    /// Accumulated emissions per unit of active liquidity, Q64.64,
    /// wrapping.
    pub growth_global: u128,
}

impl Pool {
    /// Rolls every rewarder's growth accumulator forward to `now`.
    /// Runs at the head of each state-mutating operation so that the
    /// operation's own liquidity change never earns its own emissions.
    pub(crate) fn settle_rewarders(&mut self, now: u64) -> Result<(), Error> {
        let last = self.rewarder_last_update_time;
        if now < last {
            return Err(StateError::InvalidTime.into());
        }
        let elapsed = now - last;
        self.rewarder_last_update_time = now;
        if elapsed == 0 || self.liquidity_active == 0 {
            return Ok(());
        }

        let liquidity = U256::from(self.liquidity_active);
        for rewarder in &mut self.rewarders {
            let emitted = full_mul(elapsed as u128, rewarder.emissions_per_second);
            let growth_delta = emitted / liquidity;
            // wrapping accumulator: keep the low 128 bits
            let limbs = growth_delta.as_limbs();
            let growth_delta = (limbs[0] as u128) | ((limbs[1] as u128) << 64);
            rewarder.growth_global = rewarder.growth_global.wrapping_add(growth_delta);
        }
        tracing::debug!(elapsed, "settled rewarder growth");
        Ok(())
    }

    /// Registers a new rewarder slot. Slots are append-only and capped
    /// at [`REWARDER_NUM`].
    pub fn add_rewarder(
        &mut self,
        caller: Address,
        acl: &impl AccessControl,
        clock: &impl Clock,
        token: Address,
        authority: Address,
    ) -> Result<usize, Error> {
        if !acl.is_protocol_authority(caller) {
            return Err(StateError::NoPrivilege.into());
        }
        if self.rewarders.len() >= REWARDER_NUM {
            return Err(StateError::InvalidRewardIndex.into());
        }
        self.settle_rewarders(clock.now_seconds())?;
        self.rewarders.push(Rewarder {
            token,
            authority,
            pending_authority: None,
            emissions_per_second: 0,
            growth_global: 0,
        });
        Ok(self.rewarders.len() - 1)
    }

    /// Changes a slot's emission rate. The vault must already hold one
    /// day of the reward token at the new rate.
    pub fn update_emission(
        &mut self,
        caller: Address,
        clock: &impl Clock,
        rewarder_index: usize,
        emissions_per_second: u128,
    ) -> Result<(), Error> {
        self.settle_rewarders(clock.now_seconds())?;
        let rewarder = self
            .rewarders
            .get(rewarder_index)
            .ok_or(StateError::InvalidRewardIndex)?;
        if rewarder.authority != caller {
            return Err(StateError::RewardAuthError.into());
        }
        let daily_need = mul_shr(emissions_per_second, SECONDS_PER_DAY as u128, 64)?;
        if (self.vault_balance(rewarder.token) as u128) < daily_need {
            return Err(StateError::RewardAmountInsufficient.into());
        }
        let token = rewarder.token;
        self.rewarders[rewarder_index].emissions_per_second = emissions_per_second;
        self.push_event(Event::UpdateEmission(events::UpdateEmission {
            pool: self.address,
            rewarder_token: token,
            emissions_per_second,
        }));
        Ok(())
    }

    /// First half of the two-phase authority handover.
    pub fn transfer_reward_authority(
        &mut self,
        caller: Address,
        clock: &impl Clock,
        rewarder_index: usize,
        new_authority: Address,
    ) -> Result<(), Error> {
        self.settle_rewarders(clock.now_seconds())?;
        let rewarder = self
            .rewarders
            .get_mut(rewarder_index)
            .ok_or(StateError::InvalidRewardIndex)?;
        if rewarder.authority != caller {
            return Err(StateError::RewardAuthError.into());
        }
        rewarder.pending_authority = Some(new_authority);
        let old_authority = rewarder.authority;
        self.push_event(Event::TransferRewardAuth(events::TransferRewardAuth {
            pool: self.address,
            rewarder_index,
            old_authority,
            new_authority,
        }));
        Ok(())
    }

    /// Second half: only the pending authority may promote itself.
    pub fn accept_reward_authority(
        &mut self,
        caller: Address,
        clock: &impl Clock,
        rewarder_index: usize,
    ) -> Result<(), Error> {
        self.settle_rewarders(clock.now_seconds())?;
        let rewarder = self
            .rewarders
            .get_mut(rewarder_index)
            .ok_or(StateError::InvalidRewardIndex)?;
        if rewarder.pending_authority != Some(caller) {
            return Err(StateError::RewardAuthError.into());
        }
        rewarder.authority = caller;
        rewarder.pending_authority = None;
        self.push_event(Event::AcceptRewardAuth(events::AcceptRewardAuth {
            pool: self.address,
            rewarder_index,
            authority: caller,
        }));
        Ok(())
    }
}
