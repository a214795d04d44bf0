use crate::asset::Asset;
use crate::collab::{AccessControl, Clock, PartnerRegistry};
use crate::error::{Error, MathError, StateError};
use crate::events::{self, Event};
use crate::math::liquidity_math::add_delta;
use crate::math::math_helpers::{mul_div_ceil_u64, mul_div_floor_u64};
use crate::math::swap_math::compute_swap_step;
use crate::math::tick_math::{get_tick_at_sqrt_price, MAX_SQRT_PRICE, MIN_SQRT_PRICE};
use crate::pool::clmm_pool::Pool;
use crate::PROTOCOL_FEE_RATE_DENOMINATOR;
use alloy_primitives::Address;
use std::mem;

/// Debt created by a flash swap: the output has already left the
/// vault, and `pay_amount` of the input side must come back through
/// [`Pool::repay_flash_swap`] in the same operation. Like the
/// add-liquidity receipt, the type cannot be cloned, stored or
/// silently dropped.
#[derive(Debug)]
#[must_use = "the receipt must be settled with Pool::repay_flash_swap"]
pub struct FlashSwapReceipt {
    pool: Address,
    a_to_b: bool,
    partner: Option<String>,
    pay_amount: u64,
    ref_fee_amount: u64,
}

impl FlashSwapReceipt {
    pub fn pool(&self) -> Address {
        self.pool
    }

    pub fn a_to_b(&self) -> bool {
        self.a_to_b
    }

    /// Input-side amount owed back to the vault, fees included.
    pub fn pay_amount(&self) -> u64 {
        self.pay_amount
    }

    /// Share of the protocol fee owed to the routing partner.
    pub fn ref_fee_amount(&self) -> u64 {
        self.ref_fee_amount
    }

    fn settle(mut self) -> (Address, bool, Option<String>, u64, u64) {
        let partner = self.partner.take();
        let parts = (
            self.pool,
            self.a_to_b,
            partner,
            self.pay_amount,
            self.ref_fee_amount,
        );
        mem::forget(self);
        parts
    }
}

impl Drop for FlashSwapReceipt {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            debug_assert!(
                false,
                "flash-swap receipt dropped without repay_flash_swap"
            );
        }
    }
}

/// One segment of a simulated swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapStepTrace {
    pub current_sqrt_price: u128,
    pub target_sqrt_price: u128,
    pub current_liquidity: u128,
    pub amount_in: u64,
    pub amount_out: u64,
    pub fee_amount: u64,
    pub remainder_amount: u64,
}

/// Result of the read-only swap simulation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalculatedSwapResult {
    pub amount_in: u64,
    pub amount_out: u64,
    pub fee_amount: u64,
    pub after_sqrt_price: u128,
    /// Set when the traversal ran out of active ticks before the
    /// budget was exhausted.
    pub is_exceed: bool,
    pub steps: Vec<SwapStepTrace>,
}

#[derive(Debug, Default, Clone, Copy)]
struct SwapTotals {
    amount_in: u64,
    amount_out: u64,
    fee_amount: u64,
    ref_fee_amount: u64,
}

impl Pool {
    /// Executes a swap and hands the output over before the input is
    /// paid. The returned receipt must be settled with
    /// [`Pool::repay_flash_swap`] in the same operation.
    ///
    /// Exactly one of the returned assets carries value: the output
    /// side. The other is a zero asset of the opposite token.
    #[allow(clippy::too_many_arguments)]
    pub fn flash_swap(
        &mut self,
        caller: Address,
        acl: &impl AccessControl,
        clock: &impl Clock,
        partners: &impl PartnerRegistry,
        partner: Option<&str>,
        a_to_b: bool,
        by_amount_in: bool,
        amount: u64,
        sqrt_price_limit: u128,
    ) -> Result<(Asset, Asset, FlashSwapReceipt), Error> {
        self.check_active(acl)?;
        if amount == 0 {
            return Err(StateError::AmountIncorrect.into());
        }
        self.check_sqrt_price_limit(sqrt_price_limit, a_to_b)?;
        let ref_rate = partner
            .map(|name| partners.ref_fee_rate(name))
            .unwrap_or(0)
            .min(PROTOCOL_FEE_RATE_DENOMINATOR);

        self.settle_rewarders(clock.now_seconds())?;
        let totals = self.execute_swap(a_to_b, by_amount_in, amount, sqrt_price_limit, ref_rate)?;

        let pay_amount = totals
            .amount_in
            .checked_add(totals.fee_amount)
            .ok_or(MathError::MultiplicationOverflow)?;
        let (asset_a, asset_b) = if a_to_b {
            (
                Asset::zero(self.token_a),
                self.withdraw(self.token_b, totals.amount_out)?,
            )
        } else {
            (
                self.withdraw(self.token_a, totals.amount_out)?,
                Asset::zero(self.token_b),
            )
        };

        tracing::debug!(
            a_to_b,
            by_amount_in,
            amount_in = totals.amount_in,
            amount_out = totals.amount_out,
            fee = totals.fee_amount,
            "flash swap executed"
        );
        self.push_event(Event::Swap(events::Swap {
            a_to_b,
            pool: self.address,
            swap_from: caller,
            partner: partner.unwrap_or_default().to_string(),
            amount_in: totals.amount_in,
            amount_out: totals.amount_out,
            ref_amount: totals.ref_fee_amount,
            fee_amount: totals.fee_amount,
            vault_a_amount: self.vault_balance(self.token_a),
            vault_b_amount: self.vault_balance(self.token_b),
        }));

        Ok((
            asset_a,
            asset_b,
            FlashSwapReceipt {
                pool: self.address,
                a_to_b,
                partner: partner.map(str::to_string),
                pay_amount,
                ref_fee_amount: totals.ref_fee_amount,
            },
        ))
    }

    /// Settles a flash swap: verifies the exact input amount, peels
    /// the partner's referral share off the top and vaults the rest.
    pub fn repay_flash_swap(
        &mut self,
        asset_a: Asset,
        asset_b: Asset,
        receipt: FlashSwapReceipt,
        partners: &mut impl PartnerRegistry,
    ) -> Result<(), Error> {
        let (pool, a_to_b, partner, pay_amount, ref_fee_amount) = receipt.settle();
        if pool != self.address {
            return Err(StateError::AmountIncorrect.into());
        }
        let (mut payment, other) = if a_to_b {
            (asset_a, asset_b)
        } else {
            (asset_b, asset_a)
        };
        let pay_token = if a_to_b { self.token_a } else { self.token_b };
        if payment.token() != pay_token || payment.amount() != pay_amount {
            return Err(StateError::AmountIncorrect.into());
        }
        other.destroy_zero()?;

        if ref_fee_amount > 0 {
            if let Some(name) = partner.as_deref() {
                let ref_fee = payment.extract(ref_fee_amount)?;
                partners.receive_ref_fee(name, ref_fee);
            }
        }
        self.deposit(payment);
        Ok(())
    }

    /// One-call swap for hosts that custody the input up front:
    /// simulates, enforces the amount threshold, then executes and
    /// settles the flash swap. Returns `(output, change)`.
    #[allow(clippy::too_many_arguments)]
    pub fn swap(
        &mut self,
        caller: Address,
        acl: &impl AccessControl,
        clock: &impl Clock,
        partners: &mut impl PartnerRegistry,
        partner: Option<&str>,
        a_to_b: bool,
        by_amount_in: bool,
        amount: u64,
        amount_limit: u64,
        sqrt_price_limit: u128,
        mut asset_in: Asset,
    ) -> Result<(Asset, Asset), Error> {
        self.check_active(acl)?;
        self.check_sqrt_price_limit(sqrt_price_limit, a_to_b)?;

        let expected = self.simulate_swap(a_to_b, by_amount_in, amount, sqrt_price_limit)?;
        let expected_pay = expected
            .amount_in
            .checked_add(expected.fee_amount)
            .ok_or(MathError::MultiplicationOverflow)?;
        if by_amount_in {
            if expected.amount_out < amount_limit {
                return Err(StateError::AmountOutBelowLimit.into());
            }
        } else if expected_pay > amount_limit {
            return Err(StateError::AmountInAboveLimit.into());
        }

        let pay_token = if a_to_b { self.token_a } else { self.token_b };
        if asset_in.token() != pay_token || asset_in.amount() < expected_pay {
            return Err(StateError::AmountIncorrect.into());
        }

        let (out_a, out_b, receipt) = self.flash_swap(
            caller,
            acl,
            clock,
            &*partners,
            partner,
            a_to_b,
            by_amount_in,
            amount,
            sqrt_price_limit,
        )?;
        let payment = asset_in.extract(receipt.pay_amount())?;
        let (pay_a, pay_b) = if a_to_b {
            (payment, Asset::zero(self.token_b))
        } else {
            (Asset::zero(self.token_a), payment)
        };
        self.repay_flash_swap(pay_a, pay_b, receipt, partners)?;

        if a_to_b {
            out_a.destroy_zero()?;
            Ok((out_b, asset_in))
        } else {
            out_b.destroy_zero()?;
            Ok((out_a, asset_in))
        }
    }

    /// Read-only swap simulation over the full tick range: returns the
    /// per-segment trace and whether the traversal fell off the end of
    /// the active ticks.
    pub fn calculate_swap_result(
        &self,
        a_to_b: bool,
        by_amount_in: bool,
        amount: u64,
    ) -> Result<CalculatedSwapResult, Error> {
        let bound = if a_to_b { MIN_SQRT_PRICE } else { MAX_SQRT_PRICE };
        self.simulate_swap(a_to_b, by_amount_in, amount, bound)
    }

    // ---------------------------------------------------------------
    // internals
    // ---------------------------------------------------------------

    fn check_sqrt_price_limit(&self, limit: u128, a_to_b: bool) -> Result<(), Error> {
        let valid = if a_to_b {
            limit < self.sqrt_price_current && limit >= MIN_SQRT_PRICE
        } else {
            limit > self.sqrt_price_current && limit <= MAX_SQRT_PRICE
        };
        if valid {
            Ok(())
        } else {
            Err(StateError::WrongSqrtPriceLimit.into())
        }
    }

    // The mutating swap loop: segment by segment between active ticks,
    // splitting fees and crossing ticks in traversal order.
    fn execute_swap(
        &mut self,
        a_to_b: bool,
        by_amount_in: bool,
        amount: u64,
        sqrt_price_limit: u128,
        ref_rate: u64,
    ) -> Result<SwapTotals, Error> {
        let mut remaining = amount;
        let mut totals = SwapTotals::default();

        while remaining > 0 && self.sqrt_price_current != sqrt_price_limit {
            let next_tick_index = self
                .tick_directory
                .next_active(self.tick_current, a_to_b)
                .ok_or(StateError::NotEnoughLiquidity)?;
            let next_sqrt_price = self
                .ticks
                .get(&next_tick_index)
                .ok_or(StateError::InvariantViolated)?
                .sqrt_price;
            let target = if a_to_b {
                next_sqrt_price.max(sqrt_price_limit)
            } else {
                next_sqrt_price.min(sqrt_price_limit)
            };

            let step = compute_swap_step(
                self.sqrt_price_current,
                target,
                self.liquidity_active,
                remaining,
                self.fee_rate,
                a_to_b,
                by_amount_in,
            )?;

            let consumed = if by_amount_in {
                step.amount_in
                    .checked_add(step.fee_amount)
                    .ok_or(StateError::RemainderUnderflow)?
            } else {
                step.amount_out
            };
            remaining = remaining
                .checked_sub(consumed)
                .ok_or(StateError::RemainderUnderflow)?;

            totals.amount_in = totals
                .amount_in
                .checked_add(step.amount_in)
                .ok_or(MathError::MultiplicationOverflow)?;
            totals.amount_out = totals
                .amount_out
                .checked_add(step.amount_out)
                .ok_or(MathError::MultiplicationOverflow)?;
            totals.fee_amount = totals
                .fee_amount
                .checked_add(step.fee_amount)
                .ok_or(MathError::MultiplicationOverflow)?;

            let ref_fee = self.apply_swap_fee(step.fee_amount, ref_rate, a_to_b)?;
            totals.ref_fee_amount = totals
                .ref_fee_amount
                .checked_add(ref_fee)
                .ok_or(MathError::MultiplicationOverflow)?;

            if step.sqrt_price_next == next_sqrt_price {
                self.sqrt_price_current = next_sqrt_price;
                self.cross_tick(next_tick_index, a_to_b)?;
                self.tick_current = if a_to_b {
                    next_tick_index - 1
                } else {
                    next_tick_index
                };
            } else {
                self.sqrt_price_current = step.sqrt_price_next;
                self.tick_current = get_tick_at_sqrt_price(step.sqrt_price_next)?;
            }
        }

        Ok(totals)
    }

    /// Splits one segment's fee between the protocol, the partner and
    /// the in-range liquidity. Returns the partner's share.
    fn apply_swap_fee(&mut self, fee: u64, ref_rate: u64, a_to_b: bool) -> Result<u64, Error> {
        if fee == 0 {
            return Ok(0);
        }
        let protocol_fee =
            mul_div_ceil_u64(fee, self.protocol_fee_rate, PROTOCOL_FEE_RATE_DENOMINATOR)?;
        let liquidity_fee = fee - protocol_fee;
        let ref_fee = if ref_rate == 0 {
            0
        } else {
            mul_div_floor_u64(protocol_fee, ref_rate, PROTOCOL_FEE_RATE_DENOMINATOR)?
        };
        let protocol_kept = protocol_fee - ref_fee;

        if a_to_b {
            self.fee_protocol_a = self.fee_protocol_a.wrapping_add(protocol_kept);
        } else {
            self.fee_protocol_b = self.fee_protocol_b.wrapping_add(protocol_kept);
        }
        if liquidity_fee > 0 && self.liquidity_active > 0 {
            let growth = ((liquidity_fee as u128) << 64) / self.liquidity_active;
            if a_to_b {
                self.fee_growth_global_a = self.fee_growth_global_a.wrapping_add(growth);
            } else {
                self.fee_growth_global_b = self.fee_growth_global_b.wrapping_add(growth);
            }
        }
        Ok(ref_fee)
    }

    fn cross_tick(&mut self, tick_index: i32, a_to_b: bool) -> Result<(), Error> {
        let rewarder_globals = self.rewarder_growth_globals();
        let fee_growth_global_a = self.fee_growth_global_a;
        let fee_growth_global_b = self.fee_growth_global_b;

        let tick = self
            .ticks
            .get_mut(&tick_index)
            .ok_or(StateError::InvariantViolated)?;
        let delta = if a_to_b {
            tick.liquidity_net
                .checked_neg()
                .ok_or(MathError::LiquidityOverflow)?
        } else {
            tick.liquidity_net
        };
        tick.cross(fee_growth_global_a, fee_growth_global_b, &rewarder_globals);
        self.liquidity_active = add_delta(self.liquidity_active, delta)?;
        Ok(())
    }

    // Same traversal as `execute_swap`, against a local cursor.
    fn simulate_swap(
        &self,
        a_to_b: bool,
        by_amount_in: bool,
        amount: u64,
        sqrt_price_limit: u128,
    ) -> Result<CalculatedSwapResult, Error> {
        let mut sqrt_price = self.sqrt_price_current;
        let mut tick_current = self.tick_current;
        let mut liquidity = self.liquidity_active;
        let mut remaining = amount;
        let mut result = CalculatedSwapResult {
            after_sqrt_price: sqrt_price,
            ..Default::default()
        };

        while remaining > 0 && sqrt_price != sqrt_price_limit {
            let Some(next_tick_index) = self.tick_directory.next_active(tick_current, a_to_b)
            else {
                result.is_exceed = true;
                break;
            };
            let tick = self
                .ticks
                .get(&next_tick_index)
                .ok_or(StateError::InvariantViolated)?;
            let target = if a_to_b {
                tick.sqrt_price.max(sqrt_price_limit)
            } else {
                tick.sqrt_price.min(sqrt_price_limit)
            };

            let step = compute_swap_step(
                sqrt_price,
                target,
                liquidity,
                remaining,
                self.fee_rate,
                a_to_b,
                by_amount_in,
            )?;

            let consumed = if by_amount_in {
                step.amount_in
                    .checked_add(step.fee_amount)
                    .ok_or(StateError::RemainderUnderflow)?
            } else {
                step.amount_out
            };
            remaining = remaining
                .checked_sub(consumed)
                .ok_or(StateError::RemainderUnderflow)?;

            result.steps.push(SwapStepTrace {
                current_sqrt_price: sqrt_price,
                target_sqrt_price: target,
                current_liquidity: liquidity,
                amount_in: step.amount_in,
                amount_out: step.amount_out,
                fee_amount: step.fee_amount,
                remainder_amount: remaining,
            });
            result.amount_in = result
                .amount_in
                .checked_add(step.amount_in)
                .ok_or(MathError::MultiplicationOverflow)?;
            result.amount_out = result
                .amount_out
                .checked_add(step.amount_out)
                .ok_or(MathError::MultiplicationOverflow)?;
            result.fee_amount = result
                .fee_amount
                .checked_add(step.fee_amount)
                .ok_or(MathError::MultiplicationOverflow)?;

            if step.sqrt_price_next == tick.sqrt_price {
                let delta = if a_to_b {
                    tick.liquidity_net
                        .checked_neg()
                        .ok_or(MathError::LiquidityOverflow)?
                } else {
                    tick.liquidity_net
                };
                liquidity = add_delta(liquidity, delta)?;
                sqrt_price = tick.sqrt_price;
                tick_current = if a_to_b {
                    next_tick_index - 1
                } else {
                    next_tick_index
                };
            } else {
                sqrt_price = step.sqrt_price_next;
                tick_current = get_tick_at_sqrt_price(sqrt_price)?;
            }
        }

        result.after_sqrt_price = sqrt_price;
        Ok(result)
    }
}
