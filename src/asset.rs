use crate::error::{Error, StateError};
use alloy_primitives::Address;

/// A quantity of one fungible token moving through the engine.
///
/// Assets are value objects issued by the host's custody layer; the
/// engine only splits, merges and deposits them. The type is neither
/// `Clone` nor `Copy`, so an amount cannot be double-spent inside a
/// single operation.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "assets carry value and must be deposited, returned or destroyed"]
pub struct Asset {
    token: Address,
    amount: u64,
}

impl Asset {
    /// Issues an asset. Custody of the backing balance is the host's
    /// responsibility; inside the engine assets only ever come from
    /// vault withdrawals.
    pub fn new(token: Address, amount: u64) -> Self {
        Self { token, amount }
    }

    pub fn zero(token: Address) -> Self {
        Self { token, amount: 0 }
    }

    pub fn token(&self) -> Address {
        self.token
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    /// Splits `amount` off into a new asset of the same token.
    pub fn extract(&mut self, amount: u64) -> Result<Asset, Error> {
        if amount > self.amount {
            return Err(StateError::AmountIncorrect.into());
        }
        self.amount -= amount;
        Ok(Asset {
            token: self.token,
            amount,
        })
    }

    /// Merges another asset of the same token into this one.
    pub fn join(&mut self, other: Asset) -> Result<(), Error> {
        if other.token != self.token {
            return Err(StateError::AmountIncorrect.into());
        }
        self.amount = self
            .amount
            .checked_add(other.amount)
            .ok_or(StateError::AmountIncorrect)?;
        Ok(())
    }

    /// Consumes an empty asset. Fails if any value is left.
    pub fn destroy_zero(self) -> Result<(), Error> {
        if self.amount != 0 {
            return Err(StateError::AmountIncorrect.into());
        }
        Ok(())
    }
}
