//! Token Operations Module
//!
//! The ledger never moves tokens itself. It calls an [`AssetGateway`]: a
//! fungible-token service that pulls deposits into the ledger's custody
//! account and pushes payouts back out, reporting success or failure.
//!
//! [`InMemoryToken`] is an ERC-20 style implementation (`transfer`,
//! `approve`, `transfer_from`, `balance_of`) used by tests and simulations.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Address;
use crate::BTreeMap;

// ============================================================================
// Gateway
// ============================================================================

/// Why the token service refused a movement
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance { available: u128, requested: u128 },

    #[error("insufficient allowance: available {available}, requested {requested}")]
    InsufficientAllowance { available: u128, requested: u128 },

    #[error("balance overflow")]
    Overflow,

    #[error("transfer rejected: {reason}")]
    Rejected { reason: &'static str },
}

/// External fungible-asset service used by the ledger
///
/// Calls are synchronous and final: the ledger waits for the result and
/// commits or discards its own state change accordingly.
pub trait AssetGateway {
    /// Move `amount` from `from` into the ledger's custody
    fn pull(&mut self, from: &Address, amount: u128) -> Result<(), GatewayError>;

    /// Move `amount` from the ledger's custody to `to`
    fn push(&mut self, to: &Address, amount: u128) -> Result<(), GatewayError>;

    fn balance_of(&self, account: &Address) -> u128;

    /// The account holding staked principal and the reward pool
    fn custody(&self) -> Address;
}

impl<G: AssetGateway + ?Sized> AssetGateway for &mut G {
    fn pull(&mut self, from: &Address, amount: u128) -> Result<(), GatewayError> {
        (**self).pull(from, amount)
    }

    fn push(&mut self, to: &Address, amount: u128) -> Result<(), GatewayError> {
        (**self).push(to, amount)
    }

    fn balance_of(&self, account: &Address) -> u128 {
        (**self).balance_of(account)
    }

    fn custody(&self) -> Address {
        (**self).custody()
    }
}

// ============================================================================
// In-memory token
// ============================================================================

/// ERC-20 style token kept in memory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct InMemoryToken {
    custody: Address,
    total_supply: u128,
    balances: BTreeMap<Address, u128>,
    /// (owner, spender) -> remaining allowance
    allowances: BTreeMap<(Address, Address), u128>,
}

impl InMemoryToken {
    /// New token whose gateway custody account is `custody`
    pub fn new(custody: Address) -> Self {
        Self {
            custody,
            ..Self::default()
        }
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        self.allowances.get(&(*owner, *spender)).copied().unwrap_or(0)
    }

    /// Create new tokens (deployment and test setup)
    pub fn mint(&mut self, to: &Address, amount: u128) -> Result<(), GatewayError> {
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(GatewayError::Overflow)?;
        let balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(GatewayError::Overflow)?;
        self.total_supply = supply;
        self.balances.insert(*to, balance);
        Ok(())
    }

    pub fn transfer(&mut self, from: &Address, to: &Address, amount: u128) -> Result<(), GatewayError> {
        let from_balance = self.balance_of(from);
        if from_balance < amount {
            return Err(GatewayError::InsufficientBalance {
                available: from_balance,
                requested: amount,
            });
        }
        if from == to {
            return Ok(());
        }
        let to_balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(GatewayError::Overflow)?;

        self.balances.insert(*from, from_balance - amount);
        self.balances.insert(*to, to_balance);
        Ok(())
    }

    pub fn approve(&mut self, owner: &Address, spender: &Address, amount: u128) {
        self.allowances.insert((*owner, *spender), amount);
    }

    /// Spend `spender`'s allowance over `from` to move tokens to `to`
    pub fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), GatewayError> {
        let allowance = self.allowance(from, spender);
        if allowance < amount {
            return Err(GatewayError::InsufficientAllowance {
                available: allowance,
                requested: amount,
            });
        }
        self.transfer(from, to, amount)?;
        self.allowances.insert((*from, *spender), allowance - amount);
        Ok(())
    }
}

impl AssetGateway for InMemoryToken {
    fn pull(&mut self, from: &Address, amount: u128) -> Result<(), GatewayError> {
        let custody = self.custody;
        self.transfer_from(&custody, from, &custody, amount)
    }

    fn push(&mut self, to: &Address, amount: u128) -> Result<(), GatewayError> {
        let custody = self.custody;
        self.transfer(&custody, to, amount)
    }

    fn balance_of(&self, account: &Address) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn custody(&self) -> Address {
        self.custody
    }
}
