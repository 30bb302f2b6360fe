//! ZKL Staking Common Library
//!
//! Shared types, constants, and accounting primitives for the ZKL staking
//! ledger. The ledger crate (`zkl-staking`) composes these pieces into the
//! user-facing `stake` / `unstake` / `fund_reward_pool` operations.
//!
//! ## Components
//!
//! - **Stake Configuration Table**: lock period and APR per selector
//! - **Reward Engine**: veZKL weight and fixed reward computed at stake time
//! - **Pool Accountant**: `total_staked`, `total_locked_rewards`,
//!   `reward_pool` and per-user weight, updated through plan/commit/revert
//! - **Asset Gateway**: the token service the ledger pulls from and pays out to
//! - **Events**: observable record of every committed mutation
//!
//! This crate is `no_std` compatible when built without the default
//! `std` feature.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

// Re-export collections for submodules based on feature
#[cfg(not(feature = "std"))]
pub use alloc::{collections::BTreeMap, vec::Vec};
#[cfg(feature = "std")]
pub use std::{collections::BTreeMap, vec::Vec};

pub mod constants;
pub mod errors;
pub mod types;
pub mod validation;
pub mod math;
pub mod config_table;
pub mod accountant;
pub mod events;
pub mod access_control;
pub mod token_ops;


// Re-exports for convenience
pub use errors::*;
pub use types::*;
pub use math::*;
pub use config_table::StakeConfigTable;
pub use accountant::{LedgerDelta, LedgerState, PlannedUpdate};
pub use events::*;
pub use access_control::AdminControl;
pub use token_ops::{AssetGateway, GatewayError, InMemoryToken};
