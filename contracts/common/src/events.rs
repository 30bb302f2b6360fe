//! Ledger Events
//!
//! Events are emitted after each committed mutation and can be indexed
//! off-chain for UIs, analytics and audits.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::types::{Address, StakeConfig};
use crate::Vec;

/// Event types for indexing and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum EventType {
    // Stake Events (0x01 - 0x1F)
    StakeCreated = 0x01,
    StakeClaimed = 0x02,

    // Pool Events (0x20 - 0x3F)
    RewardPoolFunded = 0x20,

    // Admin Events (0x80 - 0x9F)
    StakeConfigUpdated = 0x80,
    AdminTransferred = 0x81,
}

/// Main event enum containing all ledger events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum StakingEvent {
    /// Emitted when a user locks tokens
    StakeCreated {
        user: Address,
        index: u64,
        amount: u128,
        config_index: u32,
        timestamp: u64,
    },

    /// Emitted when a stake is unstaked and paid out
    StakeClaimed {
        user: Address,
        index: u64,
        amount: u128,
        reward: u128,
        timestamp: u64,
    },

    /// Emitted when the administrator tops up the reward pool
    RewardPoolFunded {
        funder: Address,
        amount: u128,
        timestamp: u64,
    },

    /// Emitted when a stake table entry is replaced or appended
    StakeConfigUpdated {
        index: u32,
        previous: Option<StakeConfig>,
        config: StakeConfig,
        timestamp: u64,
    },

    /// Emitted when the administrator role moves
    AdminTransferred {
        old_admin: Address,
        new_admin: Address,
        timestamp: u64,
    },
}

impl StakingEvent {
    /// Get the event type for filtering
    pub fn event_type(&self) -> EventType {
        match self {
            Self::StakeCreated { .. } => EventType::StakeCreated,
            Self::StakeClaimed { .. } => EventType::StakeClaimed,
            Self::RewardPoolFunded { .. } => EventType::RewardPoolFunded,
            Self::StakeConfigUpdated { .. } => EventType::StakeConfigUpdated,
            Self::AdminTransferred { .. } => EventType::AdminTransferred,
        }
    }

    /// Get the time the event occurred
    pub fn timestamp(&self) -> u64 {
        match self {
            Self::StakeCreated { timestamp, .. }
            | Self::StakeClaimed { timestamp, .. }
            | Self::RewardPoolFunded { timestamp, .. }
            | Self::StakeConfigUpdated { timestamp, .. }
            | Self::AdminTransferred { timestamp, .. } => *timestamp,
        }
    }

    /// Serialize event to bytes for storage/transmission
    pub fn to_bytes(&self) -> Vec<u8> {
        borsh::to_vec(self).unwrap_or_default()
    }

    /// Deserialize event from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        borsh::from_slice(bytes).ok()
    }
}

/// Record of committed mutations; the host drains it
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<StakingEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: StakingEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[StakingEvent] {
        &self.events
    }

    /// Most recent event, if any
    pub fn last(&self) -> Option<&StakingEvent> {
        self.events.last()
    }

    /// Remove and return everything emitted so far
    pub fn drain(&mut self) -> Vec<StakingEvent> {
        core::mem::take(&mut self.events)
    }

    pub fn filter_by_type(&self, event_type: EventType) -> Vec<&StakingEvent> {
        self.events
            .iter()
            .filter(|event| event.event_type() == event_type)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
