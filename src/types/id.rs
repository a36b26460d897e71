// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Identity types.

use serde::{Deserialize, Serialize};

/// Position of a batch in the settlement contract's batch list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct BatchId(pub u64);

impl BatchId {
    pub fn next(&self) -> Self {
        BatchId(self.0 + 1)
    }
}

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Leaf index in the state tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct StateId(pub u32);

/// Leaf index in the account (public key) registry tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct PubkeyId(pub u32);

/// Batch registrations occupy the right half of the registry tree.
pub const ACCOUNT_BATCH_OFFSET: u32 = 1 << 31;

impl PubkeyId {
    /// Registry ids for the batch slots `start..=end` a `BatchPubkeyRegistered`
    /// log reports.
    pub fn batch_registered(start: PubkeyId, end: PubkeyId) -> Vec<PubkeyId> {
        (start.0..=end.0)
            .map(|slot| PubkeyId(ACCOUNT_BATCH_OFFSET.wrapping_add(slot)))
            .collect()
    }
}
