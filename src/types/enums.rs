// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Batch Enums.

use serde::{Deserialize, Serialize};

/// Transition kind of a batch, as tagged in the on-chain meta word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum BatchType {
    Genesis = 0,
    Transfer = 1,
    MassMigration = 2,
    Create2Transfer = 3,
    Deposit = 4,
}

impl BatchType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(BatchType::Genesis),
            1 => Some(BatchType::Transfer),
            2 => Some(BatchType::MassMigration),
            3 => Some(BatchType::Create2Transfer),
            4 => Some(BatchType::Deposit),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BatchType::Genesis => "genesis",
            BatchType::Transfer => "transfer",
            BatchType::MassMigration => "mass-migration",
            BatchType::Create2Transfer => "create2transfer",
            BatchType::Deposit => "deposit",
        }
    }

    /// Whether batches of this kind carry signed user transactions.
    pub fn carries_transactions(&self) -> bool {
        matches!(
            self,
            BatchType::Transfer | BatchType::MassMigration | BatchType::Create2Transfer
        )
    }
}

impl Default for BatchType {
    fn default() -> Self {
        BatchType::Transfer
    }
}

impl std::fmt::Display for BatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
