// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Commitments: one state transition unit inside a batch.
//!
//! # Leaf Hash
//! ```text
//! leaf      = keccak(stateRoot ++ bodyRoot)
//! transfer  : bodyRoot = keccak(accountRoot ++ sig[64] ++ feeReceiver[32] ++ txs)
//! migration : bodyRoot = keccak(accountRoot ++ sig[64] ++ spokeID[32] ++ withdrawRoot
//!                               ++ tokenID[32] ++ amount[32] ++ feeReceiver[32] ++ txs)
//! deposit   : bodyRoot = zero leaf
//! genesis   : bodyRoot = zero leaf
//! ```

use alloy_primitives::{Bytes, B256, U256};

use crate::bls::Signature;
use crate::hash::{hash_bytes, hash_two, zero_leaf};
use crate::types::enums::BatchType;

/// Body shared by transfer and create-and-transfer commitments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferBody {
    pub account_root: B256,
    pub signature: Signature,
    pub fee_receiver: u32,
    pub txs: Bytes,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MassMigrationBody {
    pub account_root: B256,
    pub signature: Signature,
    pub spoke_id: u32,
    pub withdraw_root: B256,
    pub token_id: U256,
    pub amount: U256,
    pub fee_receiver: u32,
    pub txs: Bytes,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DepositBody {
    pub subtree_id: U256,
    pub subtree_root: B256,
}

/// Kind-specific payload. The variant decides which fields exist, so a
/// wrong-kind access is an `Option::None`, never a panic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommitmentBody {
    Transfer(TransferBody),
    Create2Transfer(TransferBody),
    MassMigration(MassMigrationBody),
    Deposit(DepositBody),
    Genesis,
}

impl CommitmentBody {
    pub fn kind(&self) -> BatchType {
        match self {
            CommitmentBody::Transfer(_) => BatchType::Transfer,
            CommitmentBody::Create2Transfer(_) => BatchType::Create2Transfer,
            CommitmentBody::MassMigration(_) => BatchType::MassMigration,
            CommitmentBody::Deposit(_) => BatchType::Deposit,
            CommitmentBody::Genesis => BatchType::Genesis,
        }
    }

    pub fn as_transfer(&self) -> Option<&TransferBody> {
        match self {
            CommitmentBody::Transfer(body) | CommitmentBody::Create2Transfer(body) => Some(body),
            _ => None,
        }
    }

    pub fn as_mass_migration(&self) -> Option<&MassMigrationBody> {
        match self {
            CommitmentBody::MassMigration(body) => Some(body),
            _ => None,
        }
    }

    pub fn as_deposit(&self) -> Option<&DepositBody> {
        match self {
            CommitmentBody::Deposit(body) => Some(body),
            _ => None,
        }
    }

    pub fn signature(&self) -> Option<&Signature> {
        match self {
            CommitmentBody::Transfer(body) | CommitmentBody::Create2Transfer(body) => Some(&body.signature),
            CommitmentBody::MassMigration(body) => Some(&body.signature),
            CommitmentBody::Deposit(_) | CommitmentBody::Genesis => None,
        }
    }

    pub fn txs(&self) -> Option<&Bytes> {
        match self {
            CommitmentBody::Transfer(body) | CommitmentBody::Create2Transfer(body) => Some(&body.txs),
            CommitmentBody::MassMigration(body) => Some(&body.txs),
            CommitmentBody::Deposit(_) | CommitmentBody::Genesis => None,
        }
    }

    pub fn body_root(&self) -> B256 {
        match self {
            CommitmentBody::Transfer(body) | CommitmentBody::Create2Transfer(body) => {
                let mut buf = Vec::with_capacity(32 + 64 + 32 + body.txs.len());
                buf.extend_from_slice(body.account_root.as_slice());
                buf.extend_from_slice(&body.signature.to_bytes());
                buf.extend_from_slice(&U256::from(body.fee_receiver).to_be_bytes::<32>());
                buf.extend_from_slice(&body.txs);
                hash_bytes(&buf)
            }
            CommitmentBody::MassMigration(body) => {
                let mut buf = Vec::with_capacity(32 * 7 + 32 + body.txs.len());
                buf.extend_from_slice(body.account_root.as_slice());
                buf.extend_from_slice(&body.signature.to_bytes());
                buf.extend_from_slice(&U256::from(body.spoke_id).to_be_bytes::<32>());
                buf.extend_from_slice(body.withdraw_root.as_slice());
                buf.extend_from_slice(&body.token_id.to_be_bytes::<32>());
                buf.extend_from_slice(&body.amount.to_be_bytes::<32>());
                buf.extend_from_slice(&U256::from(body.fee_receiver).to_be_bytes::<32>());
                buf.extend_from_slice(&body.txs);
                hash_bytes(&buf)
            }
            CommitmentBody::Deposit(_) | CommitmentBody::Genesis => zero_leaf(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commitment {
    /// State root after applying this commitment.
    pub state_root: B256,
    pub body: CommitmentBody,
}

impl Commitment {
    pub fn new(state_root: B256, body: CommitmentBody) -> Self {
        Self { state_root, body }
    }

    pub fn kind(&self) -> BatchType {
        self.body.kind()
    }

    pub fn body_root(&self) -> B256 {
        self.body.body_root()
    }

    /// Leaf of the batch commitment tree.
    pub fn leaf_hash(&self) -> B256 {
        hash_two(&self.state_root, &self.body_root())
    }
}
