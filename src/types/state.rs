// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! User state leaves and the proofs that carry them.

use alloy_primitives::{B256, U256};
use serde::{Deserialize, Serialize};

use crate::bls::PublicKey;
use crate::hash::hash_bytes;
use crate::merkle::{root_from_witness, verify_witness, zero_hash, Witness};
use crate::types::id::{PubkeyId, StateId};

/// One leaf of the state tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserState {
    pub pubkey_id: PubkeyId,
    pub token_id: U256,
    pub balance: U256,
    pub nonce: U256,
}

impl UserState {
    /// `keccak(pubkeyID ++ tokenID ++ balance ++ nonce)`, each a 32-byte word.
    pub fn leaf_hash(&self) -> B256 {
        let mut buf = [0u8; 128];
        buf[..32].copy_from_slice(&U256::from(self.pubkey_id.0).to_be_bytes::<32>());
        buf[32..64].copy_from_slice(&self.token_id.to_be_bytes::<32>());
        buf[64..96].copy_from_slice(&self.balance.to_be_bytes::<32>());
        buf[96..].copy_from_slice(&self.nonce.to_be_bytes::<32>());
        hash_bytes(&buf)
    }
}

/// Pre-state of one touched account plus its state-tree witness.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateMerkleProof {
    pub state: UserState,
    pub witness: Witness,
}

impl StateMerkleProof {
    /// State root implied by placing this leaf at `state_id`.
    pub fn root_at(&self, state_id: StateId) -> B256 {
        root_from_witness(self.state.leaf_hash(), state_id.0 as usize, &self.witness)
    }
}

/// A signer's public key plus its account-registry witness.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKeyProof {
    pub public_key: PublicKey,
    pub witness: Witness,
}

/// Receiver key of a create-and-transfer, proven by leaf hash only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiverPublicKeyProof {
    pub pubkey_hash: B256,
    pub witness: Witness,
}

/// Witness that the state subtree at `path_at_depth` is still empty.
///
/// `witness` runs from the subtree root up to the state root, so its length
/// is the state tree depth minus the subtree depth.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtreeVacancyProof {
    pub path_at_depth: u32,
    pub witness: Witness,
}

impl SubtreeVacancyProof {
    /// True when an all-empty subtree of `subtree_depth` levels sits at
    /// `path_at_depth` under `state_root`.
    pub fn is_vacant_in(&self, state_root: B256, subtree_depth: usize) -> bool {
        match zero_hash(subtree_depth) {
            Some(empty) => verify_witness(state_root, empty, self.path_at_depth as usize, &self.witness),
            None => false,
        }
    }

    /// First state id covered by the subtree.
    pub fn first_state_id(&self, subtree_depth: usize) -> Option<StateId> {
        let shift = u32::try_from(subtree_depth).ok()?;
        self.path_at_depth
            .checked_shl(shift)
            .filter(|id| id >> shift == self.path_at_depth)
            .map(StateId)
    }
}
