// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Batches, locally held and as the settlement contract reports them.

use alloy_primitives::{Address, B256, U256};
use byteorder::{BigEndian, ByteOrder};
use serde::{Deserialize, Serialize};

use crate::error::{KernelError, Result};
use crate::merkle::{MerkleTree, Witness};
use crate::types::commitment::Commitment;
use crate::types::enums::BatchType;
use crate::types::id::BatchId;

/// Ordered commitments anchored by one on-chain commitment root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Batch {
    pub id: BatchId,
    pub batch_type: BatchType,
    pub commitments: Vec<Commitment>,
    /// Block after which the batch can no longer be disputed. `None` until mined.
    pub finalisation_block: Option<u64>,
}

impl Batch {
    /// Every commitment must be of the batch's own kind.
    pub fn new(id: BatchId, batch_type: BatchType, commitments: Vec<Commitment>) -> Result<Self> {
        if let Some(bad) = commitments.iter().find(|c| c.kind() != batch_type) {
            return Err(KernelError::Encoding(format!(
                "{} commitment in {} batch {}",
                bad.kind(),
                batch_type,
                id
            )));
        }
        Ok(Self {
            id,
            batch_type,
            commitments,
            finalisation_block: None,
        })
    }

    pub fn with_finalisation_block(mut self, block: u64) -> Self {
        self.finalisation_block = Some(block);
        self
    }

    pub fn leaves(&self) -> Vec<B256> {
        self.commitments.iter().map(Commitment::leaf_hash).collect()
    }

    pub fn commitment_tree(&self) -> Result<MerkleTree> {
        MerkleTree::build(&self.leaves())
    }

    /// Root the contract stores for this batch.
    pub fn commitment_root(&self) -> Result<B256> {
        Ok(self.commitment_tree()?.root())
    }

    /// Commitment at `index` together with its witness in the batch tree.
    pub fn inclusion_proof(&self, index: usize) -> Result<(&Commitment, Witness)> {
        let commitment = self.commitments.get(index).ok_or(KernelError::WitnessIndexOutOfRange {
            index,
            capacity: self.commitments.len(),
        })?;
        let witness = self.commitment_tree()?.witness(index)?;
        Ok((commitment, witness))
    }

    pub fn last_commitment_index(&self) -> Option<usize> {
        self.commitments.len().checked_sub(1)
    }

    /// Finalised once the chain has reached the finalisation block.
    pub fn is_finalised(&self, current_block: u64) -> bool {
        matches!(self.finalisation_block, Some(block) if current_block >= block)
    }
}

/// Batch record as returned by the contract's `getBatch` view.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractBatch {
    pub id: BatchId,
    /// Commitment root recorded on-chain.
    pub hash: B256,
    pub batch_type: BatchType,
    pub size: u8,
    pub committer: Address,
    pub finalisation_block: u64,
}

impl ContractBatch {
    /// Decode the packed `meta` word:
    /// `batchType(1) | size(1) | committer(20) | finaliseOn(4) | unused(6)`.
    pub fn from_meta(id: BatchId, hash: B256, meta: B256) -> Result<Self> {
        let bytes = meta.as_slice();
        let batch_type = BatchType::from_u8(bytes[0]).ok_or(KernelError::InvalidBatchType(bytes[0]))?;
        let size = bytes[1];
        let committer = Address::from_slice(&bytes[2..22]);
        let finalisation_block = u64::from(BigEndian::read_u32(&bytes[22..26]));
        Ok(Self {
            id,
            hash,
            batch_type,
            size,
            committer,
            finalisation_block,
        })
    }

    /// Inverse of `from_meta`, used when scripting contract state.
    pub fn meta(&self) -> B256 {
        let mut bytes = [0u8; 32];
        bytes[0] = self.batch_type as u8;
        bytes[1] = self.size;
        bytes[2..22].copy_from_slice(self.committer.as_slice());
        BigEndian::write_u32(&mut bytes[22..26], self.finalisation_block as u32);
        B256::from(bytes)
    }

    pub fn meta_word(&self) -> U256 {
        U256::from_be_bytes(self.meta().0)
    }

    pub fn is_finalised(&self, current_block: u64) -> bool {
        current_block >= self.finalisation_block
    }
}
