// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Merkle Witness Engine
//!
//! Fixed-depth, zero-padded binary Keccak tree over an ordered leaf list.
//!
//! # Layout
//! ```text
//! level depth   : [root]
//! ...
//! level 1       : [h(l0,l1)] [h(l2,l3)] ...
//! level 0       : [l0] [l1] [l2] [l3] ...
//! ```
//! Only nodes covering real leaves are stored. A sibling that falls past
//! the stored nodes of a level is the zero hash of that level, so padding
//! never has to be materialised.

use alloy_primitives::B256;
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex};

use crate::error::{KernelError, Result};
use crate::hash::{hash_two, zero_leaf};

/// Deepest tree the settlement contract accepts.
pub const MAX_DEPTH: usize = 32;

/// Sibling hashes from leaf to root.
pub type Witness = Vec<B256>;

/// Hash of an empty subtree at every level, `levels[0]` being the empty leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZeroHashes {
    levels: [B256; MAX_DEPTH + 1],
}

impl ZeroHashes {
    pub fn new(zero_leaf: B256) -> Self {
        let mut levels = [B256::ZERO; MAX_DEPTH + 1];
        levels[0] = zero_leaf;
        for level in 1..=MAX_DEPTH {
            levels[level] = hash_two(&levels[level - 1], &levels[level - 1]);
        }
        Self { levels }
    }

    /// Zero hash at `level`, `None` past `MAX_DEPTH`.
    pub fn get(&self, level: usize) -> Option<B256> {
        self.levels.get(level).copied()
    }
}

static DEFAULT_ZERO_HASHES: Lazy<Arc<ZeroHashes>> =
    Lazy::new(|| Arc::new(ZeroHashes::new(zero_leaf())));

static CUSTOM_ZERO_HASHES: Lazy<Mutex<FxHashMap<B256, Arc<ZeroHashes>>>> =
    Lazy::new(|| Mutex::new(FxHashMap::default()));

/// Memoised zero-hash table for `zero_leaf`.
fn zero_hashes_for(leaf: B256) -> Arc<ZeroHashes> {
    if leaf == DEFAULT_ZERO_HASHES.levels[0] {
        return DEFAULT_ZERO_HASHES.clone();
    }
    let mut cache = CUSTOM_ZERO_HASHES
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    cache
        .entry(leaf)
        .or_insert_with(|| Arc::new(ZeroHashes::new(leaf)))
        .clone()
}

/// Zero hash of the default empty leaf at `level`.
pub fn zero_hash(level: usize) -> Option<B256> {
    DEFAULT_ZERO_HASHES.get(level)
}

/// Levels needed above the leaves to hold `leaf_count` leaves.
fn required_depth(leaf_count: usize) -> usize {
    if leaf_count <= 1 {
        0
    } else {
        (usize::BITS - (leaf_count - 1).leading_zeros()) as usize
    }
}

#[derive(Debug, Clone)]
pub struct MerkleTree {
    levels: Vec<Vec<B256>>,
    depth: usize,
    zero: Arc<ZeroHashes>,
}

impl MerkleTree {
    /// Build a tree padded with the default empty leaf.
    pub fn build(leaves: &[B256]) -> Result<Self> {
        Self::build_with_zero_leaf(leaves, DEFAULT_ZERO_HASHES.levels[0])
    }

    /// Build a tree padded with a caller-supplied empty leaf.
    pub fn build_with_zero_leaf(leaves: &[B256], zero_leaf: B256) -> Result<Self> {
        if leaves.is_empty() {
            return Err(KernelError::EmptyLeaves);
        }
        let depth = required_depth(leaves.len());
        if depth > MAX_DEPTH {
            return Err(KernelError::TreeTooDeep { depth, max: MAX_DEPTH });
        }

        let zero = zero_hashes_for(zero_leaf);
        let mut levels = Vec::with_capacity(depth + 1);
        levels.push(leaves.to_vec());

        for level in 0..depth {
            let below = &levels[level];
            let pad = zero.levels[level];
            let parents = below
                .chunks(2)
                .map(|pair| match pair {
                    [left, right] => hash_two(left, right),
                    [left] => hash_two(left, &pad),
                    _ => unreachable!("chunks(2) yields one or two nodes"),
                })
                .collect::<Vec<_>>();
            levels.push(parents);
        }

        Ok(Self { levels, depth, zero })
    }

    pub fn root(&self) -> B256 {
        self.levels[self.depth][0]
    }

    /// Number of levels above the leaves (witness length).
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of real (non-padding) leaves.
    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    /// Number of leaf slots, real and padding.
    pub fn capacity(&self) -> usize {
        1usize << self.depth
    }

    /// Node at `(level, index)`, falling back to the level's zero hash.
    pub fn node(&self, level: usize, index: usize) -> B256 {
        match self.levels.get(level).and_then(|nodes| nodes.get(index)) {
            Some(node) => *node,
            None => self.zero.levels[level.min(MAX_DEPTH)],
        }
    }

    /// Leaf at `index`, the empty leaf for padding slots.
    pub fn leaf(&self, index: usize) -> Result<B256> {
        self.check_index(index)?;
        Ok(self.node(0, index))
    }

    /// Sibling hashes from leaf `index` up to (excluding) the root.
    pub fn witness(&self, index: usize) -> Result<Witness> {
        self.check_index(index)?;
        Ok((0..self.depth)
            .map(|level| self.node(level, (index >> level) ^ 1))
            .collect())
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.capacity() {
            return Err(KernelError::WitnessIndexOutOfRange {
                index,
                capacity: self.capacity(),
            });
        }
        Ok(())
    }
}

/// Recompute a root by hashing `leaf` up the recorded sibling path.
pub fn root_from_witness(leaf: B256, index: usize, witness: &[B256]) -> B256 {
    witness
        .iter()
        .enumerate()
        .fold(leaf, |node, (level, sibling)| {
            if index.checked_shr(level as u32).unwrap_or(0) & 1 == 0 {
                hash_two(&node, sibling)
            } else {
                hash_two(sibling, &node)
            }
        })
}

/// Check that `leaf` sits at `index` under `root`.
pub fn verify_witness(root: B256, leaf: B256, index: usize, witness: &[B256]) -> bool {
    if witness.len() > MAX_DEPTH || index.checked_shr(witness.len() as u32).unwrap_or(0) != 0 {
        return false;
    }
    root_from_witness(leaf, index, witness) == root
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_depth() {
        assert_eq!(required_depth(1), 0);
        assert_eq!(required_depth(2), 1);
        assert_eq!(required_depth(3), 2);
        assert_eq!(required_depth(4), 2);
        assert_eq!(required_depth(5), 3);
    }

    #[test]
    fn test_zero_hash_chain() {
        let z = ZeroHashes::new(zero_leaf());
        assert_eq!(z.get(1), Some(hash_two(&zero_leaf(), &zero_leaf())));
        assert_eq!(z.get(MAX_DEPTH + 1), None);
    }
}
