// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Canonical Keccak-256 Hashing
//!
//! Every hash the settlement contract recomputes on-chain (commitment
//! leaves, body roots, Merkle nodes, event signatures) must be Keccak-256,
//! so this is the only digest used by the kernel.

use alloy_primitives::{keccak256, B256};

/// Hash of two 32-byte words, `keccak256(left ++ right)`.
///
/// This is the interior node function of every Merkle tree.
pub fn hash_two(left: &B256, right: &B256) -> B256 {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(left.as_slice());
    buf[32..].copy_from_slice(right.as_slice());
    keccak256(buf)
}

/// Hash of an arbitrary byte slice.
pub fn hash_bytes(data: &[u8]) -> B256 {
    keccak256(data)
}

/// The default empty leaf: `keccak256(abi.encode(0))`.
pub fn zero_leaf() -> B256 {
    keccak256([0u8; 32])
}
