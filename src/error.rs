// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Error types.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
    /// A Merkle tree needs at least one leaf.
    #[error("cannot build a merkle tree without leaves")]
    EmptyLeaves,
    /// Leaf count needs a tree deeper than `MAX_DEPTH`.
    #[error("merkle tree too large: depth {depth} exceeds {max}")]
    TreeTooDeep { depth: usize, max: usize },
    /// Witness requested for a position outside the padded tree.
    #[error("witness index {index} out of range for tree of {capacity} leaves")]
    WitnessIndexOutOfRange { index: usize, capacity: usize },
    /// Aggregation over zero signatures or zero public keys.
    #[error("empty signature set")]
    EmptySignatureSet,
    /// Secret key bytes do not describe a usable scalar.
    #[error("invalid secret key")]
    InvalidSecretKey,
    /// A curve point failed to decode.
    #[error("invalid curve point")]
    InvalidPoint,
    /// On-chain batch meta word with an unknown type tag.
    #[error("invalid batch meta: unknown batch type {0}")]
    InvalidBatchType(u8),
    /// Call arguments that cannot be encoded for the settlement contract.
    #[error("encoding error: {0}")]
    Encoding(String),
    /// The (commitment kind, proof kind) pair has no dispute method.
    #[error("unsupported dispute: {proof} proof against {kind} commitment")]
    UnsupportedDispute { kind: &'static str, proof: &'static str },
    /// Return data or log payload that does not match the expected ABI.
    #[error("decoding error: {0}")]
    Decoding(String),
}

pub type KernelResult<T> = core::result::Result<T, KernelError>;
pub type Result<T> = KernelResult<T>;
