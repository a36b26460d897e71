// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.

//! settlement-kernel: pure building blocks of an optimistic-rollup coordinator.
//!
//! Merkle witnesses, aggregatable BN254 signatures, the batch/commitment data
//! model, the settlement contract's call and event shapes, and dispute payload
//! construction. No I/O happens in this crate.

pub mod abi;
pub mod bls;
pub mod dispute;
pub mod error;
pub mod events;
pub mod hash;
pub mod merkle;
pub mod types;

pub use error::{KernelError, KernelResult};

#[cfg(test)]
pub mod tests;
