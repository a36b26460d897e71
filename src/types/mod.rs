// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Data model shared by the kernel and the node.

pub mod batch;
pub mod commitment;
pub mod enums;
pub mod id;
pub mod state;

pub use batch::{Batch, ContractBatch};
pub use commitment::{Commitment, CommitmentBody, DepositBody, MassMigrationBody, TransferBody};
pub use enums::BatchType;
pub use id::{BatchId, PubkeyId, StateId};
pub use state::{PublicKeyProof, ReceiverPublicKeyProof, StateMerkleProof, SubtreeVacancyProof, UserState};
