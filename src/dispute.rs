// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Dispute Payloads
//!
//! A dispute names one commitment of a batch through its inclusion proof
//! and pairs it with the evidence the contract re-checks:
//!
//! | commitment kind   | transition | signature                     |
//! |-------------------|------------|-------------------------------|
//! | transfer          | yes        | `SignatureProof`              |
//! | create2transfer   | yes        | `SignatureProofWithReceiver`  |
//! | mass-migration    | yes        | `SignatureProof`              |
//! | deposit / genesis | no         | no                            |
//!
//! Any other pairing fails at encode time with `UnsupportedDispute`.

use alloy_primitives::{Bytes, B256, U256};
use alloy_sol_types::SolCall;

use crate::abi::{self, contract, contract::Rollup};
use crate::error::{KernelError, Result};
use crate::hash::hash_two;
use crate::merkle::{root_from_witness, verify_witness, Witness};
use crate::types::batch::Batch;
use crate::types::commitment::{Commitment, CommitmentBody};
use crate::types::id::BatchId;
use crate::types::state::{PublicKeyProof, ReceiverPublicKeyProof, StateMerkleProof};

/// Inclusion proof of a commitment given only by its two roots.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitmentInclusionProof {
    pub state_root: B256,
    pub body_root: B256,
    pub path: u32,
    pub witness: Witness,
}

impl CommitmentInclusionProof {
    /// Proof for the commitment at `index` of `batch`.
    pub fn for_commitment(batch: &Batch, index: usize) -> Result<Self> {
        let (commitment, witness) = batch.inclusion_proof(index)?;
        Ok(Self {
            state_root: commitment.state_root,
            body_root: commitment.body_root(),
            path: path_index(index)?,
            witness,
        })
    }

    pub fn leaf_hash(&self) -> B256 {
        hash_two(&self.state_root, &self.body_root)
    }

    /// Commitment root this proof resolves to.
    pub fn root(&self) -> B256 {
        root_from_witness(self.leaf_hash(), self.path as usize, &self.witness)
    }

    pub(crate) fn to_calldata(&self) -> contract::CommitmentInclusionProof {
        contract::CommitmentInclusionProof {
            commitment: abi::commitment_to_calldata(self.state_root, self.body_root),
            path: U256::from(self.path),
            witness: self.witness.clone(),
        }
    }
}

/// Inclusion proof of the commitment under challenge, carrying its full body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetInclusionProof {
    pub commitment: Commitment,
    pub path: u32,
    pub witness: Witness,
}

impl TargetInclusionProof {
    pub fn for_commitment(batch: &Batch, index: usize) -> Result<Self> {
        let (commitment, witness) = batch.inclusion_proof(index)?;
        Ok(Self {
            commitment: commitment.clone(),
            path: path_index(index)?,
            witness,
        })
    }

    pub fn verify(&self, commitment_root: B256) -> bool {
        verify_witness(
            commitment_root,
            self.commitment.leaf_hash(),
            self.path as usize,
            &self.witness,
        )
    }

    fn transfer_calldata(&self) -> Option<contract::TransferCommitmentInclusionProof> {
        Some(contract::TransferCommitmentInclusionProof {
            commitment: abi::transfer_commitment_to_calldata(&self.commitment)?,
            path: U256::from(self.path),
            witness: self.witness.clone(),
        })
    }

    fn mass_migration_calldata(&self) -> Option<contract::MMCommitmentInclusionProof> {
        Some(contract::MMCommitmentInclusionProof {
            commitment: abi::mass_migration_commitment_to_calldata(&self.commitment)?,
            path: U256::from(self.path),
            witness: self.witness.clone(),
        })
    }
}

/// Evidence for re-executing the target commitment from its pre-state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransitionProof {
    /// Commitment whose post-state is the target's pre-state.
    pub previous: CommitmentInclusionProof,
    pub state_proofs: Vec<StateMerkleProof>,
}

/// Evidence for re-verifying the target's aggregated signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureProof {
    pub states: Vec<StateMerkleProof>,
    pub public_keys: Vec<PublicKeyProof>,
}

impl SignatureProof {
    pub fn new(states: Vec<StateMerkleProof>, public_keys: Vec<PublicKeyProof>) -> Result<Self> {
        if states.len() != public_keys.len() {
            return Err(KernelError::Encoding(format!(
                "signature proof has {} states but {} public keys",
                states.len(),
                public_keys.len()
            )));
        }
        Ok(Self { states, public_keys })
    }

    fn to_calldata(&self) -> contract::SignatureProof {
        let (states, state_witnesses) = split_states(&self.states);
        let (pubkeys, pubkey_witnesses) = split_keys(&self.public_keys);
        contract::SignatureProof {
            states,
            stateWitnesses: state_witnesses,
            pubkeys,
            pubkeyWitnesses: pubkey_witnesses,
        }
    }
}

/// Signature evidence for create-and-transfer, where receivers are named by key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureProofWithReceiver {
    pub states: Vec<StateMerkleProof>,
    pub sender_public_keys: Vec<PublicKeyProof>,
    pub receiver_public_keys: Vec<ReceiverPublicKeyProof>,
}

impl SignatureProofWithReceiver {
    pub fn new(
        states: Vec<StateMerkleProof>,
        sender_public_keys: Vec<PublicKeyProof>,
        receiver_public_keys: Vec<ReceiverPublicKeyProof>,
    ) -> Result<Self> {
        if states.len() != sender_public_keys.len() || states.len() != receiver_public_keys.len() {
            return Err(KernelError::Encoding(format!(
                "signature proof has {} states, {} senders and {} receivers",
                states.len(),
                sender_public_keys.len(),
                receiver_public_keys.len()
            )));
        }
        Ok(Self {
            states,
            sender_public_keys,
            receiver_public_keys,
        })
    }

    fn to_calldata(&self) -> contract::SignatureProofWithReceiver {
        let (states, state_witnesses) = split_states(&self.states);
        let (pubkeys, pubkey_witnesses) = split_keys(&self.sender_public_keys);
        let (receiver_hashes, receiver_witnesses) = abi::receiver_hashes_to_calldata(&self.receiver_public_keys);
        contract::SignatureProofWithReceiver {
            states,
            stateWitnesses: state_witnesses,
            pubkeysSender: pubkeys,
            pubkeyWitnessesSender: pubkey_witnesses,
            pubkeyHashesReceiver: receiver_hashes,
            pubkeyWitnessesReceiver: receiver_witnesses,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DisputeProof {
    Transition(TransitionProof),
    Signature(SignatureProof),
    SignatureWithReceiver(SignatureProofWithReceiver),
}

impl DisputeProof {
    pub fn name(&self) -> &'static str {
        match self {
            DisputeProof::Transition(_) => "transition",
            DisputeProof::Signature(_) => "signature",
            DisputeProof::SignatureWithReceiver(_) => "signature-with-receiver",
        }
    }

    pub fn is_transition(&self) -> bool {
        matches!(self, DisputeProof::Transition(_))
    }
}

/// A fully built challenge against one commitment of one batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisputeTarget {
    pub batch_id: BatchId,
    pub target: TargetInclusionProof,
    pub proof: DisputeProof,
}

impl DisputeTarget {
    /// Transition dispute against commitment `index` of `batch`.
    ///
    /// The previous commitment is `index - 1` of the same batch, or the last
    /// commitment of `previous_batch` when the target opens its batch.
    pub fn transition(
        batch: &Batch,
        index: usize,
        previous_batch: Option<&Batch>,
        state_proofs: Vec<StateMerkleProof>,
    ) -> Result<Self> {
        let target = TargetInclusionProof::for_commitment(batch, index)?;
        let previous = match index.checked_sub(1) {
            Some(prev) => CommitmentInclusionProof::for_commitment(batch, prev)?,
            None => {
                let prev_batch = previous_batch.ok_or_else(|| {
                    KernelError::Encoding(format!("batch {} has no previous batch to chain from", batch.id))
                })?;
                let last = prev_batch.last_commitment_index().ok_or_else(|| {
                    KernelError::Encoding(format!("previous batch {} has no commitments", prev_batch.id))
                })?;
                CommitmentInclusionProof::for_commitment(prev_batch, last)?
            }
        };
        Ok(Self {
            batch_id: batch.id,
            target,
            proof: DisputeProof::Transition(TransitionProof { previous, state_proofs }),
        })
    }

    pub fn signature(batch: &Batch, index: usize, proof: SignatureProof) -> Result<Self> {
        Ok(Self {
            batch_id: batch.id,
            target: TargetInclusionProof::for_commitment(batch, index)?,
            proof: DisputeProof::Signature(proof),
        })
    }

    pub fn signature_with_receiver(batch: &Batch, index: usize, proof: SignatureProofWithReceiver) -> Result<Self> {
        Ok(Self {
            batch_id: batch.id,
            target: TargetInclusionProof::for_commitment(batch, index)?,
            proof: DisputeProof::SignatureWithReceiver(proof),
        })
    }

    /// Contract method this dispute is submitted through.
    pub fn method(&self) -> Result<&'static str> {
        self.dispatch().map(|(name, _)| name)
    }

    /// Calldata for the dispute call.
    pub fn encode(&self) -> Result<Bytes> {
        self.dispatch().map(|(_, data)| data.into())
    }

    fn dispatch(&self) -> Result<(&'static str, Vec<u8>)> {
        let batch_id = U256::from(self.batch_id.0);
        let unsupported = || KernelError::UnsupportedDispute {
            kind: self.target.commitment.kind().name(),
            proof: self.proof.name(),
        };

        match (&self.target.commitment.body, &self.proof) {
            (CommitmentBody::Transfer(_), DisputeProof::Transition(proof)) => Ok((
                Rollup::disputeTransitionTransferCall::SIGNATURE,
                Rollup::disputeTransitionTransferCall {
                    batchID: batch_id,
                    previous: proof.previous.to_calldata(),
                    target: self.target.transfer_calldata().ok_or_else(unsupported)?,
                    proofs: proof.state_proofs.iter().map(abi::state_proof_to_calldata).collect(),
                }
                .abi_encode(),
            )),
            (CommitmentBody::Create2Transfer(_), DisputeProof::Transition(proof)) => Ok((
                Rollup::disputeTransitionCreate2TransferCall::SIGNATURE,
                Rollup::disputeTransitionCreate2TransferCall {
                    batchID: batch_id,
                    previous: proof.previous.to_calldata(),
                    target: self.target.transfer_calldata().ok_or_else(unsupported)?,
                    proofs: proof.state_proofs.iter().map(abi::state_proof_to_calldata).collect(),
                }
                .abi_encode(),
            )),
            (CommitmentBody::MassMigration(_), DisputeProof::Transition(proof)) => Ok((
                Rollup::disputeTransitionMassMigrationCall::SIGNATURE,
                Rollup::disputeTransitionMassMigrationCall {
                    batchID: batch_id,
                    previous: proof.previous.to_calldata(),
                    target: self.target.mass_migration_calldata().ok_or_else(unsupported)?,
                    proofs: proof.state_proofs.iter().map(abi::state_proof_to_calldata).collect(),
                }
                .abi_encode(),
            )),
            (CommitmentBody::Transfer(_), DisputeProof::Signature(proof)) => Ok((
                Rollup::disputeSignatureTransferCall::SIGNATURE,
                Rollup::disputeSignatureTransferCall {
                    batchID: batch_id,
                    target: self.target.transfer_calldata().ok_or_else(unsupported)?,
                    signatureProof: proof.to_calldata(),
                }
                .abi_encode(),
            )),
            (CommitmentBody::MassMigration(_), DisputeProof::Signature(proof)) => Ok((
                Rollup::disputeSignatureMassMigrationCall::SIGNATURE,
                Rollup::disputeSignatureMassMigrationCall {
                    batchID: batch_id,
                    target: self.target.mass_migration_calldata().ok_or_else(unsupported)?,
                    signatureProof: proof.to_calldata(),
                }
                .abi_encode(),
            )),
            (CommitmentBody::Create2Transfer(_), DisputeProof::SignatureWithReceiver(proof)) => Ok((
                Rollup::disputeSignatureCreate2TransferCall::SIGNATURE,
                Rollup::disputeSignatureCreate2TransferCall {
                    batchID: batch_id,
                    target: self.target.transfer_calldata().ok_or_else(unsupported)?,
                    signatureProof: proof.to_calldata(),
                }
                .abi_encode(),
            )),
            (CommitmentBody::Transfer(_), DisputeProof::SignatureWithReceiver(_))
            | (CommitmentBody::MassMigration(_), DisputeProof::SignatureWithReceiver(_))
            | (CommitmentBody::Create2Transfer(_), DisputeProof::Signature(_))
            | (CommitmentBody::Deposit(_), _)
            | (CommitmentBody::Genesis, _) => Err(unsupported()),
        }
    }
}

fn path_index(index: usize) -> Result<u32> {
    u32::try_from(index).map_err(|_| KernelError::Encoding(format!("commitment index {} overflows path", index)))
}

fn split_states(states: &[StateMerkleProof]) -> (Vec<contract::UserState>, Vec<Vec<B256>>) {
    states
        .iter()
        .map(|p| (abi::user_state_to_calldata(p), p.witness.clone()))
        .unzip()
}

fn split_keys(keys: &[PublicKeyProof]) -> (Vec<[U256; 4]>, Vec<Vec<B256>>) {
    keys.iter()
        .map(|p| (p.public_key.to_words(), p.witness.clone()))
        .unzip()
}
