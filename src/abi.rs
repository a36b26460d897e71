// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Settlement Contract ABI
//!
//! Call and event shapes of the rollup and account-registry contracts, plus
//! the conversions between them and the kernel's data model. Nothing here
//! touches the network: encoding failures surface before a request is ever
//! queued for a nonce.

use alloy_primitives::{Bytes, B256, U256};
use alloy_sol_types::{Revert, SolCall, SolError};

use crate::bls::PublicKey;
use crate::dispute::CommitmentInclusionProof;
use crate::error::{KernelError, Result};
use crate::types::batch::ContractBatch;
use crate::types::commitment::{Commitment, CommitmentBody};
use crate::types::enums::BatchType;
use crate::types::id::BatchId;
use crate::types::state::{ReceiverPublicKeyProof, StateMerkleProof, SubtreeVacancyProof};

pub mod contract {
    use alloy_sol_types::sol;

    sol! {
        #[derive(Debug, PartialEq, Eq)]
        struct Commitment {
            bytes32 stateRoot;
            bytes32 bodyRoot;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct CommitmentInclusionProof {
            Commitment commitment;
            uint256 path;
            bytes32[] witness;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct TransferBody {
            bytes32 accountRoot;
            uint256[2] signature;
            uint256 feeReceiver;
            bytes txs;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct TransferCommitment {
            bytes32 stateRoot;
            TransferBody body;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct TransferCommitmentInclusionProof {
            TransferCommitment commitment;
            uint256 path;
            bytes32[] witness;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct MassMigrationBody {
            bytes32 accountRoot;
            uint256[2] signature;
            uint256 spokeID;
            bytes32 withdrawRoot;
            uint256 tokenID;
            uint256 amount;
            uint256 feeReceiver;
            bytes txs;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct MassMigrationCommitment {
            bytes32 stateRoot;
            MassMigrationBody body;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct MMCommitmentInclusionProof {
            MassMigrationCommitment commitment;
            uint256 path;
            bytes32[] witness;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct UserState {
            uint256 pubkeyID;
            uint256 tokenID;
            uint256 balance;
            uint256 nonce;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct StateMerkleProof {
            UserState state;
            bytes32[] witness;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct SubtreeVacancyProof {
            uint256 pathAtDepth;
            bytes32[] witness;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct SignatureProof {
            UserState[] states;
            bytes32[][] stateWitnesses;
            uint256[4][] pubkeys;
            bytes32[][] pubkeyWitnesses;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct SignatureProofWithReceiver {
            UserState[] states;
            bytes32[][] stateWitnesses;
            uint256[4][] pubkeysSender;
            bytes32[][] pubkeyWitnessesSender;
            bytes32[] pubkeyHashesReceiver;
            bytes32[][] pubkeyWitnessesReceiver;
        }

        #[derive(Debug, PartialEq, Eq)]
        struct Batch {
            bytes32 commitmentRoot;
            bytes32 meta;
        }

        interface Rollup {
            function submitTransfer(bytes32[] stateRoots, uint256[2][] signatures, uint256[] feeReceivers, bytes[] txss) external payable;
            function submitCreate2Transfer(bytes32[] stateRoots, uint256[2][] signatures, uint256[] feeReceivers, bytes[] txss) external payable;
            function submitMassMigration(bytes32[] stateRoots, uint256[2][] signatures, uint256[4][] meta, bytes32[] withdrawRoots, bytes[] txss) external payable;
            function submitDeposits(CommitmentInclusionProof previous, SubtreeVacancyProof vacant) external payable;

            function disputeTransitionTransfer(uint256 batchID, CommitmentInclusionProof previous, TransferCommitmentInclusionProof target, StateMerkleProof[] proofs) external;
            function disputeTransitionCreate2Transfer(uint256 batchID, CommitmentInclusionProof previous, TransferCommitmentInclusionProof target, StateMerkleProof[] proofs) external;
            function disputeTransitionMassMigration(uint256 batchID, CommitmentInclusionProof previous, MMCommitmentInclusionProof target, StateMerkleProof[] proofs) external;
            function disputeSignatureTransfer(uint256 batchID, TransferCommitmentInclusionProof target, SignatureProof signatureProof) external;
            function disputeSignatureCreate2Transfer(uint256 batchID, TransferCommitmentInclusionProof target, SignatureProofWithReceiver signatureProof) external;
            function disputeSignatureMassMigration(uint256 batchID, MMCommitmentInclusionProof target, SignatureProof signatureProof) external;

            function keepRollingBack() external;
            function withdrawStake(uint256 batchID) external;

            function getBatch(uint256 batchID) external view returns (Batch batch);
            function invalidBatchMarker() external view returns (uint256);
            function nextBatchID() external view returns (uint256);

            event NewBatch(uint256 batchID, bytes32 accountRoot, uint8 batchType);
            event DepositsFinalised(uint256 subtreeID, bytes32 depositSubTreeRoot, uint256 pathToSubTree);
            event RollbackStatus(uint256 startID, uint256 nDeleted, bool completed);
            event StakeWithdraw(address committed, uint256 batchID);
        }

        interface AccountRegistry {
            function register(uint256[4] pubkey) external returns (uint256);
            function registerBatch(uint256[4][16] pubkeys) external returns (uint256);

            event SinglePubkeyRegistered(uint256 pubkeyID);
            event BatchPubkeyRegistered(uint256 startID, uint256 endID);
        }
    }
}

use contract::{AccountRegistry, Rollup};

/// Calldata for the submit call matching the batch type.
pub fn encode_submit_batch(batch_type: BatchType, commitments: &[Commitment]) -> Result<Bytes> {
    if commitments.is_empty() {
        return Err(KernelError::Encoding("batch has no commitments".into()));
    }
    if let Some(bad) = commitments.iter().find(|c| c.kind() != batch_type) {
        return Err(KernelError::Encoding(format!(
            "{} commitment in {} batch",
            bad.kind(),
            batch_type
        )));
    }

    let state_roots: Vec<B256> = commitments.iter().map(|c| c.state_root).collect();
    let data = match batch_type {
        BatchType::Transfer | BatchType::Create2Transfer => {
            let mut signatures = Vec::with_capacity(commitments.len());
            let mut fee_receivers = Vec::with_capacity(commitments.len());
            let mut txss = Vec::with_capacity(commitments.len());
            for body in commitments.iter().filter_map(|c| c.body.as_transfer()) {
                signatures.push(body.signature.to_words());
                fee_receivers.push(U256::from(body.fee_receiver));
                txss.push(body.txs.clone());
            }
            if batch_type == BatchType::Transfer {
                Rollup::submitTransferCall {
                    stateRoots: state_roots,
                    signatures,
                    feeReceivers: fee_receivers,
                    txss,
                }
                .abi_encode()
            } else {
                Rollup::submitCreate2TransferCall {
                    stateRoots: state_roots,
                    signatures,
                    feeReceivers: fee_receivers,
                    txss,
                }
                .abi_encode()
            }
        }
        BatchType::MassMigration => {
            let mut signatures = Vec::with_capacity(commitments.len());
            let mut meta = Vec::with_capacity(commitments.len());
            let mut withdraw_roots = Vec::with_capacity(commitments.len());
            let mut txss = Vec::with_capacity(commitments.len());
            for body in commitments.iter().filter_map(|c| c.body.as_mass_migration()) {
                signatures.push(body.signature.to_words());
                meta.push([
                    U256::from(body.spoke_id),
                    body.token_id,
                    body.amount,
                    U256::from(body.fee_receiver),
                ]);
                withdraw_roots.push(body.withdraw_root);
                txss.push(body.txs.clone());
            }
            Rollup::submitMassMigrationCall {
                stateRoots: state_roots,
                signatures,
                meta,
                withdrawRoots: withdraw_roots,
                txss,
            }
            .abi_encode()
        }
        BatchType::Deposit => {
            return Err(KernelError::Encoding(
                "deposit batches carry a vacancy proof, see encode_submit_deposits".into(),
            ))
        }
        BatchType::Genesis => {
            return Err(KernelError::Encoding("genesis batch is created at deployment".into()))
        }
    };
    Ok(data.into())
}

/// Calldata for `submitDeposits`: the last commitment of the previous batch
/// and the vacant state subtree the pending deposits are inserted into.
pub fn encode_submit_deposits(previous: &CommitmentInclusionProof, vacant: &SubtreeVacancyProof) -> Bytes {
    Rollup::submitDepositsCall {
        previous: previous.to_calldata(),
        vacant: contract::SubtreeVacancyProof {
            pathAtDepth: U256::from(vacant.path_at_depth),
            witness: vacant.witness.clone(),
        },
    }
    .abi_encode()
    .into()
}

pub fn encode_keep_rolling_back() -> Bytes {
    Rollup::keepRollingBackCall {}.abi_encode().into()
}

pub fn encode_withdraw_stake(batch_id: BatchId) -> Bytes {
    Rollup::withdrawStakeCall {
        batchID: U256::from(batch_id.0),
    }
    .abi_encode()
    .into()
}

pub fn encode_register_pubkey(public_key: &PublicKey) -> Bytes {
    AccountRegistry::registerCall {
        pubkey: public_key.to_words(),
    }
    .abi_encode()
    .into()
}

/// Number of keys `registerBatch` takes in one call.
pub const ACCOUNT_BATCH_SIZE: usize = 16;

pub fn encode_register_batch(public_keys: &[PublicKey]) -> Result<Bytes> {
    let words: Vec<[U256; 4]> = public_keys.iter().map(PublicKey::to_words).collect();
    let pubkeys: [[U256; 4]; ACCOUNT_BATCH_SIZE] = words.try_into().map_err(|words: Vec<_>| {
        KernelError::Encoding(format!(
            "registerBatch takes {} public keys, got {}",
            ACCOUNT_BATCH_SIZE,
            words.len()
        ))
    })?;
    Ok(AccountRegistry::registerBatchCall { pubkeys }.abi_encode().into())
}

pub fn encode_get_batch(batch_id: BatchId) -> Bytes {
    Rollup::getBatchCall {
        batchID: U256::from(batch_id.0),
    }
    .abi_encode()
    .into()
}

pub fn decode_get_batch(batch_id: BatchId, data: &[u8]) -> Result<ContractBatch> {
    let batch = Rollup::getBatchCall::abi_decode_returns(data, true)
        .map_err(|e| KernelError::Decoding(format!("getBatch: {}", e)))?
        .batch;
    ContractBatch::from_meta(batch_id, batch.commitmentRoot, batch.meta)
}

pub fn encode_invalid_batch_marker() -> Bytes {
    Rollup::invalidBatchMarkerCall {}.abi_encode().into()
}

/// `None` while the contract is healthy (marker is zero).
pub fn decode_invalid_batch_marker(data: &[u8]) -> Result<Option<BatchId>> {
    let marker = Rollup::invalidBatchMarkerCall::abi_decode_returns(data, true)
        .map_err(|e| KernelError::Decoding(format!("invalidBatchMarker: {}", e)))?
        ._0;
    if marker.is_zero() {
        return Ok(None);
    }
    word_to_u64(marker).map(|id| Some(BatchId(id)))
}

pub fn encode_next_batch_id() -> Bytes {
    Rollup::nextBatchIDCall {}.abi_encode().into()
}

pub fn decode_next_batch_id(data: &[u8]) -> Result<BatchId> {
    let next = Rollup::nextBatchIDCall::abi_decode_returns(data, true)
        .map_err(|e| KernelError::Decoding(format!("nextBatchID: {}", e)))?
        ._0;
    word_to_u64(next).map(BatchId)
}

/// Human-readable reason from revert return data, if it carries one.
///
/// Empty data means no reason was recoverable.
pub fn decode_revert_reason(data: &[u8]) -> Option<String> {
    if let Ok(revert) = Revert::abi_decode(data, true) {
        return Some(revert.reason);
    }
    alloy_sol_types::decode_revert_reason(data).filter(|reason| !reason.trim().is_empty())
}

pub(crate) fn word_to_u64(word: U256) -> Result<u64> {
    u64::try_from(word).map_err(|_| KernelError::Decoding(format!("{} does not fit in u64", word)))
}

pub(crate) fn commitment_to_calldata(state_root: B256, body_root: B256) -> contract::Commitment {
    contract::Commitment {
        stateRoot: state_root,
        bodyRoot: body_root,
    }
}

pub(crate) fn transfer_commitment_to_calldata(commitment: &Commitment) -> Option<contract::TransferCommitment> {
    let body = commitment.body.as_transfer()?;
    Some(contract::TransferCommitment {
        stateRoot: commitment.state_root,
        body: contract::TransferBody {
            accountRoot: body.account_root,
            signature: body.signature.to_words(),
            feeReceiver: U256::from(body.fee_receiver),
            txs: body.txs.clone(),
        },
    })
}

pub(crate) fn mass_migration_commitment_to_calldata(
    commitment: &Commitment,
) -> Option<contract::MassMigrationCommitment> {
    let body = match &commitment.body {
        CommitmentBody::MassMigration(body) => body,
        _ => return None,
    };
    Some(contract::MassMigrationCommitment {
        stateRoot: commitment.state_root,
        body: contract::MassMigrationBody {
            accountRoot: body.account_root,
            signature: body.signature.to_words(),
            spokeID: U256::from(body.spoke_id),
            withdrawRoot: body.withdraw_root,
            tokenID: body.token_id,
            amount: body.amount,
            feeReceiver: U256::from(body.fee_receiver),
            txs: body.txs.clone(),
        },
    })
}

pub(crate) fn user_state_to_calldata(proof: &StateMerkleProof) -> contract::UserState {
    contract::UserState {
        pubkeyID: U256::from(proof.state.pubkey_id.0),
        tokenID: proof.state.token_id,
        balance: proof.state.balance,
        nonce: proof.state.nonce,
    }
}

pub(crate) fn state_proof_to_calldata(proof: &StateMerkleProof) -> contract::StateMerkleProof {
    contract::StateMerkleProof {
        state: user_state_to_calldata(proof),
        witness: proof.witness.clone(),
    }
}

pub(crate) fn receiver_hashes_to_calldata(proofs: &[ReceiverPublicKeyProof]) -> (Vec<B256>, Vec<Vec<B256>>) {
    proofs
        .iter()
        .map(|p| (p.pubkey_hash, p.witness.clone()))
        .unzip()
}
