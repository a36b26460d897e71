// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Revert-reason classification.
//!
//! A handful of contract reverts only mean another actor got there first.
//! They are matched as trimmed suffixes so prefixes such as
//! `execution reverted: ` or `Rollup: ` do not matter.

use std::fmt;

pub const MSG_BATCH_ALREADY_DISPUTED: &str = "Already successfully disputed. Roll back in process";
pub const MSG_TRANSITION_MISSING_BATCH: &str = "Target commitment is absent in the batch";
pub const MSG_SIGNATURE_MISSING_BATCH: &str = "Commitment not present in batch";
pub const MSG_NOT_ROLLING_BACK: &str = "is not rolling back";

/// A revert (or pre-revert condition) that is a resolved race, not a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BenignRevert {
    AlreadyDisputed,
    CommitmentAbsent,
    NotRollingBack,
    /// The invalid-batch marker covers the disputed batch.
    RollbackInProcess,
    /// The on-chain hash for the batch id no longer matches.
    BatchSuperseded,
}

impl BenignRevert {
    /// Reasons that mean a dispute is no longer needed when seen at send time.
    pub fn settles_dispute(&self) -> bool {
        matches!(self, BenignRevert::AlreadyDisputed | BenignRevert::CommitmentAbsent)
    }
}

impl fmt::Display for BenignRevert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BenignRevert::AlreadyDisputed => "batch already disputed",
            BenignRevert::CommitmentAbsent => "target commitment absent from batch",
            BenignRevert::NotRollingBack => "rollback not in progress",
            BenignRevert::RollbackInProcess => "rollback in process",
            BenignRevert::BatchSuperseded => "batch superseded on-chain",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RevertClass {
    Benign(BenignRevert),
    RealFailure(String),
    Unknown,
}

impl RevertClass {
    pub fn is_benign(&self) -> bool {
        matches!(self, RevertClass::Benign(_))
    }
}

const KNOWN: [(&str, BenignRevert); 4] = [
    (MSG_BATCH_ALREADY_DISPUTED, BenignRevert::AlreadyDisputed),
    (MSG_TRANSITION_MISSING_BATCH, BenignRevert::CommitmentAbsent),
    (MSG_SIGNATURE_MISSING_BATCH, BenignRevert::CommitmentAbsent),
    (MSG_NOT_ROLLING_BACK, BenignRevert::NotRollingBack),
];

/// `None` or an empty string means no reason could be recovered.
pub fn classify_revert(reason: Option<&str>) -> RevertClass {
    let reason = match reason.map(str::trim) {
        Some(r) if !r.is_empty() => r,
        _ => return RevertClass::Unknown,
    };
    KNOWN
        .iter()
        .find(|(msg, _)| reason.ends_with(msg))
        .map(|(_, benign)| RevertClass::Benign(*benign))
        .unwrap_or_else(|| RevertClass::RealFailure(reason.to_string()))
}
