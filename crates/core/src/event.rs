//! Ledger history entries.

use serde::{Deserialize, Serialize};

use crate::{CandidateId, Identity, Timestamp};

/// One successful operation, in the order it was applied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    /// Clock time when the operation was applied.
    pub at: Timestamp,
    pub kind: EventKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    CandidateAdded { id: CandidateId, name: String },
    VoterRegistered { identity: Identity },
    VotingStarted { duration: u64 },
    VoteCast { identity: Identity, candidate: CandidateId },
    VotingEnded,
}
