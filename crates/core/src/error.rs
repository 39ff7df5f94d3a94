//! Error types for ezballot-core.

use thiserror::Error;

use crate::Phase;

/// Result alias used by every ledger operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors.
///
/// Every failing operation leaves the ledger exactly as it was.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// Caller is not the administrator.
    #[error("unauthorized: {0} is not the administrator")]
    Unauthorized(String),

    /// Operation is not valid in the current window phase.
    #[error("{operation} is not allowed while voting is {phase}")]
    PhaseViolation {
        operation: &'static str,
        phase: Phase,
    },

    /// Identity is already present in the voter registry.
    #[error("Voter is already registered.")]
    AlreadyRegistered(String),

    /// Identity was never registered.
    #[error("You are not a registered voter.")]
    NotRegistered(String),

    /// Voter has already cast their vote.
    #[error("You have already voted.")]
    AlreadyVoted(String),

    /// The voting window is not open.
    #[error("voting is not active")]
    VotingNotActive,

    /// Unknown candidate or voter.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed parameters.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Snapshot encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Stable snake_case name of the error kind, for callers that branch on
    /// the kind without matching on payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Unauthorized(_) => "unauthorized",
            Error::PhaseViolation { .. } => "phase_violation",
            Error::AlreadyRegistered(_) => "already_registered",
            Error::NotRegistered(_) => "not_registered",
            Error::AlreadyVoted(_) => "already_voted",
            Error::VotingNotActive => "voting_not_active",
            Error::NotFound(_) => "not_found",
            Error::InvalidArgument(_) => "invalid_argument",
            Error::Serialization(_) => "serialization",
        }
    }
}

impl From<ciborium::ser::Error<std::io::Error>> for Error {
    fn from(e: ciborium::ser::Error<std::io::Error>) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<ciborium::de::Error<std::io::Error>> for Error {
    fn from(e: ciborium::de::Error<std::io::Error>) -> Self {
        Error::Serialization(e.to_string())
    }
}
