//! Election scripts: a TOML list of ledger operations replayed in order.
//!
//! ```toml
//! admin = "0xadmin"
//!
//! [[step]]
//! op = "register_voter"
//! identity = "123456789012"
//!
//! [[step]]
//! op = "vote"
//! identity = "123456789012"
//! candidate = 1
//! expect_error = "voting_not_active"
//! ```

use std::path::Path;

use anyhow::{Context, Result, bail};
use ezballot_core::{Candidate, CandidateId, ElectionLedger, ManualClock, NewCandidate};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::LedgerConfig;

/// A parsed election script.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Script {
    /// Overrides the configured administrator.
    #[serde(default)]
    pub admin: Option<String>,

    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Step {
    #[serde(flatten)]
    pub op: StepOp,

    /// Error kind this step must fail with, e.g. `already_voted`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect_error: Option<String>,
}

/// One ledger operation. Admin operations run as the script's admin unless
/// `caller` is given.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StepOp {
    AddCandidate {
        #[serde(default)]
        caller: Option<String>,
        name: String,
        gender: String,
        age: u32,
        party: String,
        election_type: String,
    },
    RegisterVoter {
        identity: String,
    },
    StartVoting {
        #[serde(default)]
        caller: Option<String>,
        #[serde(default)]
        duration_secs: Option<u64>,
    },
    Vote {
        identity: String,
        candidate: CandidateId,
    },
    EndVoting {
        #[serde(default)]
        caller: Option<String>,
    },
    AdvanceClock {
        secs: u64,
    },
}

impl StepOp {
    pub fn name(&self) -> &'static str {
        match self {
            StepOp::AddCandidate { .. } => "add_candidate",
            StepOp::RegisterVoter { .. } => "register_voter",
            StepOp::StartVoting { .. } => "start_voting",
            StepOp::Vote { .. } => "vote",
            StepOp::EndVoting { .. } => "end_voting",
            StepOp::AdvanceClock { .. } => "advance_clock",
        }
    }
}

/// Example script: the two-candidate, two-voter election.
pub const TEMPLATE: &str = r#"# ezballot election script
admin = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"

[[step]]
op = "add_candidate"
name = "Candidate 1"
gender = "Male"
age = 40
party = "Party A"
election_type = "General"

[[step]]
op = "add_candidate"
name = "Candidate 2"
gender = "Female"
age = 35
party = "Party B"
election_type = "General"

[[step]]
op = "register_voter"
identity = "123456789012"

[[step]]
op = "register_voter"
identity = "987654321098"

[[step]]
op = "register_voter"
identity = "123456789012"
expect_error = "already_registered"

[[step]]
op = "vote"
identity = "123456789012"
candidate = 1
expect_error = "voting_not_active"

[[step]]
op = "start_voting"
duration_secs = 3600

[[step]]
op = "vote"
identity = "123456789012"
candidate = 1

[[step]]
op = "vote"
identity = "987654321098"
candidate = 2

[[step]]
op = "vote"
identity = "123456789012"
candidate = 1
expect_error = "already_voted"

[[step]]
op = "advance_clock"
secs = 3601
"#;

impl Script {
    pub fn parse(source: &str) -> Result<Self> {
        toml::from_str(source).context("invalid election script")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))?;
        Self::parse(&source)
    }
}

/// Final state of a replayed election.
#[derive(Clone, Debug, Serialize)]
pub struct Outcome {
    pub election: String,
    pub admin: String,
    pub phase: String,
    pub steps: usize,
    pub voters: usize,
    pub votes_cast: u64,
    pub candidates: Vec<Candidate>,
    pub leaders: Vec<CandidateId>,
}

impl Outcome {
    pub fn of(ledger: &ElectionLedger, steps: usize) -> Self {
        Self {
            election: ledger.id().to_string(),
            admin: ledger.admin().to_string(),
            phase: ledger.phase().to_string(),
            steps,
            voters: ledger.voter_count(),
            votes_cast: ledger.votes_cast(),
            candidates: ledger.all_candidates().to_vec(),
            leaders: ledger.leaders().iter().map(|c| c.id).collect(),
        }
    }
}

/// Replays steps against a ledger driven by a manual clock.
pub struct Replay {
    ledger: ElectionLedger,
    clock: ManualClock,
    admin: String,
    default_duration: u64,
}

impl Replay {
    pub fn new(config: &LedgerConfig, script: &Script) -> Self {
        let admin = script
            .admin
            .clone()
            .unwrap_or_else(|| config.admin.clone());
        let clock = ManualClock::new(config.start_time);
        let ledger = ElectionLedger::with_clock(admin.clone(), Box::new(clock.clone()));

        Self {
            ledger,
            clock,
            admin,
            default_duration: config.default_duration_secs,
        }
    }

    pub fn ledger(&self) -> &ElectionLedger {
        &self.ledger
    }

    /// Apply one operation to the ledger.
    pub fn apply(&mut self, op: &StepOp) -> ezballot_core::Result<()> {
        match op {
            StepOp::AddCandidate {
                caller,
                name,
                gender,
                age,
                party,
                election_type,
            } => {
                let caller = caller.as_deref().unwrap_or(&self.admin);
                let candidate = NewCandidate::new(
                    name.as_str(),
                    gender.as_str(),
                    *age,
                    party.as_str(),
                    election_type.as_str(),
                );
                self.ledger.add_candidate(caller, candidate).map(|_| ())
            }
            StepOp::RegisterVoter { identity } => self.ledger.register_voter(identity),
            StepOp::StartVoting {
                caller,
                duration_secs,
            } => {
                let caller = caller.as_deref().unwrap_or(&self.admin);
                let duration = duration_secs.unwrap_or(self.default_duration);
                self.ledger.start_voting(caller, duration)
            }
            StepOp::Vote {
                identity,
                candidate,
            } => self.ledger.vote(identity, *candidate),
            StepOp::EndVoting { caller } => {
                let caller = caller.as_deref().unwrap_or(&self.admin);
                self.ledger.end_voting(caller)
            }
            StepOp::AdvanceClock { secs } => {
                self.clock.advance(*secs);
                Ok(())
            }
        }
    }

    /// Run every step, checking each against its expected outcome.
    pub fn run(mut self, steps: &[Step]) -> Result<ElectionLedger> {
        for (index, step) in steps.iter().enumerate() {
            let number = index + 1;
            let op = step.op.name();

            match (self.apply(&step.op), step.expect_error.as_deref()) {
                (Ok(()), None) => info!(step = number, op, "ok"),
                (Err(err), Some(expected)) if err.kind() == expected => {
                    info!(step = number, op, error = %err, "rejected as expected")
                }
                (Ok(()), Some(expected)) => {
                    bail!("step {number} ({op}) succeeded but was expected to fail with {expected}")
                }
                (Err(err), _) => {
                    return Err(err).with_context(|| format!("step {number} ({op}) failed"));
                }
            }
        }

        Ok(self.ledger)
    }
}
