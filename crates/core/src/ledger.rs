//! The election ledger: one aggregate owning all election state.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    AccessControl, Candidate, CandidateId, CandidateRegistry, Clock, Error, EventKind,
    LedgerEvent, NewCandidate, Phase, Result, SystemClock, Timestamp, Voter, VoterRegistry,
    VotingWindow,
};

/// One line of the results table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyEntry {
    pub id: CandidateId,
    pub name: String,
    pub votes: u64,
}

/// The ledger for a single election run.
///
/// Every operation validates all of its preconditions before touching
/// state, so a failed call never leaves a partial mutation behind.
pub struct ElectionLedger {
    /// Random id of this election run.
    id: Uuid,

    access: AccessControl,

    candidates: CandidateRegistry,

    voters: VoterRegistry,

    window: VotingWindow,

    /// Successful operations, in order of application.
    history: Vec<LedgerEvent>,

    /// Time source for the voting window.
    clock: Box<dyn Clock>,
}

impl ElectionLedger {
    /// Create a ledger administered by `admin`, using wall-clock time.
    pub fn new(admin: impl Into<String>) -> Self {
        Self::with_clock(admin, Box::new(SystemClock))
    }

    /// Create a ledger with an explicit time source.
    pub fn with_clock(admin: impl Into<String>, clock: Box<dyn Clock>) -> Self {
        let ledger = Self {
            id: Uuid::new_v4(),
            access: AccessControl::new(admin),
            candidates: CandidateRegistry::new(),
            voters: VoterRegistry::new(),
            window: VotingWindow::default(),
            history: Vec::new(),
            clock,
        };
        info!(election = %ledger.id, admin = ledger.admin(), "election ledger created");
        ledger
    }

    /// Random identifier assigned at construction.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The administrator fixed at construction.
    pub fn admin(&self) -> &str {
        self.access.admin()
    }

    /// Whether `caller` is the administrator.
    pub fn is_admin(&self, caller: &str) -> bool {
        self.access.is_admin(caller)
    }

    /// Current time from the ledger's clock.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    // =========================================================================
    // Setup
    // =========================================================================

    /// Register a candidate. Admin only, and only before voting opens.
    pub fn add_candidate(&mut self, caller: &str, candidate: NewCandidate) -> Result<CandidateId> {
        self.access.require_admin(caller)?;

        let now = self.now();
        let phase = self.window.phase_at(now);
        if phase != Phase::Unopened {
            return Err(Error::PhaseViolation {
                operation: "add_candidate",
                phase,
            });
        }

        let name = candidate.name.clone();
        let id = self.candidates.register(candidate)?;

        info!(id, name = %name, "candidate added");
        self.record(now, EventKind::CandidateAdded { id, name });
        Ok(id)
    }

    /// Self-service voter registration, allowed until the window closes.
    ///
    /// A registered identity is always rejected as already registered, in
    /// every phase.
    pub fn register_voter(&mut self, identity: &str) -> Result<()> {
        let now = self.now();
        self.voters.check_new(identity)?;
        self.ensure_registration_open(now)?;
        self.voters.register(identity)?;

        debug!(identity, "voter registered");
        self.record(
            now,
            EventKind::VoterRegistered {
                identity: identity.to_string(),
            },
        );
        Ok(())
    }

    /// Register a batch of identities. Either all are registered or none.
    ///
    /// A duplicate inside the batch fails the same way as a duplicate of an
    /// already registered identity.
    pub fn register_voters<I, S>(&mut self, identities: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let now = self.now();

        let batch: Vec<String> = identities
            .into_iter()
            .map(|identity| identity.as_ref().to_string())
            .collect();

        let mut seen = BTreeSet::new();
        for identity in &batch {
            self.voters.check_new(identity)?;
            if !seen.insert(identity.as_str()) {
                return Err(Error::AlreadyRegistered(identity.clone()));
            }
        }
        self.ensure_registration_open(now)?;

        for identity in &batch {
            self.voters.register(identity)?;
            self.record(
                now,
                EventKind::VoterRegistered {
                    identity: identity.clone(),
                },
            );
        }

        info!(count = batch.len(), "voters registered");
        Ok(batch.len())
    }

    fn ensure_registration_open(&self, now: Timestamp) -> Result<()> {
        match self.window.phase_at(now) {
            Phase::Closed => Err(Error::PhaseViolation {
                operation: "register_voter",
                phase: Phase::Closed,
            }),
            Phase::Unopened | Phase::Open => Ok(()),
        }
    }

    // =========================================================================
    // Window control
    // =========================================================================

    /// Open the voting window for `duration_secs` starting now.
    pub fn start_voting(&mut self, caller: &str, duration_secs: u64) -> Result<()> {
        self.access.require_admin(caller)?;

        let now = self.now();
        self.window.open(now, duration_secs)?;

        info!(start = now, duration = duration_secs, "voting started");
        self.record(
            now,
            EventKind::VotingStarted {
                duration: duration_secs,
            },
        );
        Ok(())
    }

    /// Close the window now. A no-op if it is already closed.
    pub fn end_voting(&mut self, caller: &str) -> Result<()> {
        self.access.require_admin(caller)?;

        let now = self.now();
        if self.window.close(now)? {
            info!(at = now, "voting ended");
            self.record(now, EventKind::VotingEnded);
        }
        Ok(())
    }

    // =========================================================================
    // Voting
    // =========================================================================

    /// Cast `identity`'s vote for `candidate_id`.
    ///
    /// Checks run in a fixed order and the first failure is reported:
    /// unknown identity, window not open, already voted, unknown candidate.
    /// An unknown identity is reported in every phase.
    pub fn vote(&mut self, identity: &str, candidate_id: CandidateId) -> Result<()> {
        let now = self.now();

        let has_voted = self
            .voters
            .get(identity)
            .map(|voter| voter.has_voted)
            .ok_or_else(|| Error::NotRegistered(identity.to_string()))?;

        self.window.ensure_open(now)?;

        if has_voted {
            return Err(Error::AlreadyVoted(identity.to_string()));
        }

        let candidate = self
            .candidates
            .get_mut(candidate_id)
            .ok_or_else(|| Error::NotFound(format!("candidate {candidate_id}")))?;

        // Nothing below can fail: the voter flag and the tally move together.
        candidate.votes += 1;
        self.voters.mark_voted(identity);

        debug!(identity, candidate = candidate_id, "vote recorded");
        self.record(
            now,
            EventKind::VoteCast {
                identity: identity.to_string(),
                candidate: candidate_id,
            },
        );
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Effective phase at the current clock time.
    pub fn phase(&self) -> Phase {
        self.window.phase_at(self.now())
    }

    /// Get the voting window as recorded, without applying expiry.
    pub fn window(&self) -> &VotingWindow {
        &self.window
    }

    /// Last second at which votes are accepted, once voting has started.
    pub fn closes_at(&self) -> Option<Timestamp> {
        self.window.closes_at()
    }

    /// All candidates in registration order.
    pub fn all_candidates(&self) -> &[Candidate] {
        self.candidates.all()
    }

    /// Get one candidate by id.
    pub fn candidate(&self, id: CandidateId) -> Result<&Candidate> {
        self.candidates
            .get(id)
            .ok_or_else(|| Error::NotFound(format!("candidate {id}")))
    }

    /// Get the candidate registry.
    pub fn candidates(&self) -> &CandidateRegistry {
        &self.candidates
    }

    /// Get the flags of a registered identity.
    pub fn voter(&self, identity: &str) -> Result<&Voter> {
        self.voters
            .get(identity)
            .ok_or_else(|| Error::NotFound(format!("voter {identity}")))
    }

    /// Get the voter registry.
    pub fn voters(&self) -> &VoterRegistry {
        &self.voters
    }

    /// Number of registered voters.
    pub fn voter_count(&self) -> usize {
        self.voters.len()
    }

    /// Number of voters who have voted.
    pub fn votes_cast(&self) -> u64 {
        self.voters.voted_count()
    }

    /// Results in registration order.
    pub fn tally(&self) -> Vec<TallyEntry> {
        self.candidates
            .all()
            .iter()
            .map(|c| TallyEntry {
                id: c.id,
                name: c.name.clone(),
                votes: c.votes,
            })
            .collect()
    }

    /// Candidates sharing the highest tally. Empty until a vote is cast.
    pub fn leaders(&self) -> Vec<&Candidate> {
        let Some(max) = self.candidates.all().iter().map(|c| c.votes).max() else {
            return Vec::new();
        };
        if max == 0 {
            return Vec::new();
        }

        self.candidates
            .all()
            .iter()
            .filter(|c| c.votes == max)
            .collect()
    }

    /// Get the event history.
    pub fn history(&self) -> &[LedgerEvent] {
        &self.history
    }

    fn record(&mut self, at: Timestamp, kind: EventKind) {
        self.history.push(LedgerEvent { at, kind });
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    /// Encode the full ledger state as CBOR.
    pub fn snapshot(&self) -> Result<Vec<u8>> {
        let snapshot = SnapshotRef {
            id: &self.id,
            access: &self.access,
            candidates: &self.candidates,
            voters: &self.voters,
            window: &self.window,
            history: &self.history,
        };

        let mut buf = Vec::new();
        ciborium::into_writer(&snapshot, &mut buf)?;
        Ok(buf)
    }

    /// Rebuild a ledger from [`ElectionLedger::snapshot`] output.
    ///
    /// Snapshots whose tallies disagree with the voter registry, or whose
    /// candidate ids are not contiguous, are rejected.
    pub fn restore(bytes: &[u8], clock: Box<dyn Clock>) -> Result<Self> {
        let snapshot: Snapshot = ciborium::from_reader(bytes)?;

        if !snapshot.candidates.ids_contiguous() {
            return Err(Error::InvalidArgument(
                "snapshot candidate ids are not contiguous".into(),
            ));
        }
        let tallied = snapshot.candidates.total_votes();
        let voted = snapshot.voters.voted_count();
        if tallied != voted {
            return Err(Error::InvalidArgument(format!(
                "snapshot tallies {tallied} votes but {voted} voters have voted"
            )));
        }

        info!(election = %snapshot.id, "election ledger restored");
        Ok(Self {
            id: snapshot.id,
            access: snapshot.access,
            candidates: snapshot.candidates,
            voters: snapshot.voters,
            window: snapshot.window,
            history: snapshot.history,
            clock,
        })
    }
}

impl fmt::Debug for ElectionLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElectionLedger")
            .field("id", &self.id)
            .field("access", &self.access)
            .field("candidates", &self.candidates)
            .field("voters", &self.voters)
            .field("window", &self.window)
            .field("history", &self.history.len())
            .finish_non_exhaustive()
    }
}

/// Borrowed view used for encoding (excludes the clock).
#[derive(Serialize)]
struct SnapshotRef<'a> {
    id: &'a Uuid,
    access: &'a AccessControl,
    candidates: &'a CandidateRegistry,
    voters: &'a VoterRegistry,
    window: &'a VotingWindow,
    history: &'a [LedgerEvent],
}

#[derive(Deserialize)]
struct Snapshot {
    id: Uuid,
    access: AccessControl,
    candidates: CandidateRegistry,
    voters: VoterRegistry,
    window: VotingWindow,
    history: Vec<LedgerEvent>,
}
