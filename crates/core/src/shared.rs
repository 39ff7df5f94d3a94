//! Thread-safe handle to a ledger.
//!
//! Every mutating call holds the write lock for its whole
//! validate-then-apply sequence, so concurrent votes are serialized and no
//! reader observes a voter flag without the matching tally.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use uuid::Uuid;

use crate::{
    Candidate, CandidateId, ElectionLedger, NewCandidate, Phase, Result, TallyEntry, Voter,
};

/// Cloneable, shareable ledger handle.
#[derive(Clone, Debug)]
pub struct SharedLedger {
    inner: Arc<RwLock<ElectionLedger>>,
}

impl SharedLedger {
    /// Wrap a ledger for sharing across threads.
    pub fn new(ledger: ElectionLedger) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ledger)),
        }
    }

    // Operations validate before mutating, so a poisoned lock still guards
    // consistent state.
    fn read(&self) -> RwLockReadGuard<'_, ElectionLedger> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ElectionLedger> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against one consistent view of the ledger.
    pub fn with<R>(&self, f: impl FnOnce(&ElectionLedger) -> R) -> R {
        f(&*self.read())
    }

    /// See [`ElectionLedger::add_candidate`].
    pub fn add_candidate(&self, caller: &str, candidate: NewCandidate) -> Result<CandidateId> {
        self.write().add_candidate(caller, candidate)
    }

    /// See [`ElectionLedger::register_voter`].
    pub fn register_voter(&self, identity: &str) -> Result<()> {
        self.write().register_voter(identity)
    }

    /// See [`ElectionLedger::start_voting`].
    pub fn start_voting(&self, caller: &str, duration_secs: u64) -> Result<()> {
        self.write().start_voting(caller, duration_secs)
    }

    /// See [`ElectionLedger::end_voting`].
    pub fn end_voting(&self, caller: &str) -> Result<()> {
        self.write().end_voting(caller)
    }

    /// See [`ElectionLedger::vote`].
    pub fn vote(&self, identity: &str, candidate_id: CandidateId) -> Result<()> {
        self.write().vote(identity, candidate_id)
    }

    /// Get the election id.
    pub fn id(&self) -> Uuid {
        self.read().id()
    }

    /// Get the administrator identity.
    pub fn admin(&self) -> String {
        self.read().admin().to_string()
    }

    /// Effective phase at the current clock time.
    pub fn phase(&self) -> Phase {
        self.read().phase()
    }

    /// All candidates in registration order.
    pub fn all_candidates(&self) -> Vec<Candidate> {
        self.read().all_candidates().to_vec()
    }

    /// Get one candidate by id.
    pub fn candidate(&self, id: CandidateId) -> Result<Candidate> {
        self.read().candidate(id).cloned()
    }

    /// Get the flags of a registered identity.
    pub fn voter(&self, identity: &str) -> Result<Voter> {
        self.read().voter(identity).copied()
    }

    /// Results in registration order.
    pub fn tally(&self) -> Vec<TallyEntry> {
        self.read().tally()
    }

    /// Number of voters who have voted.
    pub fn votes_cast(&self) -> u64 {
        self.read().votes_cast()
    }
}

impl From<ElectionLedger> for SharedLedger {
    fn from(ledger: ElectionLedger) -> Self {
        Self::new(ledger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ManualClock;
    use std::thread;

    const ADMIN: &str = "0xadmin";

    fn open_election(voters: usize) -> SharedLedger {
        let mut ledger = ElectionLedger::with_clock(ADMIN, Box::new(ManualClock::new(0)));
        ledger
            .add_candidate(ADMIN, NewCandidate::new("Candidate 1", "Male", 40, "Party A", "General"))
            .unwrap();
        ledger
            .add_candidate(ADMIN, NewCandidate::new("Candidate 2", "Female", 35, "Party B", "General"))
            .unwrap();
        ledger
            .register_voters((0..voters).map(|i| format!("{i:012}")))
            .unwrap();
        ledger.start_voting(ADMIN, 3_600).unwrap();
        SharedLedger::new(ledger)
    }

    #[test]
    fn concurrent_double_votes_count_once() {
        let shared = open_election(50);

        // Every voter tries to vote from four threads at once.
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let shared = shared.clone();
                thread::spawn(move || {
                    let mut accepted = 0u64;
                    for i in 0..50 {
                        let candidate = (i + t) % 2 + 1;
                        if shared.vote(&format!("{i:012}"), candidate as u64).is_ok() {
                            accepted += 1;
                        }
                    }
                    accepted
                })
            })
            .collect();

        let accepted: u64 = handles.into_iter().map(|h| h.join().unwrap()).sum();

        assert_eq!(accepted, 50);
        assert_eq!(shared.votes_cast(), 50);
        let total: u64 = shared.tally().iter().map(|t| t.votes).sum();
        assert_eq!(total, 50);
    }

    #[test]
    fn readers_see_consistent_totals() {
        let shared = open_election(20);

        let writer = {
            let shared = shared.clone();
            thread::spawn(move || {
                for i in 0..20 {
                    shared.vote(&format!("{i:012}"), 1).unwrap();
                }
            })
        };

        for _ in 0..100 {
            shared.with(|ledger| {
                assert_eq!(ledger.candidates().total_votes(), ledger.votes_cast());
            });
        }

        writer.join().unwrap();
        assert_eq!(shared.candidate(1).unwrap().votes, 20);
        assert!(shared.voter("000000000019").unwrap().has_voted);
    }

    #[test]
    fn handle_exposes_admin_and_phase() {
        let shared = open_election(1);
        assert_eq!(shared.admin(), ADMIN);
        assert_eq!(shared.phase(), Phase::Open);
        assert_eq!(shared.all_candidates().len(), 2);

        shared.end_voting(ADMIN).unwrap();
        assert_eq!(shared.phase(), Phase::Closed);
        assert_eq!(
            shared.vote("000000000000", 1).unwrap_err().kind(),
            "voting_not_active"
        );
    }
}
