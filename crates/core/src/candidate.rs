//! Candidates and their registry.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Sequential candidate identifier, starting at 1.
pub type CandidateId = u64;

/// A registered candidate and their running tally.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
    pub gender: String,
    pub age: u32,
    pub party: String,
    pub election_type: String,
    /// Votes received so far.
    pub votes: u64,
}

/// Registration details for a candidate, before an id is assigned.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCandidate {
    pub name: String,
    pub gender: String,
    pub age: u32,
    pub party: String,
    pub election_type: String,
}

impl NewCandidate {
    pub fn new(
        name: impl Into<String>,
        gender: impl Into<String>,
        age: u32,
        party: impl Into<String>,
        election_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            gender: gender.into(),
            age,
            party: party.into(),
            election_type: election_type.into(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidArgument("candidate name is empty".into()));
        }
        Ok(())
    }
}

/// Candidates in registration order. A candidate's id is its position plus one.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRegistry {
    candidates: Vec<Candidate>,
}

impl CandidateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The id the next registration will receive.
    pub fn next_id(&self) -> CandidateId {
        self.candidates.len() as CandidateId + 1
    }

    /// Append a candidate with zero votes and return its id.
    pub(crate) fn register(&mut self, new: NewCandidate) -> Result<CandidateId> {
        new.validate()?;

        let id = self.next_id();
        self.candidates.push(Candidate {
            id,
            name: new.name,
            gender: new.gender,
            age: new.age,
            party: new.party,
            election_type: new.election_type,
            votes: 0,
        });
        Ok(id)
    }

    pub fn get(&self, id: CandidateId) -> Option<&Candidate> {
        let index = usize::try_from(id.checked_sub(1)?).ok()?;
        self.candidates.get(index)
    }

    pub(crate) fn get_mut(&mut self, id: CandidateId) -> Option<&mut Candidate> {
        let index = usize::try_from(id.checked_sub(1)?).ok()?;
        self.candidates.get_mut(index)
    }

    /// All candidates in registration order.
    pub fn all(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Sum of every candidate's tally.
    pub fn total_votes(&self) -> u64 {
        self.candidates.iter().map(|c| c.votes).sum()
    }

    /// Check that ids run 1..=N in order.
    pub(crate) fn ids_contiguous(&self) -> bool {
        self.candidates
            .iter()
            .enumerate()
            .all(|(i, c)| c.id == i as CandidateId + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str) -> NewCandidate {
        NewCandidate::new(name, "Female", 35, "Party B", "General")
    }

    #[test]
    fn ids_are_sequential_from_one() {
        let mut registry = CandidateRegistry::new();
        assert_eq!(registry.next_id(), 1);

        let ids: Vec<_> = ["a", "b", "c"]
            .iter()
            .map(|name| registry.register(candidate(name)).unwrap())
            .collect();

        assert_eq!(ids, vec![1, 2, 3]);
        assert!(registry.ids_contiguous());
        assert_eq!(registry.next_id(), 4);
    }

    #[test]
    fn lookup_out_of_range() {
        let mut registry = CandidateRegistry::new();
        registry.register(candidate("a")).unwrap();

        assert!(registry.get(0).is_none());
        assert!(registry.get(1).is_some());
        assert!(registry.get(2).is_none());
        assert!(registry.get(u64::MAX).is_none());
    }

    #[test]
    fn new_candidates_start_at_zero() {
        let mut registry = CandidateRegistry::new();
        let id = registry.register(candidate("a")).unwrap();

        let stored = registry.get(id).unwrap();
        assert_eq!(stored.votes, 0);
        assert_eq!(stored.party, "Party B");
        assert_eq!(registry.total_votes(), 0);
    }

    #[test]
    fn blank_name_rejected() {
        let mut registry = CandidateRegistry::new();
        let err = registry.register(candidate("  ")).unwrap_err();

        assert_eq!(err.kind(), "invalid_argument");
        assert!(registry.is_empty());
    }
}
