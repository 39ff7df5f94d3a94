//! Voter registry keyed by external identity.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// An opaque voter identity, e.g. a national identifier.
pub type Identity = String;

/// Registration and voting status of one identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voter {
    pub registered: bool,
    pub has_voted: bool,
}

/// Registered voters. Entries are never removed and `has_voted` never reverts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterRegistry {
    voters: BTreeMap<Identity, Voter>,
}

impl VoterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, identity: &str) -> Option<&Voter> {
        self.voters.get(identity)
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.voters.contains_key(identity)
    }

    /// Check that `identity` could be inserted.
    pub(crate) fn check_new(&self, identity: &str) -> Result<()> {
        if identity.trim().is_empty() {
            return Err(Error::InvalidArgument("voter identity is empty".into()));
        }
        if self.contains(identity) {
            return Err(Error::AlreadyRegistered(identity.to_string()));
        }
        Ok(())
    }

    pub(crate) fn register(&mut self, identity: &str) -> Result<()> {
        self.check_new(identity)?;
        self.voters.insert(
            identity.to_string(),
            Voter {
                registered: true,
                has_voted: false,
            },
        );
        Ok(())
    }

    /// Flip `has_voted`. The caller has already checked the identity exists.
    pub(crate) fn mark_voted(&mut self, identity: &str) {
        if let Some(voter) = self.voters.get_mut(identity) {
            voter.has_voted = true;
        }
    }

    pub fn len(&self) -> usize {
        self.voters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voters.is_empty()
    }

    /// Number of voters whose vote has been recorded.
    pub fn voted_count(&self) -> u64 {
        self.voters.values().filter(|v| v.has_voted).count() as u64
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Voter)> {
        self.voters.iter().map(|(id, v)| (id.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AADHAR_1: &str = "123456789012";

    #[test]
    fn register_then_lookup() {
        let mut registry = VoterRegistry::new();
        registry.register(AADHAR_1).unwrap();

        let voter = registry.get(AADHAR_1).unwrap();
        assert!(voter.registered);
        assert!(!voter.has_voted);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn duplicate_registration_rejected() {
        let mut registry = VoterRegistry::new();
        registry.register(AADHAR_1).unwrap();

        assert_eq!(
            registry.register(AADHAR_1),
            Err(Error::AlreadyRegistered(AADHAR_1.to_string()))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn blank_identity_rejected() {
        let mut registry = VoterRegistry::new();
        assert_eq!(registry.register("").unwrap_err().kind(), "invalid_argument");
        assert!(registry.is_empty());
    }

    #[test]
    fn mark_voted_counts() {
        let mut registry = VoterRegistry::new();
        registry.register(AADHAR_1).unwrap();
        registry.register("987654321098").unwrap();

        registry.mark_voted(AADHAR_1);
        assert!(registry.get(AADHAR_1).unwrap().has_voted);
        assert_eq!(registry.voted_count(), 1);

        // unknown identities are ignored
        registry.mark_voted("000000000000");
        assert_eq!(registry.voted_count(), 1);
        assert_eq!(registry.len(), 2);
    }
}
