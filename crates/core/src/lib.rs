//! ezballot-core: ledger state machine for authority-managed elections.
//!
//! One administrator registers candidates, voters register themselves, and
//! the administrator opens a time-bounded voting window. The ledger enforces:
//! - one vote per registered voter, for exactly one registered candidate
//! - candidates frozen once voting opens
//! - tallies that always equal the number of voters who have voted

mod access;
mod candidate;
mod clock;
mod error;
mod event;
mod ledger;
mod shared;
mod voter;
mod window;

pub use access::AccessControl;
pub use candidate::{Candidate, CandidateId, CandidateRegistry, NewCandidate};
pub use clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use error::{Error, Result};
pub use event::{EventKind, LedgerEvent};
pub use ledger::{ElectionLedger, TallyEntry};
pub use shared::SharedLedger;
pub use voter::{Identity, Voter, VoterRegistry};
pub use window::{Phase, VotingWindow};
