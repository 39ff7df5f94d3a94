//! Voting window phases.
//!
//! ```text
//! Unopened --open--> Open --(deadline passes | close)--> Closed
//! ```
//!
//! Expiry is evaluated lazily: an `Open` window whose deadline has passed
//! reports `Phase::Closed` without being rewritten.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result, Timestamp};

/// The window's current stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Unopened,
    Open,
    Closed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Unopened => "unopened",
            Phase::Open => "open",
            Phase::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Recorded window state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VotingWindow {
    #[default]
    Unopened,
    Open {
        start: Timestamp,
        duration: u64,
    },
    Closed {
        start: Timestamp,
        duration: u64,
        closed_at: Timestamp,
    },
}

impl VotingWindow {
    /// Effective phase at `now`.
    pub fn phase_at(&self, now: Timestamp) -> Phase {
        match *self {
            VotingWindow::Unopened => Phase::Unopened,
            VotingWindow::Open { start, duration } => {
                if now > deadline(start, duration) {
                    Phase::Closed
                } else {
                    Phase::Open
                }
            }
            VotingWindow::Closed { .. } => Phase::Closed,
        }
    }

    pub fn start(&self) -> Option<Timestamp> {
        match *self {
            VotingWindow::Unopened => None,
            VotingWindow::Open { start, .. } | VotingWindow::Closed { start, .. } => Some(start),
        }
    }

    pub fn duration(&self) -> Option<u64> {
        match *self {
            VotingWindow::Unopened => None,
            VotingWindow::Open { duration, .. } | VotingWindow::Closed { duration, .. } => {
                Some(duration)
            }
        }
    }

    /// Last second at which votes are accepted, or when the window was
    /// explicitly closed, whichever came first.
    pub fn closes_at(&self) -> Option<Timestamp> {
        match *self {
            VotingWindow::Unopened => None,
            VotingWindow::Open { start, duration } => Some(deadline(start, duration)),
            VotingWindow::Closed { closed_at, .. } => Some(closed_at),
        }
    }

    /// Unopened -> Open.
    pub(crate) fn open(&mut self, now: Timestamp, duration: u64) -> Result<()> {
        let phase = self.phase_at(now);
        if phase != Phase::Unopened {
            return Err(Error::PhaseViolation {
                operation: "start_voting",
                phase,
            });
        }
        if duration == 0 {
            return Err(Error::InvalidArgument(
                "voting duration must be positive".into(),
            ));
        }

        *self = VotingWindow::Open {
            start: now,
            duration,
        };
        Ok(())
    }

    /// Open -> Closed. Returns false if the window was already closed.
    pub(crate) fn close(&mut self, now: Timestamp) -> Result<bool> {
        match *self {
            VotingWindow::Unopened => Err(Error::PhaseViolation {
                operation: "end_voting",
                phase: Phase::Unopened,
            }),
            VotingWindow::Open { start, duration } => {
                *self = VotingWindow::Closed {
                    start,
                    duration,
                    closed_at: now.min(deadline(start, duration)),
                };
                Ok(true)
            }
            VotingWindow::Closed { .. } => Ok(false),
        }
    }

    /// Fail with [`Error::VotingNotActive`] unless the window is open at `now`.
    pub(crate) fn ensure_open(&self, now: Timestamp) -> Result<()> {
        match self.phase_at(now) {
            Phase::Open => Ok(()),
            Phase::Unopened | Phase::Closed => Err(Error::VotingNotActive),
        }
    }
}

fn deadline(start: Timestamp, duration: u64) -> Timestamp {
    start.saturating_add(duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unopened() {
        let window = VotingWindow::default();
        assert_eq!(window.phase_at(0), Phase::Unopened);
        assert_eq!(window.start(), None);
        assert_eq!(window.closes_at(), None);
        assert_eq!(window.ensure_open(0), Err(Error::VotingNotActive));
    }

    #[test]
    fn open_until_deadline_inclusive() {
        let mut window = VotingWindow::default();
        window.open(1_000, 3_600).unwrap();

        assert_eq!(window.phase_at(1_000), Phase::Open);
        assert_eq!(window.phase_at(4_600), Phase::Open);
        assert_eq!(window.phase_at(4_601), Phase::Closed);
        assert_eq!(window.closes_at(), Some(4_600));
    }

    #[test]
    fn cannot_reopen() {
        let mut window = VotingWindow::default();
        window.open(0, 10).unwrap();

        let err = window.open(5, 10).unwrap_err();
        assert_eq!(
            err,
            Error::PhaseViolation {
                operation: "start_voting",
                phase: Phase::Open
            }
        );

        // an expired window is closed, not reopenable
        let err = window.open(100, 10).unwrap_err();
        assert_eq!(err.kind(), "phase_violation");
        assert_eq!(window.start(), Some(0));
    }

    #[test]
    fn zero_duration_rejected() {
        let mut window = VotingWindow::default();
        assert_eq!(window.open(0, 0).unwrap_err().kind(), "invalid_argument");
        assert_eq!(window, VotingWindow::Unopened);
    }

    #[test]
    fn explicit_close_is_idempotent() {
        let mut window = VotingWindow::default();
        window.open(0, 100).unwrap();

        assert_eq!(window.close(40), Ok(true));
        assert_eq!(window.phase_at(41), Phase::Closed);
        assert_eq!(window.closes_at(), Some(40));
        assert_eq!(window.close(50), Ok(false));
        assert_eq!(window.closes_at(), Some(40));
    }

    #[test]
    fn close_after_expiry_records_deadline() {
        let mut window = VotingWindow::default();
        window.open(0, 100).unwrap();

        assert_eq!(window.close(500), Ok(true));
        assert_eq!(window.closes_at(), Some(100));
    }

    #[test]
    fn close_before_open_rejected() {
        let mut window = VotingWindow::default();
        assert_eq!(window.close(0).unwrap_err().kind(), "phase_violation");
    }

    #[test]
    fn deadline_saturates() {
        let mut window = VotingWindow::default();
        window.open(u64::MAX - 1, u64::MAX).unwrap();
        assert_eq!(window.phase_at(u64::MAX), Phase::Open);
    }
}
