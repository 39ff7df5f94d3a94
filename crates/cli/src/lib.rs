//! ezballot-cli: replays election scripts against an [`ezballot_core::ElectionLedger`].

pub mod cli;
pub mod config;
pub mod script;

pub use cli::Cli;
pub use config::{AppConfig, LedgerConfig};
pub use script::{Outcome, Replay, Script, Step, StepOp};
