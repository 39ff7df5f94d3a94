use clap::Args;
use confique::Config;
use serde::Serialize;

/// Layered configuration: command-line flags, then environment, then the
/// TOML config file, then defaults.
#[derive(Config, Clone, Debug, Serialize)]
#[config(layer_attr(derive(Args, Serialize, Clone)))]
pub struct AppConfig {
    #[config(nested, layer_attr(command(flatten)))]
    pub ledger: LedgerConfig,
}

#[derive(Config, Clone, Debug, Serialize)]
#[config(layer_attr(derive(Args, Clone, Serialize)))]
pub struct LedgerConfig {
    /// Identity of the election administrator
    #[config(env = "EZBALLOT_ADMIN", default = "admin", layer_attr(arg(long)))]
    pub admin: String,

    /// Voting window length for start_voting steps that do not give one
    #[config(default = 3600, layer_attr(arg(long)))]
    pub default_duration_secs: u64,

    /// Starting time of the scripted clock, in Unix seconds
    #[config(default = 0, layer_attr(arg(long)))]
    pub start_time: u64,
}
