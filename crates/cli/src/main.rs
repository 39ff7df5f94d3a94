use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = ezballot_cli::Cli::parse();
    cli.run()
}
