use anyhow::Result;
use clap::Parser;
use ini_registry::{cli::Cli, run};

fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli)
}
