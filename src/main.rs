//! `donor`: blood-type compatibility, eligibility and donor search from the
//! command line.

use clap::Parser;

mod cli;

fn main() -> anyhow::Result<()> {
    cli::Cli::parse().run()
}
