use std::path::{Path, PathBuf};

mod compat;
mod eligibility;
mod geo;
mod profile;
mod search;
mod terminal;

use anyhow::Context;
use clap::ArgAction;
use compat::Compat;
use donormatch::{BloodType, Config};
use eligibility::Eligibility;
use geo::Geo;
use profile::Profile;
use search::Search;
use tracing::instrument;

/// Parse a blood type typed on the command line, normalizing to uppercase.
///
/// This is a CLI boundary function. Stored data is parsed strictly.
fn parse_blood_type(s: &str) -> Result<BloodType, String> {
    let trimmed = s.trim();
    if trimmed.eq_ignore_ascii_case("unknown") {
        return Ok(BloodType::Unknown);
    }
    trimmed
        .to_ascii_uppercase()
        .parse()
        .map_err(|e| format!("{e}"))
}

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the configuration file
    #[arg(short, long, default_value = "donor.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);
        self.command.run(&self.config)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Write a default configuration file
    Init,

    /// Show blood type compatibility and classes
    Compat(Compat),

    /// Classify a user's eligibility to donate
    ///
    /// With --watch, an under-age countdown is kept up to date until the user
    /// becomes eligible.
    Eligibility(Eligibility),

    /// Search a donor pool
    Search(Search),

    /// Browse the geography catalog
    Geo(Geo),

    /// Inspect or correct a user profile
    #[command(subcommand)]
    Profile(Profile),
}

impl Command {
    fn run(self, config_path: &Path) -> anyhow::Result<()> {
        match self {
            Self::Init => Init::run(config_path)?,
            Self::Compat(command) => command.run()?,
            Self::Eligibility(command) => command.run(&load_config(config_path)?)?,
            Self::Search(command) => command.run(&load_config(config_path)?)?,
            Self::Geo(command) => command.run(&load_config(config_path)?)?,
            Self::Profile(command) => command.run()?,
        }
        Ok(())
    }
}

fn load_config(path: &Path) -> anyhow::Result<Config> {
    Config::load_or_default(path).with_context(|| format!("Failed to load {}", path.display()))
}

/// Output format for commands that support machine-readable output.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Resolve a file argument, falling back to the configured default.
fn file_or_configured(
    explicit: Option<PathBuf>,
    configured: Option<&Path>,
    what: &str,
    flag: &str,
) -> anyhow::Result<PathBuf> {
    explicit
        .or_else(|| configured.map(Path::to_path_buf))
        .with_context(|| format!("No {what} given: pass {flag} or set it in the config file"))
}

struct Init;

impl Init {
    #[instrument]
    fn run(path: &Path) -> anyhow::Result<()> {
        if path.exists() {
            anyhow::bail!("Configuration already exists at {}", path.display());
        }

        Config::default()
            .save(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;

        println!("Created {}", path.display());
        println!();
        println!("Next steps:");
        println!("  set `pool` and `catalog` in {} to your data files", path.display());
        println!("  donor compat --all");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("ab+", BloodType::AbPos; "lowercase")]
    #[test_case(" O- ", BloodType::ONeg; "padded")]
    #[test_case("UNKNOWN", BloodType::Unknown; "unknown marker")]
    fn command_line_blood_types_are_normalized(input: &str, expected: BloodType) {
        assert_eq!(parse_blood_type(input), Ok(expected));
    }

    #[test]
    fn command_line_rejects_non_codes() {
        assert!(parse_blood_type("C+").is_err());
    }
}
