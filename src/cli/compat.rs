use clap::Parser;
use donormatch::{domain::compatibility::CompatibilityProfile, BloodType, CompatibilityTable};
use tracing::instrument;

use super::{
    terminal::{is_narrow, Colorize},
    OutputFormat,
};

#[derive(Debug, Parser)]
#[command(about = "Show which blood types can donate to and receive from each other")]
pub struct Compat {
    /// Blood type to describe (e.g. "O-", "ab+")
    #[arg(
        required_unless_present = "all",
        conflicts_with = "all",
        value_parser = super::parse_blood_type
    )]
    blood_type: Option<BloodType>,

    /// Describe all eight blood types
    #[arg(long)]
    all: bool,

    /// Output format (table, json)
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,
}

impl Compat {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self) -> anyhow::Result<()> {
        let profiles: Vec<CompatibilityProfile> = match self.blood_type {
            Some(blood_type) if !self.all => vec![CompatibilityTable::profile(blood_type)],
            _ => BloodType::ALL
                .iter()
                .copied()
                .map(CompatibilityTable::profile)
                .collect(),
        };

        match self.output {
            OutputFormat::Json => Self::output_json(&profiles)?,
            OutputFormat::Table if profiles.len() == 1 || is_narrow() => {
                Self::output_stacked(&profiles);
            }
            OutputFormat::Table => Self::output_table(&profiles),
        }
        Ok(())
    }

    fn output_json(profiles: &[CompatibilityProfile]) -> anyhow::Result<()> {
        let json = match profiles {
            [single] => serde_json::to_string_pretty(single)?,
            many => serde_json::to_string_pretty(many)?,
        };
        println!("{json}");
        Ok(())
    }

    fn output_stacked(profiles: &[CompatibilityProfile]) {
        for (i, profile) in profiles.iter().enumerate() {
            if i > 0 {
                println!();
            }
            println!("{}", profile.blood_type.to_string().heading());
            println!("  {} {}", "Donates to:".dim(), profile.donates_to);
            println!("  {} {}", "Receives from:".dim(), profile.receives_from);
            match profile.classification {
                Some(classification) => {
                    println!("  {}", classification.donor_class);
                    println!("  {}", classification.receiver_class);
                }
                None => println!("  {}", "Unknown blood type: no compatibility".warning()),
            }
        }
    }

    fn output_table(profiles: &[CompatibilityProfile]) {
        println!(
            "{:<5} {:<40} {:<40} {:<16} {}",
            "Type", "Donates to", "Receives from", "Donor", "Receiver"
        );
        println!("{}", "─".repeat(120).dim());
        for profile in profiles {
            let (donor, receiver) = profile.classification.map_or_else(
                || ("-".to_string(), "-".to_string()),
                |c| (c.donor_class.to_string(), c.receiver_class.to_string()),
            );
            println!(
                "{:<5} {:<40} {:<40} {:<16} {}",
                profile.blood_type.to_string(),
                profile.donates_to.to_string(),
                profile.receives_from.to_string(),
                donor,
                receiver
            );
        }
    }
}
