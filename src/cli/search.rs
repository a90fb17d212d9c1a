use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use donormatch::{
    domain::search_compatible, fetch_and_search, BloodType, Config, DonorPoolProvider,
    DonorProfile, PoolFile, SearchFilter, SearchResult,
};
use tracing::instrument;

use super::{
    file_or_configured,
    terminal::{is_narrow, Colorize},
    OutputFormat,
};

#[derive(Debug, Parser)]
#[command(about = "Search a donor pool by blood type and location")]
pub struct Search {
    /// Donor pool file (JSON or YAML); defaults to `pool` from the config
    #[arg(long, value_name = "FILE")]
    pool: Option<PathBuf>,

    /// Only donors with exactly this blood type
    #[arg(
        long,
        value_name = "TYPE",
        conflicts_with = "compatible_with",
        value_parser = super::parse_blood_type
    )]
    blood_type: Option<BloodType>,

    /// Only donors whose blood can be given to this recipient type
    #[arg(long, value_name = "TYPE", value_parser = super::parse_blood_type)]
    compatible_with: Option<BloodType>,

    /// Only donors in this country
    #[arg(long)]
    country: Option<String>,

    /// Only donors in this state
    #[arg(long)]
    state: Option<String>,

    /// Only donors in this city
    #[arg(long)]
    city: Option<String>,

    /// Output format (table, json)
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,
}

impl Search {
    #[instrument(level = "debug", skip(self, config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let path = file_or_configured(self.pool, config.pool.as_deref(), "donor pool", "--pool")?;
        let provider = PoolFile::new(path);

        let filter = SearchFilter {
            blood_type: self.blood_type,
            country: self.country,
            state: self.state,
            city: self.city,
        };

        let result = match self.compatible_with {
            Some(recipient) => {
                let pool = provider.fetch(&filter).context("Search failed")?;
                search_compatible(recipient, &filter, &pool)
            }
            None => fetch_and_search(&provider, &filter).context("Search failed")?,
        };

        match self.output {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
            OutputFormat::Table if result.is_empty() => {
                let wanted = describe(&filter, self.compatible_with);
                println!("No donors found matching {wanted}");
            }
            OutputFormat::Table => Self::output_table(&result),
        }
        Ok(())
    }

    fn output_table(result: &SearchResult) {
        let narrow = is_narrow();
        let sections = [
            ("Available", &result.available),
            ("Unavailable", &result.unavailable),
        ];
        for (i, (title, donors)) in sections.into_iter().enumerate() {
            if i > 0 {
                println!();
            }
            let heading = format!("{title} ({})", donors.len());
            if title == "Available" {
                println!("{}", heading.success());
            } else {
                println!("{}", heading.dim());
            }
            for donor in donors {
                if narrow {
                    println!("  {} {} {}", donor.id, donor.blood_type, location(donor));
                } else {
                    println!(
                        "  {:<10} {:<24} {:<4} {}",
                        donor.id,
                        donor.name.as_deref().unwrap_or("-"),
                        donor.blood_type.to_string(),
                        location(donor)
                    );
                }
            }
        }
    }
}

fn location(donor: &DonorProfile) -> String {
    [&donor.city, &donor.state, &donor.country]
        .into_iter()
        .filter(|part| !part.is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe(filter: &SearchFilter, compatible_with: Option<BloodType>) -> String {
    let mut parts = Vec::new();
    if let Some(recipient) = compatible_with {
        parts.push(format!("donors for {recipient}"));
    } else if let Some(blood_type) = filter.blood_type {
        parts.push(format!("blood type {blood_type}"));
    }
    for (label, value) in [
        ("country", &filter.country),
        ("state", &filter.state),
        ("city", &filter.city),
    ] {
        if let Some(value) = value {
            parts.push(format!("{label} {value}"));
        }
    }
    if parts.is_empty() {
        "any donor".to_string()
    } else {
        parts.join(", ")
    }
}
