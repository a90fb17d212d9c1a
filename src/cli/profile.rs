use std::path::PathBuf;

use clap::{Args, Subcommand};
use donormatch::{
    domain::{ProfileUpdate, ProfileUpdateSink},
    BloodType, ProfileFile, UserProfile,
};
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, Subcommand)]
pub enum Profile {
    /// Show a profile and anything it is missing
    Show {
        /// User profile file (JSON or YAML)
        #[arg(long, value_name = "FILE")]
        profile: PathBuf,
    },

    /// Correct fields of a profile
    ///
    /// Changing the country clears the state and city; changing the state
    /// clears the city.
    Update(Update),
}

#[derive(Debug, Args)]
pub struct Update {
    /// User profile file (JSON or YAML)
    #[arg(long, value_name = "FILE")]
    profile: PathBuf,

    /// New blood type
    #[arg(long, value_name = "TYPE", value_parser = super::parse_blood_type)]
    blood_type: Option<BloodType>,

    /// New date of birth (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    dob: Option<String>,

    /// New country
    #[arg(long)]
    country: Option<String>,

    /// New state
    #[arg(long)]
    state: Option<String>,

    /// New city
    #[arg(long)]
    city: Option<String>,
}

impl Profile {
    pub fn run(self) -> anyhow::Result<()> {
        match self {
            Self::Show { profile } => {
                let file = ProfileFile::open(&profile)?;
                print_profile(file.profile());
            }
            Self::Update(update) => update.run()?,
        }
        Ok(())
    }
}

impl Update {
    #[instrument(level = "debug", skip(self))]
    fn run(self) -> anyhow::Result<()> {
        let mut file = ProfileFile::open(&self.profile)?;
        let update = ProfileUpdate {
            blood_type: self.blood_type,
            date_of_birth: self.dob,
            country: self.country,
            state: self.state,
            city: self.city,
        };

        let updated = file.submit(update)?;
        println!("{} {}", "Updated".success(), file.path().display());
        print_profile(&updated);
        Ok(())
    }
}

fn print_profile(profile: &UserProfile) {
    let location: Vec<&str> = [&profile.city, &profile.state, &profile.country]
        .into_iter()
        .flatten()
        .map(String::as_str)
        .collect();
    let blood_type = profile
        .blood_type
        .is_canonical()
        .then(|| profile.blood_type.to_string());

    row("Id", Some(profile.id.as_str()));
    row("Name", profile.name.as_deref());
    row("Blood type", blood_type.as_deref());
    row("Date of birth", profile.date_of_birth.as_deref());
    row("Location", Some(location.join(", ").as_str()));

    let missing = profile.missing_fields();
    if !missing.is_empty() {
        let names: Vec<String> = missing.iter().map(ToString::to_string).collect();
        println!("{} {}", "Missing:".warning(), names.join(", "));
    }
}

fn row(label: &str, value: Option<&str>) {
    let label = format!("{label:<14}").heading();
    match value.filter(|v| !v.trim().is_empty()) {
        Some(value) => println!("{label} {value}"),
        None => println!("{label} {}", "-".dim()),
    }
}
