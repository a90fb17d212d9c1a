use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dialoguer::Select;
use donormatch::{
    domain::{GeoEntry, StaticCatalog},
    storage::load_catalog,
    Config, GeographyCascade,
};
use serde::Serialize;
use tracing::instrument;

use super::{file_or_configured, terminal::Colorize, OutputFormat};

#[derive(Debug, Parser)]
#[command(about = "List countries, states and cities from the geography catalog")]
pub struct Geo {
    /// Geography catalog file (JSON or YAML); defaults to `catalog` from the
    /// config
    #[arg(long, value_name = "FILE", global = true)]
    catalog: Option<PathBuf>,

    /// List the states of this country
    #[arg(long)]
    country: Option<String>,

    /// List the cities of this state (requires --country)
    #[arg(long, requires = "country")]
    state: Option<String>,

    /// Output format (table, json)
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,

    #[command(subcommand)]
    action: Option<GeoAction>,
}

#[derive(Debug, Subcommand)]
enum GeoAction {
    /// Choose a country, state and city interactively and print the search
    /// filter they make
    Pick,
}

#[derive(Debug, Serialize)]
struct Listing<'a> {
    level: &'static str,
    options: &'a [GeoEntry],
}

impl Geo {
    #[instrument(level = "debug", skip(self, config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let path = file_or_configured(
            self.catalog,
            config.catalog.as_deref(),
            "geography catalog",
            "--catalog",
        )?;
        let catalog = load_catalog(&path)?;

        match self.action {
            Some(GeoAction::Pick) => pick(&catalog),
            None => list(
                &catalog,
                self.country.as_deref(),
                self.state.as_deref(),
                self.output,
            ),
        }
    }
}

fn list(
    catalog: &StaticCatalog,
    country: Option<&str>,
    state: Option<&str>,
    output: OutputFormat,
) -> anyhow::Result<()> {
    let mut cascade = GeographyCascade::new(catalog);
    if let Some(country) = country {
        cascade.set_country(country)?;
    }
    if let Some(state) = state {
        cascade.set_state(state)?;
    }

    let countries;
    let (level, options) = match (cascade.country(), cascade.state()) {
        (None, _) => {
            countries = cascade.countries();
            ("countries", countries.as_slice())
        }
        (Some(_), None) => ("states", cascade.states()),
        (Some(_), Some(_)) => ("cities", cascade.cities()),
    };

    match output {
        OutputFormat::Json => {
            let listing = Listing { level, options };
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
        OutputFormat::Table if options.is_empty() => println!("No {level} to choose from"),
        OutputFormat::Table => {
            for entry in options {
                println!("{:<8} {}", entry.code, entry.name.dim());
            }
        }
    }
    Ok(())
}

fn pick(catalog: &StaticCatalog) -> anyhow::Result<()> {
    let mut cascade = GeographyCascade::new(catalog);

    let countries = cascade.countries();
    if let Some(code) = choose("Country", &countries)? {
        cascade.set_country(&code)?;

        let states = cascade.states().to_vec();
        if let Some(code) = choose("State", &states)? {
            cascade.set_state(&code)?;

            let cities = cascade.cities().to_vec();
            if let Some(code) = choose("City", &cities)? {
                cascade.set_city(&code)?;
            }
        }
    }

    let filter = cascade.to_filter();
    println!("{}", serde_json::to_string_pretty(&filter)?);
    Ok(())
}

/// Offer `options` with a leading "any" entry. `None` means no constraint.
fn choose(prompt: &str, options: &[GeoEntry]) -> anyhow::Result<Option<String>> {
    if options.is_empty() {
        return Ok(None);
    }

    let mut labels = vec![format!("(any {})", prompt.to_lowercase())];
    labels.extend(
        options
            .iter()
            .map(|entry| format!("{} ({})", entry.name, entry.code)),
    );

    let selection = Select::new()
        .with_prompt(prompt)
        .items(&labels)
        .default(0)
        .interact_opt()?;

    Ok(match selection {
        Some(0) | None => None,
        Some(i) => options.get(i - 1).map(|entry| entry.code.clone()),
    })
}
