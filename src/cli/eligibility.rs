use std::{path::PathBuf, time::Duration};

use anyhow::Context;
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use clap::Parser;
use donormatch::{
    countdown::SystemClock, Config, Countdown, CountdownHandle, EligibilityClassifier,
    EligibilityState, ProfileFile, UserProfile,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::instrument;

use super::{
    terminal::{eligibility_label, Colorize},
    OutputFormat,
};

/// Accept either a date (midnight) or a date and time.
fn parse_instant(s: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d").map(|d| d.and_time(NaiveTime::MIN)))
        .map_err(|_| {
            format!("'{s}' is not a date (YYYY-MM-DD) or date-time (YYYY-MM-DDTHH:MM:SS)")
        })
}

#[derive(Debug, Parser)]
#[command(about = "Classify whether a user may donate")]
pub struct Eligibility {
    /// User profile file (JSON or YAML)
    #[arg(long, value_name = "FILE")]
    profile: PathBuf,

    /// Evaluate at this local date or date-time instead of now
    #[arg(long, value_name = "DATETIME", value_parser = parse_instant, conflicts_with = "watch")]
    at: Option<NaiveDateTime>,

    /// Keep an under-age countdown running until the user is eligible
    #[arg(long)]
    watch: bool,

    /// Output format (table, json)
    #[arg(long, value_enum, default_value_t, conflicts_with = "watch")]
    output: OutputFormat,
}

impl Eligibility {
    #[instrument(level = "debug", skip(self, config))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let file = ProfileFile::open(&self.profile)?;
        let profile = file.profile();
        let classifier = EligibilityClassifier::new(config.policy());

        let now = self.at.unwrap_or_else(|| Local::now().naive_local());
        let state = classifier
            .classify(profile, now)
            .with_context(|| format!("Cannot classify {}", self.profile.display()))?;

        if let OutputFormat::Json = self.output {
            println!("{}", serde_json::to_string_pretty(&state)?);
            return Ok(());
        }

        Self::output_state(profile, &state);

        if self.watch && matches!(state, EligibilityState::UnderAge { .. }) {
            let countdown = Countdown::new(classifier, config.refresh_interval());
            watch(&countdown, profile)?;
        }
        Ok(())
    }

    fn output_state(profile: &UserProfile, state: &EligibilityState) {
        let who = profile.name.as_deref().unwrap_or(&profile.id);
        if who.is_empty() {
            println!("Eligibility: {}", eligibility_label(state));
        } else {
            println!("Eligibility of {who}: {}", eligibility_label(state));
        }

        if state.needs_profile_update() {
            let missing: Vec<String> = profile
                .missing_fields()
                .iter()
                .map(ToString::to_string)
                .collect();
            if !missing.is_empty() {
                println!("  {} {}", "Missing:".dim(), missing.join(", "));
            }
            println!(
                "  {}",
                "Complete the profile with 'donor profile update'".dim()
            );
        }
    }
}

/// Drive the live countdown until the user becomes eligible or Ctrl-C.
fn watch(countdown: &Countdown, profile: &UserProfile) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start the countdown runtime")?;

    runtime.block_on(async {
        let mut handle = countdown.spawn(profile, SystemClock)?;
        let spinner = spinner()?;
        spinner.set_message(handle.current().to_string());

        tokio::select! {
            final_state = follow(&mut handle, &spinner) => {
                match final_state {
                    Some(state) => spinner.finish_with_message(eligibility_label(&state)),
                    None => spinner.finish_and_clear(),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                spinner.abandon_with_message("stopped".dim());
            }
        }
        anyhow::Ok(())
    })
}

async fn follow(handle: &mut CountdownHandle, spinner: &ProgressBar) -> Option<EligibilityState> {
    let mut last = None;
    while let Some(state) = handle.changed().await {
        spinner.set_message(state.to_string());
        last = Some(state);
    }
    last
}

fn spinner() -> anyhow::Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(250));
    Ok(spinner)
}
