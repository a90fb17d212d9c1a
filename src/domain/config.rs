use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use super::eligibility::EligibilityPolicy;

/// Configuration for eligibility checks and data sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Versions", into = "Versions")]
pub struct Config {
    /// The youngest age, in whole years, at which a person may donate.
    minimum_age: u32,

    /// The oldest age, in whole years, at which a person may donate.
    maximum_age: u32,

    /// How often a live under-age countdown is recomputed, in seconds.
    refresh_interval_secs: u64,

    /// Default donor pool file.
    pub pool: Option<PathBuf>,

    /// Default geography catalog file.
    pub catalog: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            minimum_age: default_minimum_age(),
            maximum_age: default_maximum_age(),
            refresh_interval_secs: default_refresh_interval_secs(),
            pool: None,
            catalog: None,
        }
    }
}

/// Errors from reading or writing a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config file: {0}")]
    Read(#[source] std::io::Error),

    /// The file is not valid configuration.
    #[error("Failed to parse config file: {0}")]
    Parse(#[source] toml::de::Error),

    /// The configuration could not be serialized.
    #[error("Failed to serialize config: {0}")]
    Serialize(#[source] toml::ser::Error),

    /// The file could not be written.
    #[error("Failed to write config file: {0}")]
    Write(#[source] std::io::Error),
}

/// Configuration values that are individually valid but not together.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InvalidConfig {
    /// The age window is empty.
    #[error("minimum_age ({minimum}) is greater than maximum_age ({maximum})")]
    AgeRange {
        /// Configured minimum.
        minimum: u32,
        /// Configured maximum.
        maximum: u32,
    },

    /// The countdown would never refresh.
    #[error("refresh_interval_secs must be greater than zero")]
    RefreshInterval,
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Read)?;
        toml::from_str(&content).map_err(ConfigError::Parse)
    }

    /// Loads the configuration at `path`, or the defaults if there is no
    /// file there.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        std::fs::write(path, content).map_err(ConfigError::Write)
    }

    /// Build a configuration with a custom age window.
    ///
    /// # Errors
    ///
    /// Returns an error if `minimum_age` is greater than `maximum_age`.
    pub fn with_ages(self, minimum_age: u32, maximum_age: u32) -> Result<Self, InvalidConfig> {
        let config = Self {
            minimum_age,
            maximum_age,
            ..self
        };
        config.validate()?;
        Ok(config)
    }

    /// The age window used to classify eligibility.
    #[must_use]
    pub const fn policy(&self) -> EligibilityPolicy {
        EligibilityPolicy {
            minimum_age: self.minimum_age,
            maximum_age: self.maximum_age,
        }
    }

    /// How often a live countdown is recomputed.
    #[must_use]
    pub const fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    const fn validate(&self) -> Result<(), InvalidConfig> {
        if self.minimum_age > self.maximum_age {
            return Err(InvalidConfig::AgeRange {
                minimum: self.minimum_age,
                maximum: self.maximum_age,
            });
        }
        if self.refresh_interval_secs == 0 {
            return Err(InvalidConfig::RefreshInterval);
        }
        Ok(())
    }
}

const fn default_minimum_age() -> u32 {
    18
}

const fn default_maximum_age() -> u32 {
    65
}

const fn default_refresh_interval_secs() -> u64 {
    60
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_minimum_age")]
        minimum_age: u32,

        #[serde(default = "default_maximum_age")]
        maximum_age: u32,

        /// Seconds between recomputations of a live countdown.
        #[serde(default = "default_refresh_interval_secs")]
        refresh_interval_secs: u64,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        pool: Option<PathBuf>,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        catalog: Option<PathBuf>,
    },
}

impl TryFrom<Versions> for Config {
    type Error = InvalidConfig;

    fn try_from(versions: Versions) -> Result<Self, Self::Error> {
        let config = match versions {
            Versions::V1 {
                minimum_age,
                maximum_age,
                refresh_interval_secs,
                pool,
                catalog,
            } => Self {
                minimum_age,
                maximum_age,
                refresh_interval_secs,
                pool,
                catalog,
            },
        };
        config.validate()?;
        Ok(config)
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            minimum_age: config.minimum_age,
            maximum_age: config.maximum_age,
            refresh_interval_secs: config.refresh_interval_secs,
            pool: config.pool,
            catalog: config.catalog,
        }
    }
}
