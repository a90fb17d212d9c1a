//! Cascading country → state → city selection.
//!
//! The [`GeographyCascade`] keeps a selection consistent with a read-only
//! [`GeographyCatalog`]: a child selection is cleared as soon as it is no
//! longer valid for its parent, so a city never outlives its state and a
//! state never outlives its country.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::search::SearchFilter;

/// A selectable place: a stable code and a display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoEntry {
    /// Code used for selection and matching.
    pub code: String,
    /// Human readable name.
    pub name: String,
}

impl GeoEntry {
    /// Create an entry.
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

/// A read-only source of countries, states and cities.
///
/// Empty results are valid and mean "nothing to choose from".
pub trait GeographyCatalog {
    /// Every known country.
    fn all_countries(&self) -> Vec<GeoEntry>;

    /// The states of `country`.
    fn states_of(&self, country: &str) -> Vec<GeoEntry>;

    /// The cities in `state` of `country`.
    fn cities_of(&self, country: &str, state: &str) -> Vec<GeoEntry>;
}

/// A state and its cities, as stored in a catalog document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateNode {
    /// State code.
    pub code: String,
    /// State name.
    pub name: String,
    /// Cities in the state.
    #[serde(default)]
    pub cities: Vec<GeoEntry>,
}

/// A country and its states, as stored in a catalog document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryNode {
    /// Country code.
    pub code: String,
    /// Country name.
    pub name: String,
    /// States in the country.
    #[serde(default)]
    pub states: Vec<StateNode>,
}

/// An in-memory catalog built from a nested document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StaticCatalog {
    /// All countries, in display order.
    #[serde(default)]
    pub countries: Vec<CountryNode>,
}

impl StaticCatalog {
    /// Build a catalog from its countries.
    #[must_use]
    pub const fn new(countries: Vec<CountryNode>) -> Self {
        Self { countries }
    }

    fn country(&self, code: &str) -> Option<&CountryNode> {
        self.countries.iter().find(|country| country.code == code)
    }
}

impl GeographyCatalog for StaticCatalog {
    fn all_countries(&self) -> Vec<GeoEntry> {
        self.countries
            .iter()
            .map(|country| GeoEntry::new(&country.code, &country.name))
            .collect()
    }

    fn states_of(&self, country: &str) -> Vec<GeoEntry> {
        self.country(country)
            .map(|country| {
                country
                    .states
                    .iter()
                    .map(|state| GeoEntry::new(&state.code, &state.name))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn cities_of(&self, country: &str, state: &str) -> Vec<GeoEntry> {
        self.country(country)
            .and_then(|country| country.states.iter().find(|s| s.code == state))
            .map(|state| state.cities.clone())
            .unwrap_or_default()
    }
}

/// Errors from changing a cascade selection.
///
/// A rejected change leaves the selection as it was.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CascadeError {
    /// The country is not in the catalog.
    #[error("Unknown country '{0}'")]
    UnknownCountry(String),

    /// The state does not belong to the selected country.
    #[error("Unknown state '{state}' for country '{country}'")]
    UnknownState {
        /// The selected country.
        country: String,
        /// The rejected state.
        state: String,
    },

    /// The city does not belong to the selected state.
    #[error("Unknown city '{city}' for state '{state}'")]
    UnknownCity {
        /// The selected state.
        state: String,
        /// The rejected city.
        city: String,
    },

    /// A state was chosen before a country.
    #[error("Select a country before selecting a state")]
    NoCountrySelected,

    /// A city was chosen before a state.
    #[error("Select a state before selecting a city")]
    NoStateSelected,
}

/// A dependent country → state → city selection.
///
/// An empty code passed to any setter clears that level and everything
/// below it.
#[derive(Debug)]
pub struct GeographyCascade<'a, C: ?Sized> {
    catalog: &'a C,
    country: Option<String>,
    state: Option<String>,
    city: Option<String>,
    states: Vec<GeoEntry>,
    cities: Vec<GeoEntry>,
}

fn contains_code(entries: &[GeoEntry], code: &str) -> bool {
    entries.iter().any(|entry| entry.code == code)
}

impl<'a, C> GeographyCascade<'a, C>
where
    C: GeographyCatalog + ?Sized,
{
    /// Start with nothing selected.
    pub const fn new(catalog: &'a C) -> Self {
        Self {
            catalog,
            country: None,
            state: None,
            city: None,
            states: Vec::new(),
            cities: Vec::new(),
        }
    }

    /// The selected country, if any.
    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    /// The selected state, if any.
    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    /// The selected city, if any.
    pub fn city(&self) -> Option<&str> {
        self.city.as_deref()
    }

    /// The countries that may be selected.
    pub fn countries(&self) -> Vec<GeoEntry> {
        self.catalog.all_countries()
    }

    /// The states valid for the selected country.
    pub fn states(&self) -> &[GeoEntry] {
        &self.states
    }

    /// The cities valid for the selected state.
    pub fn cities(&self) -> &[GeoEntry] {
        &self.cities
    }

    /// Select a country and refresh the state list.
    ///
    /// The selected state is kept only if it is also a state of the new
    /// country; otherwise state and city are cleared.
    ///
    /// # Errors
    ///
    /// Returns [`CascadeError::UnknownCountry`] if `code` is not in the
    /// catalog.
    #[instrument(level = "debug", skip(self))]
    pub fn set_country(&mut self, code: &str) -> Result<(), CascadeError> {
        if code.is_empty() {
            self.country = None;
            self.states.clear();
            self.clear_state();
            return Ok(());
        }

        if !contains_code(&self.catalog.all_countries(), code) {
            return Err(CascadeError::UnknownCountry(code.to_string()));
        }

        self.country = Some(code.to_string());
        self.states = self.catalog.states_of(code);

        match self.state.take() {
            Some(state) if contains_code(&self.states, &state) => {
                self.state = Some(state);
                self.refresh_cities();
            }
            Some(state) => {
                tracing::debug!(%state, "state not valid for new country, clearing");
                self.clear_state();
            }
            None => self.clear_state(),
        }
        Ok(())
    }

    /// Select a state of the current country and refresh the city list.
    ///
    /// The selected city is kept only if it is also a city of the new state.
    ///
    /// # Errors
    ///
    /// Returns [`CascadeError::NoCountrySelected`] if no country is selected,
    /// or [`CascadeError::UnknownState`] if `code` is not a state of it.
    #[instrument(level = "debug", skip(self))]
    pub fn set_state(&mut self, code: &str) -> Result<(), CascadeError> {
        if code.is_empty() {
            self.clear_state();
            return Ok(());
        }

        let Some(country) = self.country.as_deref() else {
            return Err(CascadeError::NoCountrySelected);
        };
        if !contains_code(&self.states, code) {
            return Err(CascadeError::UnknownState {
                country: country.to_string(),
                state: code.to_string(),
            });
        }

        self.state = Some(code.to_string());
        self.refresh_cities();
        Ok(())
    }

    /// Select a city of the current state.
    ///
    /// # Errors
    ///
    /// Returns [`CascadeError::NoStateSelected`] if no state is selected, or
    /// [`CascadeError::UnknownCity`] if `code` is not a city of it.
    #[instrument(level = "debug", skip(self))]
    pub fn set_city(&mut self, code: &str) -> Result<(), CascadeError> {
        if code.is_empty() {
            self.city = None;
            return Ok(());
        }

        let Some(state) = self.state.as_deref() else {
            return Err(CascadeError::NoStateSelected);
        };
        if !contains_code(&self.cities, code) {
            return Err(CascadeError::UnknownCity {
                state: state.to_string(),
                city: code.to_string(),
            });
        }

        self.city = Some(code.to_string());
        Ok(())
    }

    /// A search filter constrained to the current selection.
    pub fn to_filter(&self) -> SearchFilter {
        SearchFilter {
            blood_type: None,
            country: self.country.clone(),
            state: self.state.clone(),
            city: self.city.clone(),
        }
    }

    fn clear_state(&mut self) {
        self.state = None;
        self.city = None;
        self.cities.clear();
    }

    fn refresh_cities(&mut self) {
        let (Some(country), Some(state)) = (self.country.as_deref(), self.state.as_deref()) else {
            self.cities.clear();
            self.city = None;
            return;
        };
        self.cities = self.catalog.cities_of(country, state);
        if let Some(city) = self.city.take() {
            if contains_code(&self.cities, &city) {
                self.city = Some(city);
            } else {
                tracing::debug!(%city, "city not valid for new state, clearing");
            }
        }
    }
}
