use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use super::{blood_type::BloodType, eligibility::SignupReason};

/// A donor as supplied by the donor pool provider.
///
/// Location fields are free-form codes or names and are compared exactly.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorProfile {
    /// Identifier assigned by the provider.
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,

    /// Display name, if the provider shares one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Recorded blood type.
    #[serde(default)]
    pub blood_type: BloodType,

    /// Country code or name.
    #[serde(default)]
    pub country: String,

    /// State code or name.
    #[serde(default)]
    pub state: String,

    /// City code or name.
    #[serde(default)]
    pub city: String,

    /// Whether the donor is currently available.
    ///
    /// `None` means the donor never answered.
    #[serde(default)]
    pub is_available: Option<bool>,

    /// Self-described gender.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

/// Providers send ids as either JSON strings or integers.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(text) => text,
        Id::Number(number) => number.to_string(),
    })
}

/// The signed-in user's own profile, as passed in by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Identifier assigned by the account service.
    #[serde(default)]
    pub id: String,

    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Recorded blood type.
    #[serde(default)]
    pub blood_type: BloodType,

    /// Date of birth exactly as stored; parsed on every evaluation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,

    /// Reason given at signup.
    #[serde(default)]
    pub signup_reason: SignupReason,

    /// Country code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    /// State code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// City code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    /// Self-described gender.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

/// A profile field the user must complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    /// No date of birth, so eligibility cannot be decided.
    DateOfBirth,
    /// Blood type not recorded, so the user cannot be matched.
    BloodType,
    /// No country, so the user cannot be located.
    Country,
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::DateOfBirth => "date of birth",
            Self::BloodType => "blood type",
            Self::Country => "country",
        })
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

impl UserProfile {
    /// The fields that must be filled in before the profile is complete.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<ProfileField> {
        let mut missing = Vec::new();
        if is_blank(self.date_of_birth.as_deref()) {
            missing.push(ProfileField::DateOfBirth);
        }
        if !self.blood_type.is_canonical() {
            missing.push(ProfileField::BloodType);
        }
        if is_blank(self.country.as_deref()) {
            missing.push(ProfileField::Country);
        }
        missing
    }

    /// Whether a state is set without a country, or a city without a state.
    #[must_use]
    pub fn has_orphaned_location(&self) -> bool {
        let country = !is_blank(self.country.as_deref());
        let state = !is_blank(self.state.as_deref());
        let city = !is_blank(self.city.as_deref());
        (state && !country) || (city && !state)
    }

    /// Apply a correction to this profile.
    ///
    /// Fields absent from the update are left unchanged. Changing the
    /// country clears state and city unless the update also supplies them;
    /// changing the state clears the city likewise.
    pub fn apply(&mut self, update: ProfileUpdate) {
        if let Some(blood_type) = update.blood_type {
            self.blood_type = blood_type;
        }
        if let Some(dob) = update.date_of_birth {
            self.date_of_birth = Some(dob);
        }
        if let Some(country) = update.country {
            if self.country.as_ref() != Some(&country) {
                self.state = None;
                self.city = None;
            }
            self.country = Some(country);
        }
        if let Some(state) = update.state {
            if self.state.as_ref() != Some(&state) {
                self.city = None;
            }
            self.state = Some(state);
        }
        if let Some(city) = update.city {
            self.city = Some(city);
        }
    }
}

/// A correction submitted to move a profile out of an incomplete state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProfileUpdate {
    /// New blood type.
    pub blood_type: Option<BloodType>,
    /// New date of birth, in a format accepted by
    /// [`parse_date_of_birth`](crate::domain::eligibility::parse_date_of_birth).
    pub date_of_birth: Option<String>,
    /// New country.
    pub country: Option<String>,
    /// New state.
    pub state: Option<String>,
    /// New city.
    pub city: Option<String>,
}

impl ProfileUpdate {
    /// Returns `true` if the update changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.blood_type.is_none()
            && self.date_of_birth.is_none()
            && self.country.is_none()
            && self.state.is_none()
            && self.city.is_none()
    }
}

/// Somewhere profile corrections are persisted.
///
/// This crate decides *that* a profile needs updating; implementations decide
/// how the update is stored.
pub trait ProfileUpdateSink {
    /// The error returned when an update cannot be stored.
    type Error;

    /// Persist `update` and return the resulting profile.
    ///
    /// # Errors
    ///
    /// Implementation defined.
    fn submit(&mut self, update: ProfileUpdate) -> Result<UserProfile, Self::Error>;
}
