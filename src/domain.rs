//! Domain models for blood donation matching.
//!
//! This module contains the blood type compatibility relation, donor
//! eligibility classification, geography cascades and donor search. All of it
//! is pure: callers supply the data and the current time.

/// ABO/Rh blood types and sets of them.
pub mod blood_type;
pub use blood_type::{BloodType, BloodTypeSet, InvalidBloodType};

/// The fixed donation/reception compatibility relation.
pub mod compatibility;
pub use compatibility::{Classification, CompatibilityTable, DonorClass, ReceiverClass};

mod config;
pub use config::{Config, ConfigError, InvalidConfig};

/// Eligibility from date of birth and signup reason.
pub mod eligibility;
pub use eligibility::{
    EligibilityClassifier, EligibilityError, EligibilityPolicy, EligibilityState, Remaining,
    SignupReason,
};

pub mod geography;
pub use geography::{CascadeError, GeoEntry, GeographyCascade, GeographyCatalog, StaticCatalog};

/// Donor and user profiles.
pub mod profile;
pub use profile::{DonorProfile, ProfileField, ProfileUpdate, ProfileUpdateSink, UserProfile};

/// Donor search and request sequencing.
pub mod search;
pub use search::{
    search, search_compatible, SearchFilter, SearchResult, SearchSequencer, SearchTicket,
};
