//! Blood-donation matching.
//!
//! Blood-type compatibility lookups, donor eligibility classification with a
//! live under-age countdown, cascading geography selection, and donor search
//! over a pool of profiles.

pub mod domain;
pub use domain::{
    BloodType, BloodTypeSet, CompatibilityTable, Config, DonorProfile, EligibilityClassifier,
    EligibilityState, GeographyCascade, SearchFilter, SearchResult, UserProfile,
};

/// Background recomputation of the under-age countdown.
pub mod countdown;
pub use countdown::{Countdown, CountdownHandle};

/// File-backed adapters for donor pools, catalogs and profiles.
pub mod storage;
pub use storage::{fetch_and_search, DonorPoolProvider, PoolFetchError, PoolFile, ProfileFile};
