use std::path::{Path, PathBuf};

use tracing::instrument;

use super::document::{self, DocumentError};
use crate::domain::{
    eligibility::{parse_date_of_birth, EligibilityError},
    ProfileUpdate, ProfileUpdateSink, UserProfile,
};

/// Errors from reading or updating a stored user profile.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    /// The profile document could not be read.
    #[error("Failed to load profile from {}: {source}", .path.display())]
    Load {
        /// File that was being read.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: DocumentError,
    },

    /// The profile document could not be written.
    #[error("Failed to save profile to {}: {source}", .path.display())]
    Save {
        /// File that was being written.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: DocumentError,
    },

    /// The update supplied an unusable date of birth.
    #[error(transparent)]
    DateOfBirth(#[from] EligibilityError),

    /// The update would leave a state without a country or a city without
    /// a state.
    #[error("A state needs a country and a city needs a state")]
    OrphanedLocation,

    /// The update contained no changes.
    #[error("Nothing to update")]
    EmptyUpdate,
}

/// A user profile stored in a single JSON or YAML document.
#[derive(Debug)]
pub struct ProfileFile {
    path: PathBuf,
    profile: UserProfile,
}

impl ProfileFile {
    /// Read the profile at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or malformed.
    #[instrument(level = "debug")]
    pub fn open(path: &Path) -> Result<Self, ProfileError> {
        let profile = document::read(path).map_err(|source| ProfileError::Load {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            profile,
        })
    }

    /// The profile as last read or written.
    #[must_use]
    pub const fn profile(&self) -> &UserProfile {
        &self.profile
    }

    /// The backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<(), ProfileError> {
        document::write(&self.path, &self.profile).map_err(|source| ProfileError::Save {
            path: self.path.clone(),
            source,
        })
    }
}

impl ProfileUpdateSink for ProfileFile {
    type Error = ProfileError;

    /// Validate and apply `update`, then write the profile back.
    ///
    /// The stored file is untouched if validation fails, including when the
    /// result would leave the location without its parent level.
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    fn submit(&mut self, update: ProfileUpdate) -> Result<UserProfile, Self::Error> {
        if update.is_empty() {
            return Err(ProfileError::EmptyUpdate);
        }
        if let Some(dob) = &update.date_of_birth {
            parse_date_of_birth(dob)?;
        }

        let mut updated = self.profile.clone();
        updated.apply(update);
        if updated.has_orphaned_location() {
            return Err(ProfileError::OrphanedLocation);
        }
        let previous = std::mem::replace(&mut self.profile, updated);

        if let Err(e) = self.save() {
            self.profile = previous;
            return Err(e);
        }

        tracing::info!("Updated profile {}", self.path.display());
        Ok(self.profile.clone())
    }
}
