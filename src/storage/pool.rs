//! Donor pool providers.

use std::{
    error::Error,
    path::{Path, PathBuf},
};

use tracing::instrument;

use super::document::{self, DocumentError};
use crate::domain::{search, DonorProfile, SearchFilter, SearchResult};

/// A failure to retrieve the donor pool.
///
/// This is distinct from a successful retrieval that matches no donors.
#[derive(Debug, thiserror::Error)]
#[error("Failed to fetch donor pool from {origin}: {source}")]
pub struct PoolFetchError {
    origin: String,
    #[source]
    source: Box<dyn Error + Send + Sync + 'static>,
}

impl PoolFetchError {
    /// Wrap a provider-specific failure.
    pub fn new(
        origin: impl Into<String>,
        source: impl Into<Box<dyn Error + Send + Sync + 'static>>,
    ) -> Self {
        Self {
            origin: origin.into(),
            source: source.into(),
        }
    }

    /// Where the pool was being fetched from.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }
}

/// Something that can supply donor profiles.
///
/// Providers may pre-filter by `filter`, or ignore it and return everyone.
/// [`fetch_and_search`] filters again either way.
pub trait DonorPoolProvider {
    /// Fetch the donors, optionally narrowed by `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolFetchError`] if the donors cannot be retrieved.
    fn fetch(&self, filter: &SearchFilter) -> Result<Vec<DonorProfile>, PoolFetchError>;
}

impl DonorPoolProvider for [DonorProfile] {
    fn fetch(&self, _filter: &SearchFilter) -> Result<Vec<DonorProfile>, PoolFetchError> {
        Ok(self.to_vec())
    }
}

/// A donor pool stored as a JSON or YAML list of profiles.
#[derive(Debug, Clone)]
pub struct PoolFile {
    path: PathBuf,
}

impl PoolFile {
    /// A pool backed by the file at `path`.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// The backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DonorPoolProvider for PoolFile {
    #[instrument(level = "debug", skip(self, _filter), fields(path = %self.path.display()))]
    fn fetch(&self, _filter: &SearchFilter) -> Result<Vec<DonorProfile>, PoolFetchError> {
        let donors: Vec<DonorProfile> = document::read(&self.path).map_err(|e| match e {
            DocumentError::NotFound => PoolFetchError::new(
                self.path.display().to_string(),
                format!("{} does not exist", self.path.display()),
            ),
            other => PoolFetchError::new(self.path.display().to_string(), other),
        })?;
        tracing::info!("Loaded {} donors from {}", donors.len(), self.path.display());
        Ok(donors)
    }
}

/// Fetch a pool and search it.
///
/// # Errors
///
/// Returns [`PoolFetchError`] if the provider fails. An empty result is not
/// an error.
pub fn fetch_and_search<P>(
    provider: &P,
    filter: &SearchFilter,
) -> Result<SearchResult, PoolFetchError>
where
    P: DonorPoolProvider + ?Sized,
{
    let pool = provider.fetch(filter)?;
    Ok(search(filter, &pool))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::domain::BloodType;

    struct Offline;

    impl DonorPoolProvider for Offline {
        fn fetch(&self, _filter: &SearchFilter) -> Result<Vec<DonorProfile>, PoolFetchError> {
            Err(PoolFetchError::new("https://donors.invalid", "connection refused"))
        }
    }

    #[test]
    fn reads_json_pool() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(
            br#"[
                {"id": 1, "bloodType": "A+", "country": "IN", "isAvailable": true},
                {"id": 2, "bloodType": "A+", "country": "IN", "isAvailable": false},
                {"id": 3, "bloodType": "B+", "country": "IN", "isAvailable": true}
            ]"#,
        )
        .unwrap();

        let pool = PoolFile::new(file.path().to_path_buf());
        let filter = SearchFilter::new()
            .with_blood_type(BloodType::APos)
            .with_country("IN");
        let result = fetch_and_search(&pool, &filter).unwrap();

        assert_eq!(result.available.len(), 1);
        assert_eq!(result.available[0].id, "1");
        assert_eq!(result.unavailable[0].id, "2");
    }

    #[test]
    fn reads_yaml_pool() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(
            b"- id: d1\n  bloodType: O-\n  country: US\n  state: CA\n  isAvailable: true\n",
        )
        .unwrap();

        let donors = PoolFile::new(file.path().to_path_buf())
            .fetch(&SearchFilter::new())
            .unwrap();
        assert_eq!(donors.len(), 1);
        assert_eq!(donors[0].blood_type, BloodType::ONeg);
    }

    #[test]
    fn missing_pool_is_a_fetch_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let pool = PoolFile::new(tmp.path().join("donors.json"));
        let error = fetch_and_search(&pool, &SearchFilter::new()).unwrap_err();
        assert!(error.to_string().contains("does not exist"));
    }

    #[test]
    fn invalid_blood_type_in_pool_is_a_fetch_failure() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(br#"[{"id": 1, "bloodType": "Q+"}]"#).unwrap();

        let error = PoolFile::new(file.path().to_path_buf())
            .fetch(&SearchFilter::new())
            .unwrap_err();
        assert!(error.source().unwrap().to_string().contains("Invalid blood type"));
    }

    #[test]
    fn provider_failure_is_distinct_from_empty_result() {
        let error = fetch_and_search(&Offline, &SearchFilter::new()).unwrap_err();
        assert_eq!(error.origin(), "https://donors.invalid");

        let empty: &[DonorProfile] = &[];
        let result = fetch_and_search(empty, &SearchFilter::new()).unwrap();
        assert!(result.is_empty());
    }
}
