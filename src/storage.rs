//! File-backed adapters for the donor pool, geography catalog and user
//! profile.
//!
//! Documents may be JSON or YAML; the format follows the file extension.

mod catalog;
pub use catalog::{load_catalog, CatalogError};

mod document;
pub use document::DocumentError;

mod pool;
pub use pool::{fetch_and_search, DonorPoolProvider, PoolFetchError, PoolFile};

mod profile;
pub use profile::{ProfileError, ProfileFile};
