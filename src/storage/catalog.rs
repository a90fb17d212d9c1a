use std::path::Path;

use tracing::instrument;

use super::document::{self, DocumentError};
use crate::domain::StaticCatalog;

/// Errors from loading a geography catalog.
#[derive(Debug, thiserror::Error)]
#[error("Failed to load geography catalog from {path}: {source}")]
pub struct CatalogError {
    path: String,
    #[source]
    source: DocumentError,
}

/// Load a nested country/state/city catalog from a JSON or YAML file.
///
/// # Errors
///
/// Returns an error if the file is missing or malformed.
#[instrument(level = "debug")]
pub fn load_catalog(path: &Path) -> Result<StaticCatalog, CatalogError> {
    let catalog: StaticCatalog = document::read(path).map_err(|source| CatalogError {
        path: path.display().to_string(),
        source,
    })?;
    tracing::info!(
        "Loaded {} countries from {}",
        catalog.countries.len(),
        path.display()
    );
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::domain::{GeographyCascade, GeographyCatalog};

    const CATALOG: &str = "\
countries:
  - code: IN
    name: India
    states:
      - code: KA
        name: Karnataka
        cities:
          - code: BLR
            name: Bengaluru
  - code: NP
    name: Nepal
";

    #[test]
    fn loads_yaml_catalog() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(CATALOG.as_bytes()).unwrap();

        let catalog = load_catalog(file.path()).unwrap();
        assert_eq!(catalog.all_countries().len(), 2);
        assert!(catalog.states_of("NP").is_empty());

        let mut cascade = GeographyCascade::new(&catalog);
        cascade.set_country("IN").unwrap();
        cascade.set_state("KA").unwrap();
        cascade.set_city("BLR").unwrap();
        assert_eq!(cascade.city(), Some("BLR"));
    }

    #[test]
    fn missing_catalog_names_the_path() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("geo.yaml");

        let error = load_catalog(&path).unwrap_err();
        assert!(matches!(error.source, DocumentError::NotFound));
        assert!(error.to_string().contains("geo.yaml"));
    }
}
