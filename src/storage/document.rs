//! Reading and writing JSON or YAML documents.
//!
//! The format is chosen from the file extension: `.json` is JSON, anything
//! else is YAML (which also accepts plain JSON).

use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    path::Path,
};

use serde::{de::DeserializeOwned, Serialize};

/// Errors from loading or saving a document.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// The file was not found.
    #[error("file not found")]
    NotFound,
    /// An I/O error occurred.
    #[error(transparent)]
    Io(io::Error),
    /// The JSON content could not be parsed or produced.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// The YAML content could not be parsed or produced.
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl From<io::Error> for DocumentError {
    fn from(error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound,
            _ => Self::Io(error),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Yaml,
}

impl Format {
    fn of(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

pub(crate) fn read<T: DeserializeOwned>(path: &Path) -> Result<T, DocumentError> {
    let reader = BufReader::new(File::open(path)?);
    let value = match Format::of(path) {
        Format::Json => serde_json::from_reader(reader)?,
        Format::Yaml => serde_yaml::from_reader(reader)?,
    };
    Ok(value)
}

pub(crate) fn write<T: Serialize>(path: &Path, value: &T) -> Result<(), DocumentError> {
    let mut writer = BufWriter::new(File::create(path)?);
    match Format::of(path) {
        Format::Json => {
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.write_all(b"\n")?;
        }
        Format::Yaml => serde_yaml::to_writer(&mut writer, value)?,
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn format_from_extension() {
        assert_eq!(Format::of(Path::new("pool.json")), Format::Json);
        assert_eq!(Format::of(Path::new("pool.JSON")), Format::Json);
        assert_eq!(Format::of(Path::new("pool.yaml")), Format::Yaml);
        assert_eq!(Format::of(Path::new("pool")), Format::Yaml);
    }

    #[test]
    fn write_then_read_both_formats() {
        let tmp = tempfile::tempdir().unwrap();
        let value = BTreeMap::from([("a".to_string(), 1), ("b".to_string(), 2)]);

        for name in ["doc.json", "doc.yaml"] {
            let path = tmp.path().join(name);
            write(&path, &value).unwrap();
            let read_back: BTreeMap<String, i32> = read(&path).unwrap();
            assert_eq!(read_back, value);
        }
    }

    #[test]
    fn missing_file_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let result: Result<Vec<String>, _> = read(&tmp.path().join("missing.yaml"));
        assert!(matches!(result, Err(DocumentError::NotFound)));
    }
}
