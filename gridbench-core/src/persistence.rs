//! Atomic JSON persistence for result files.

use std::io;
use std::path::Path;

/// Atomically write JSON data to a file.
///
/// Writes pretty-printed JSON to a `.tmp` sibling, then renames it over the
/// target. Parent directories are created as needed.
pub fn atomic_write_json<T: serde::Serialize>(path: &Path, data: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(data).map_err(io::Error::other)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, json.as_bytes())?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Load and deserialize JSON from a file.
pub fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> io::Result<T> {
    let data = std::fs::read_to_string(path)?;
    serde_json::from_str(&data).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Row {
        name: String,
        score: f64,
    }

    #[test]
    fn test_roundtrip_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("row.json");
        let row = Row {
            name: "ed-1nn".into(),
            score: 0.9,
        };
        atomic_write_json(&path, &row).unwrap();
        assert!(!path.with_extension("tmp").exists());
        let loaded: Row = load_json(&path).unwrap();
        assert_eq!(loaded, row);
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = load_json::<Row>(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
