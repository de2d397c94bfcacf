use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::path::Path;

use crate::models::{Division, Region};

pub fn load_regions(path: &Path) -> Result<Vec<Region>> {
    load_records(path, "regions")
}

pub fn load_divisions(path: &Path) -> Result<Vec<Division>> {
    load_records(path, "divisions")
}

fn load_records<T: DeserializeOwned>(path: &Path, what: &str) -> Result<Vec<T>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} file: {}", what, path.display()))?;

    let records: Vec<T> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {} file: {}", what, path.display()))?;

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_regions() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("regions.json");
        std::fs::write(&path, r#"[{"id": "R1", "name": "North"}, {"id": 2}]"#).unwrap();

        let regions = load_regions(&path).unwrap();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].extra.get("name").unwrap(), "North");
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let err = load_regions(&tmp.path().join("absent.json")).unwrap_err();
        assert!(err.to_string().contains("absent.json"));
    }

    #[test]
    fn test_invalid_json_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("divisions.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(load_divisions(&path).is_err());
    }

    #[test]
    fn test_region_without_id_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("regions.json");
        std::fs::write(&path, r#"[{"name": "North"}]"#).unwrap();
        assert!(load_regions(&path).is_err());
    }
}
