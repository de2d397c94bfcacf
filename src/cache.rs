//! Content-addressed geoshape cache.
//!
//! One JSON file per distinct source URL, named by the URL's cache key.
//! File existence is authoritative: a present entry is never re-fetched,
//! refreshed, or validated.

use anyhow::{Context, Result};
use std::path::PathBuf;

pub struct GeoshapeCache {
    dir: PathBuf,
}

impl GeoshapeCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the entry for a cache key.
    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entry_path(key).exists()
    }

    /// Write an entry, creating the cache directory on first use.
    pub fn store(&self, key: &str, payload: &[u8]) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create geoshape directory: {}", self.dir.display()))?;
        let path = self.entry_path(key);
        std::fs::write(&path, payload)
            .with_context(|| format!("Failed to write geoshape entry: {}", path.display()))?;
        Ok(())
    }
}
