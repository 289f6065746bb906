use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::Value;

use catalogue_common::error::{CatalogueError, Result};

/// Writes connector payloads to a deterministic on-disk path and reads them
/// back. Filesystem side effects only — no database interaction.
///
/// Layout: `<root>/<source>/<YYYYMMDD>_<record_id>.json`, pretty-printed
/// UTF-8 JSON. The timestamp groups files chronologically; `record_id`
/// (typically a source-specific short identifier plus the first 8 hex
/// chars of the content hash) disambiguates within a day.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn source_dir(&self, source: &str) -> PathBuf {
        self.root.join(source)
    }

    pub fn file_path(&self, source: &str, record_id: &str) -> PathBuf {
        let timestamp = Utc::now().format("%Y%m%d");
        self.source_dir(source)
            .join(format!("{timestamp}_{record_id}.json"))
    }

    /// Write `payload` as indented JSON under the deterministic path for
    /// `(source, record_id)`. Creates directories as needed. Overwriting an
    /// existing file is permitted — upstream hashing already guarantees the
    /// content is identical whenever the path collides.
    pub fn store(&self, source: &str, record_id: &str, payload: &Value) -> Result<PathBuf> {
        let path = self.file_path(source, record_id);
        self.store_at(&path, payload)?;
        Ok(path)
    }

    fn store_at(&self, path: &Path, payload: &Value) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .map_err(|e| CatalogueError::Anyhow(e.into()))?;
        }
        let pretty = serde_json::to_string_pretty(payload)
            .map_err(|e| CatalogueError::Anyhow(e.into()))?;
        std::fs::write(path, pretty).map_err(|e| CatalogueError::Anyhow(e.into()))?;
        Ok(())
    }

    pub fn load(&self, file_path: &Path) -> Result<Value> {
        let raw = std::fs::read_to_string(file_path).map_err(|e| CatalogueError::Anyhow(e.into()))?;
        serde_json::from_str(&raw).map_err(|e| CatalogueError::Anyhow(e.into()))
    }
}
