//! Canonical chunk-id to metadata table.
//!
//! Lets the graph retrieval path resolve metadata for chunk ids that did not
//! surface through either vector index.

use super::RecordMetadata;
use crate::error::{BlikkError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Default, Serialize, Deserialize)]
struct CatalogDocument {
    chunks: HashMap<Uuid, RecordMetadata>,
}

/// JSON-document-backed chunk metadata table.
pub struct ChunkCatalog {
    path: Option<PathBuf>,
    chunks: HashMap<Uuid, RecordMetadata>,
}

impl ChunkCatalog {
    /// Open the catalog, loading the existing document if present.
    pub fn open(path: &Path) -> Result<Self> {
        let chunks = if path.exists() {
            let content = std::fs::read_to_string(path)
                .map_err(|e| BlikkError::Storage(format!("reading {}: {e}", path.display())))?;
            let doc: CatalogDocument = serde_json::from_str(&content)
                .map_err(|e| BlikkError::Storage(format!("parsing {}: {e}", path.display())))?;
            doc.chunks
        } else {
            HashMap::new()
        };

        Ok(Self {
            path: Some(path.to_path_buf()),
            chunks,
        })
    }

    /// Create a catalog with no backing document (used in tests).
    pub fn in_memory() -> Self {
        Self {
            path: None,
            chunks: HashMap::new(),
        }
    }

    /// Insert or replace one chunk's metadata and persist.
    pub fn insert(&mut self, id: Uuid, metadata: RecordMetadata) -> Result<()> {
        self.chunks.insert(id, metadata);
        self.save()
    }

    /// Look up a chunk's metadata.
    pub fn get(&self, id: &Uuid) -> Option<&RecordMetadata> {
        self.chunks.get(id)
    }

    /// Number of catalogued chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| BlikkError::Storage(format!("creating {}: {e}", parent.display())))?;
        }

        let doc = CatalogDocument {
            chunks: self.chunks.clone(),
        };
        let content = serde_json::to_string(&doc)?;
        std::fs::write(path, content)
            .map_err(|e| BlikkError::Storage(format!("writing {}: {e}", path.display())))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(start: f64) -> RecordMetadata {
        RecordMetadata {
            text: format!("chunk at {start}"),
            start,
            end: start + 30.0,
        }
    }

    #[test]
    fn test_insert_and_get() {
        let mut catalog = ChunkCatalog::in_memory();
        let id = Uuid::new_v4();

        catalog.insert(id, meta(60.0)).unwrap();

        assert_eq!(catalog.get(&id).unwrap().start, 60.0);
        assert!(catalog.get(&Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_insert_replaces() {
        let mut catalog = ChunkCatalog::in_memory();
        let id = Uuid::new_v4();

        catalog.insert(id, meta(0.0)).unwrap();
        catalog.insert(id, meta(30.0)).unwrap();

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(&id).unwrap().start, 30.0);
    }

    #[test]
    fn test_persistence_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chunk_catalog.json");
        let id = Uuid::new_v4();

        {
            let mut catalog = ChunkCatalog::open(&path).unwrap();
            catalog.insert(id, meta(90.0)).unwrap();
        }

        let reloaded = ChunkCatalog::open(&path).unwrap();
        assert_eq!(reloaded.get(&id).unwrap().start, 90.0);
    }
}
