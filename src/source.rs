//! File access - reading a node's text
//!
//! The scanner only ever asks for the whole text of a file by its canonical
//! path. `DiskSource` reads from the filesystem; `MemorySource` serves a
//! fixed set of files and also acts as their indexer, which is what tests
//! and embedding hosts use.

use crate::index::{FileIndexer, IndexedFile};
use crate::resolve::path_key;
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::RwLock;

/// Asynchronous text access by canonical path
#[async_trait]
pub trait FileSource: Send + Sync {
    async fn read_text(&self, path: &str) -> Result<String>;
}

/// Reads files from disk with tokio.
///
/// Bytes that are not valid UTF-8 are replaced rather than failing the read,
/// so one stray Latin-1 byte does not hide the rest of the file.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskSource;

impl DiskSource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FileSource for DiskSource {
    async fn read_text(&self, path: &str) -> Result<String> {
        let bytes = tokio::fs::read(path).await.map_err(|source| Error::Read {
            path: path.to_string(),
            source,
        })?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// In-memory project: a map from canonical path to text
#[derive(Debug, Default)]
pub struct MemorySource {
    files: RwLock<BTreeMap<String, String>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(path, text)` pairs
    pub fn with_files<P, T>(files: impl IntoIterator<Item = (P, T)>) -> Self
    where
        P: Into<String>,
        T: Into<String>,
    {
        let source = Self::new();
        for (path, text) in files {
            source.insert(path, text);
        }
        source
    }

    pub fn insert(&self, path: impl Into<String>, text: impl Into<String>) {
        self.files
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(path.into(), text.into());
    }

    pub fn remove(&self, path: &str) -> Option<String> {
        self.files
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(path)
    }

    fn get(&self, path: &str) -> Option<String> {
        self.files
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(path)
            .cloned()
    }
}

#[async_trait]
impl FileSource for MemorySource {
    async fn read_text(&self, path: &str) -> Result<String> {
        self.get(path).ok_or_else(|| Error::Read {
            path: path.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        })
    }
}

impl FileIndexer for MemorySource {
    fn list_files(&self, root: &Path, extension: &str) -> Result<Vec<IndexedFile>> {
        let mut prefix = path_key(root);
        if !prefix.ends_with('/') {
            prefix.push('/');
        }
        let suffix = format!(".{}", extension.to_lowercase());
        let files = self
            .files
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .keys()
            .filter(|path| path.starts_with(&prefix) && path.to_lowercase().ends_with(&suffix))
            .map(|path| IndexedFile::new(path.clone()))
            .collect();
        Ok(files)
    }
}
