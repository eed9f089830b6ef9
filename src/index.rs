//! File indexing - the list of markup files a build starts from

use crate::exclude::ExcludeFilter;
use crate::resolve::path_key;
use crate::{Error, Result};
use ignore::WalkBuilder;
use serde::Serialize;
use std::path::Path;

/// A file found by an indexer
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct IndexedFile {
    /// Canonical path, used as the node key
    pub full_path: String,
    /// Bare file name
    pub name: String,
}

impl IndexedFile {
    pub fn new(full_path: impl Into<String>) -> Self {
        let full_path = full_path.into();
        let name = full_path.rsplit('/').next().unwrap_or(&full_path).to_string();
        Self { full_path, name }
    }
}

/// Lists the files of a project
pub trait FileIndexer: Send + Sync {
    /// Every file under `root` whose extension is `extension` (no leading dot)
    fn list_files(&self, root: &Path, extension: &str) -> Result<Vec<IndexedFile>>;
}

/// Indexer that walks the project directory.
///
/// Honors `.gitignore` and `.ignore` files, skips hidden entries and the
/// default noise directories, plus any configured exclude patterns.
#[derive(Debug, Clone, Default)]
pub struct WalkIndexer {
    excludes: Vec<String>,
}

impl WalkIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_excludes(excludes: Vec<String>) -> Self {
        Self { excludes }
    }
}

impl FileIndexer for WalkIndexer {
    fn list_files(&self, root: &Path, extension: &str) -> Result<Vec<IndexedFile>> {
        if !root.is_dir() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("project root {} is not a directory", root.display()),
            )));
        }

        let filter = ExcludeFilter::new(root, Some(self.excludes.as_slice()));
        let walker = WalkBuilder::new(root)
            .standard_filters(true)
            .require_git(false)
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                !filter.is_excluded(entry.path(), is_dir)
            })
            .build();

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let path = entry.path();
            let matches = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
            if !matches {
                continue;
            }
            files.push(IndexedFile {
                full_path: path_key(path),
                name: entry.file_name().to_string_lossy().into_owned(),
            });
        }

        files.sort();
        tracing::debug!("Indexed {} .{} files under {}", files.len(), extension, root.display());
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_indexed_file_name() {
        let file = IndexedFile::new("/site/pages/about.html");
        assert_eq!(file.name, "about.html");
        assert_eq!(IndexedFile::new("bare.html").name, "bare.html");
    }

    #[test]
    fn test_walk_lists_matching_extension() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("pages/nested")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::write(root.join("index.html"), "").unwrap();
        fs::write(root.join("pages/about.HTML"), "").unwrap();
        fs::write(root.join("pages/nested/deep.html"), "").unwrap();
        fs::write(root.join("pages/style.css"), "").unwrap();
        fs::write(root.join("node_modules/pkg/readme.html"), "").unwrap();

        let files = WalkIndexer::new().list_files(root, "html").unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(files.len(), 3, "got {:?}", names);
        assert!(names.contains(&"index.html"));
        assert!(names.contains(&"about.HTML"));
        assert!(names.contains(&"deep.html"));
        assert!(files.iter().all(|f| f.full_path.ends_with(&f.name)));
    }

    #[test]
    fn test_walk_honors_gitignore_and_excludes() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("build")).unwrap();
        fs::create_dir_all(root.join("drafts")).unwrap();
        fs::write(root.join(".gitignore"), "build/\n").unwrap();
        fs::write(root.join("index.html"), "").unwrap();
        fs::write(root.join("build/out.html"), "").unwrap();
        fs::write(root.join("drafts/wip.html"), "").unwrap();

        let indexer = WalkIndexer::with_excludes(vec!["drafts/".to_string()]);
        let files = indexer.list_files(root, "html").unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "index.html");
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = WalkIndexer::new().list_files(&dir.path().join("nope"), "html");
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
