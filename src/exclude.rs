use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::Path;

pub struct ExcludeFilter {
    inner: Gitignore,
}

impl ExcludeFilter {
    pub fn new(root: &Path, extra_excludes: Option<&[String]>) -> Self {
        let mut builder = GitignoreBuilder::new(root);

        // Defaults: directories that never hold project pages
        let defaults = [
            ".git/", ".svn/", ".hg/", ".assetgraph/", ".vscode/", ".idea/",
            "node_modules/", "bower_components/", "target/", "coverage/",
        ];

        for pattern in defaults {
            // We ignore errors here as these correspond to static valid patterns
            builder.add_line(None, pattern).ok();
        }

        for name in [".gitignore", ".ignore"] {
            let file = root.join(name);
            if file.is_file() {
                if let Some(e) = builder.add(&file) {
                    tracing::warn!("Failed to load {}: {}", file.display(), e);
                }
            }
        }

        if let Some(excludes) = extra_excludes {
            for pattern in excludes {
                if let Err(e) = builder.add_line(None, pattern) {
                    tracing::warn!("Ignoring invalid exclude pattern {:?}: {}", pattern, e);
                }
            }
        }

        Self {
            inner: builder.build().unwrap_or_else(|_| Gitignore::empty()),
        }
    }

    pub fn is_excluded(&self, path: &Path, is_dir: bool) -> bool {
        self.inner.matched(path, is_dir).is_ignore()
    }

    /// Whether a file, or any directory above it, is excluded.
    /// Paths outside the root are never excluded.
    pub fn is_excluded_file(&self, path: &Path) -> bool {
        if !path.starts_with(self.inner.path()) {
            return false;
        }
        self.inner
            .matched_path_or_any_parents(path, false)
            .is_ignore()
    }
}
