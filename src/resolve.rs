//! Path resolution - turning a raw reference into a canonical graph key
//!
//! Resolution is plain string concatenation: the base directory (with its
//! trailing `/`) followed by the reference exactly as written. Nothing is
//! normalized, decoded or checked against the filesystem; a reference that
//! points nowhere becomes a node whose read fails later.

use crate::edge::EdgeKind;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Directory portion of a canonical path, including the trailing `/`.
///
/// Returns an empty string for a bare file name.
pub fn containing_directory(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..=idx],
        None => "",
    }
}

/// Join a base directory and a raw reference into a canonical path.
pub fn resolve(directory: &str, raw: &str) -> String {
    format!("{}{}", directory, raw)
}

/// Canonical string key for a filesystem path. Separators become `/`.
pub fn path_key(path: &Path) -> String {
    let key = path.to_string_lossy();
    if std::path::MAIN_SEPARATOR == '/' {
        key.into_owned()
    } else {
        key.replace(std::path::MAIN_SEPARATOR, "/")
    }
}

/// Which directory a reference is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionStrategy {
    /// Directory of the file containing the reference
    #[default]
    ContainingDirectory,
    /// The project root
    ProjectBase,
}

/// One strategy per edge kind.
///
/// `require` resolves against the project root by default while every other
/// reference resolves against its own file's directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ResolutionStrategies {
    pub stylesheet: ResolutionStrategy,
    pub script: ResolutionStrategy,
    pub import: ResolutionStrategy,
    pub require: ResolutionStrategy,
}

impl Default for ResolutionStrategies {
    fn default() -> Self {
        Self {
            stylesheet: ResolutionStrategy::ContainingDirectory,
            script: ResolutionStrategy::ContainingDirectory,
            import: ResolutionStrategy::ContainingDirectory,
            require: ResolutionStrategy::ProjectBase,
        }
    }
}

impl ResolutionStrategies {
    /// Every edge kind resolves against the referencing file's directory
    pub fn uniform() -> Self {
        Self {
            require: ResolutionStrategy::ContainingDirectory,
            ..Self::default()
        }
    }

    pub fn for_edge(&self, kind: EdgeKind) -> ResolutionStrategy {
        match kind {
            EdgeKind::Stylesheet => self.stylesheet,
            EdgeKind::Script => self.script,
            EdgeKind::Import => self.import,
            EdgeKind::Require => self.require,
        }
    }
}

/// Resolves references for one project.
#[derive(Debug, Clone)]
pub struct Resolver {
    project_base: String,
    strategies: ResolutionStrategies,
}

impl Resolver {
    pub fn new(project_root: &Path, strategies: ResolutionStrategies) -> Self {
        let mut project_base = path_key(project_root);
        if !project_base.ends_with('/') {
            project_base.push('/');
        }
        Self {
            project_base,
            strategies,
        }
    }

    pub fn project_base(&self) -> &str {
        &self.project_base
    }

    /// Resolve `raw`, found in the file at `referencing`, through an edge of `kind`.
    pub fn resolve(&self, kind: EdgeKind, referencing: &str, raw: &str) -> String {
        let base = match self.strategies.for_edge(kind) {
            ResolutionStrategy::ContainingDirectory => containing_directory(referencing),
            ResolutionStrategy::ProjectBase => self.project_base.as_str(),
        };
        resolve(base, raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_containing_directory() {
        assert_eq!(containing_directory("/site/pages/index.html"), "/site/pages/");
        assert_eq!(containing_directory("/index.html"), "/");
        assert_eq!(containing_directory("index.html"), "");
    }

    #[test]
    fn test_resolve_is_plain_concatenation() {
        assert_eq!(resolve("/site/", "css/main.css"), "/site/css/main.css");
        assert_eq!(resolve("/site/pages/", "../main.css"), "/site/pages/../main.css");
        assert_eq!(resolve("/site/", "a%20b.css"), "/site/a%20b.css");
    }

    #[test]
    fn test_default_strategies_keep_require_on_project_base() {
        let resolver = Resolver::new(Path::new("/site"), ResolutionStrategies::default());
        assert_eq!(resolver.project_base(), "/site/");

        assert_eq!(
            resolver.resolve(EdgeKind::Import, "/site/css/main.css", "base.css"),
            "/site/css/base.css"
        );
        assert_eq!(
            resolver.resolve(EdgeKind::Script, "/site/pages/index.html", "app.js"),
            "/site/pages/app.js"
        );
        assert_eq!(
            resolver.resolve(EdgeKind::Require, "/site/js/lib/app.js", "util.js"),
            "/site/util.js"
        );
    }

    #[test]
    fn test_uniform_strategies() {
        let resolver = Resolver::new(Path::new("/site/"), ResolutionStrategies::uniform());
        assert_eq!(
            resolver.resolve(EdgeKind::Require, "/site/js/app.js", "util.js"),
            "/site/js/util.js"
        );
    }

    #[test]
    fn test_strategies_from_toml() {
        let strategies: ResolutionStrategies =
            toml::from_str("require = \"containing-directory\"\nimport = \"project-base\"").unwrap();
        assert_eq!(strategies.require, ResolutionStrategy::ContainingDirectory);
        assert_eq!(strategies.import, ResolutionStrategy::ProjectBase);
        assert_eq!(strategies.stylesheet, ResolutionStrategy::ContainingDirectory);
    }
}
