//! Rebuild on change
//!
//! Filesystem events under the project root are batched for a short quiet
//! period, narrowed to markup, style and script files outside the excluded
//! directories, then checked against a content hash so that saving an
//! unchanged file does not trigger a rebuild.

use crate::build::{BuildOutcome, ProjectEvent, ProjectMap};
use crate::exclude::ExcludeFilter;
use crate::graph::Graph;
use crate::kind::NodeKind;
use crate::Result;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

/// Remembers the last seen content hash of every file
#[derive(Debug, Default)]
pub struct ChangeFilter {
    hashes: HashMap<PathBuf, blake3::Hash>,
}

impl ChangeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current content of every file in the graph
    pub async fn prime(&mut self, graph: &Graph) {
        for kind in NodeKind::all() {
            for path in graph.paths(*kind) {
                let path = PathBuf::from(path);
                if let Ok(bytes) = tokio::fs::read(&path).await {
                    self.hashes.insert(path, blake3::hash(&bytes));
                }
            }
        }
    }

    /// Whether `path` differs from when it was last seen.
    /// A file that can no longer be read counts as changed.
    pub async fn changed(&mut self, path: &Path) -> bool {
        match tokio::fs::read(path).await {
            Ok(bytes) => {
                let hash = blake3::hash(&bytes);
                self.hashes.insert(path.to_path_buf(), hash) != Some(hash)
            }
            Err(_) => {
                self.hashes.remove(path);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

pub struct Watcher {
    root: PathBuf,
    debounce: Duration,
    excludes: ExcludeFilter,
    filter: ChangeFilter,
}

impl Watcher {
    pub fn new(root: PathBuf, exclude: &[String]) -> Self {
        let excludes = ExcludeFilter::new(&root, Some(exclude));
        Self {
            root,
            debounce: DEFAULT_DEBOUNCE,
            excludes,
            filter: ChangeFilter::new(),
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Files that can be part of the graph
    pub fn is_relevant(&self, path: &Path) -> bool {
        NodeKind::from_path(path).is_some() && !self.excludes.is_excluded_file(path)
    }

    /// Watch the root until the event stream closes, rebuilding `map` after
    /// every batch of real changes and handing each result to `on_build`.
    pub async fn run<F>(&mut self, map: &ProjectMap, mut on_build: F) -> Result<()>
    where
        F: FnMut(Result<BuildOutcome>),
    {
        let (tx, mut rx) = unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |res| {
                // receiver gone means we are shutting down
                let _ = tx.send(res);
            },
            Config::default(),
        )?;
        watcher.watch(&self.root, RecursiveMode::Recursive)?;
        tracing::info!("Watching for changes in {}", self.root.display());

        if let Some(graph) = map.graph() {
            self.filter.prime(&graph).await;
        }

        while let Some(batch) = next_batch(&mut rx, self.debounce).await {
            let mut changed = Vec::new();
            for path in batch {
                if self.is_relevant(&path) && self.filter.changed(&path).await {
                    changed.push(path);
                }
            }
            if changed.is_empty() {
                continue;
            }

            for path in &changed {
                tracing::debug!("Changed: {}", path.display());
            }
            let outcome = map.handle_event(ProjectEvent::Changed(changed)).await;
            if let Ok(outcome) = &outcome {
                self.filter.prime(&outcome.graph).await;
            }
            on_build(outcome);
        }

        Ok(())
    }
}

/// Wait for one event, then keep collecting until the stream is quiet for
/// `debounce`. Returns `None` once the stream is closed and drained.
async fn next_batch(
    rx: &mut UnboundedReceiver<notify::Result<Event>>,
    debounce: Duration,
) -> Option<BTreeSet<PathBuf>> {
    let mut paths = BTreeSet::new();
    collect(rx.recv().await?, &mut paths);

    loop {
        match tokio::time::timeout(debounce, rx.recv()).await {
            Ok(Some(res)) => collect(res, &mut paths),
            Ok(None) | Err(_) => break,
        }
    }
    Some(paths)
}

fn collect(res: notify::Result<Event>, paths: &mut BTreeSet<PathBuf>) {
    match res {
        Ok(event) => {
            if matches!(
                event.kind,
                EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
            ) {
                paths.extend(event.paths);
            }
        }
        Err(e) => tracing::warn!("Watch error: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, ModifyKind};

    #[tokio::test]
    async fn test_change_filter_ignores_identical_rewrites() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("style.css");
        std::fs::write(&file, "body {}").unwrap();

        let mut filter = ChangeFilter::new();
        assert!(filter.changed(&file).await);
        std::fs::write(&file, "body {}").unwrap();
        assert!(!filter.changed(&file).await);
        std::fs::write(&file, "body { margin: 0; }").unwrap();
        assert!(filter.changed(&file).await);

        std::fs::remove_file(&file).unwrap();
        assert!(filter.changed(&file).await);
        assert!(filter.is_empty());
    }

    #[tokio::test]
    async fn test_prime_from_graph() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("index.html");
        std::fs::write(&file, "<html></html>").unwrap();

        let graph = Graph::new();
        graph.get_or_create(NodeKind::Markup, &crate::resolve::path_key(&file));
        graph.get_or_create(NodeKind::Style, "/nowhere/missing.css");

        let mut filter = ChangeFilter::new();
        filter.prime(&graph).await;
        assert_eq!(filter.len(), 1);
        assert!(!filter.changed(&file).await);
    }

    #[test]
    fn test_relevance() {
        let watcher = Watcher::new(PathBuf::from("/site"), &["drafts/".to_string()]);
        assert!(watcher.is_relevant(Path::new("/site/index.html")));
        assert!(watcher.is_relevant(Path::new("/site/js/app.js")));
        assert!(!watcher.is_relevant(Path::new("/site/logo.png")));
        assert!(!watcher.is_relevant(Path::new("/site/node_modules/x/index.js")));
        assert!(!watcher.is_relevant(Path::new("/site/drafts/page.html")));
    }

    #[test]
    fn test_gitignored_files_are_not_relevant() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_path_buf();
        std::fs::write(root.join(".gitignore"), "build/\n").unwrap();

        let watcher = Watcher::new(root.clone(), &[]);
        assert!(!watcher.is_relevant(&root.join("build/app.js")));
        assert!(watcher.is_relevant(&root.join("src/app.js")));
    }

    #[tokio::test]
    async fn test_events_are_batched() {
        let (tx, mut rx) = unbounded_channel();
        tx.send(Ok(Event::new(EventKind::Create(CreateKind::File)).add_path("/p/a.css".into())))
            .unwrap();
        tx.send(Ok(Event::new(EventKind::Modify(ModifyKind::Any)).add_path("/p/b.js".into())))
            .unwrap();
        tx.send(Ok(Event::new(EventKind::Access(AccessKind::Any)).add_path("/p/c.js".into())))
            .unwrap();
        tx.send(Ok(Event::new(EventKind::Modify(ModifyKind::Any)).add_path("/p/a.css".into())))
            .unwrap();
        drop(tx);

        let batch = next_batch(&mut rx, Duration::from_millis(10)).await.unwrap();
        let expected: BTreeSet<PathBuf> = ["/p/a.css", "/p/b.js"].iter().map(PathBuf::from).collect();
        assert_eq!(batch, expected);
        assert!(next_batch(&mut rx, Duration::from_millis(10)).await.is_none());
    }
}
