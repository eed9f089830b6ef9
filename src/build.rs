//! Build driver
//!
//! `ProjectMap` owns the collaborators of a project (indexer, file source,
//! extractors) and turns a project root into a finished graph. Every build
//! starts from an empty graph; nothing carries over between builds.
//!
//! Builds are serialized. Starting a build cancels the one in flight, waits
//! for it to stop at its next pass boundary, then runs. A cancelled build
//! never replaces the last completed graph.

use crate::config::BuildSettings;
use crate::extract::{ExtractorRegistry, default_registry};
use crate::filename::is_legal_filename;
use crate::graph::Graph;
use crate::index::{FileIndexer, IndexedFile};
use crate::kind::NodeKind;
use crate::report::BuildReport;
use crate::resolve::{Resolver, path_key};
use crate::scanner::{CancelToken, Scanner};
use crate::source::FileSource;
use crate::ui::ProgressMessage;
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Instant;

/// What asks for a rebuild
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectEvent {
    /// A (possibly different) project was opened
    Opened(PathBuf),
    /// Files of the current project changed
    Changed(Vec<PathBuf>),
}

/// A completed build
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub graph: Arc<Graph>,
    pub report: BuildReport,
}

pub struct ProjectMap {
    root: RwLock<PathBuf>,
    settings: BuildSettings,
    indexer: Arc<dyn FileIndexer>,
    source: Arc<dyn FileSource>,
    registry: Arc<ExtractorRegistry>,
    progress: Option<crossbeam::channel::Sender<ProgressMessage>>,
    /// Last completed graph
    current: RwLock<Option<Arc<Graph>>>,
    /// Graph of the build in flight
    building: RwLock<Option<Arc<Graph>>>,
    in_flight: Mutex<Option<CancelToken>>,
    serial: tokio::sync::Mutex<()>,
}

impl ProjectMap {
    pub fn new(
        root: impl Into<PathBuf>,
        settings: BuildSettings,
        indexer: Arc<dyn FileIndexer>,
        source: Arc<dyn FileSource>,
    ) -> Self {
        Self {
            root: RwLock::new(root.into()),
            settings,
            indexer,
            source,
            registry: Arc::new(default_registry()),
            progress: None,
            current: RwLock::new(None),
            building: RwLock::new(None),
            in_flight: Mutex::new(None),
            serial: tokio::sync::Mutex::new(()),
        }
    }

    /// Use a custom extractor registry
    pub fn with_registry(mut self, registry: ExtractorRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn with_progress(mut self, progress: crossbeam::channel::Sender<ProgressMessage>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn root(&self) -> PathBuf {
        self.root
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// The last completed graph, if any build has finished
    pub fn graph(&self) -> Option<Arc<Graph>> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// The graph being built right now, partial by definition
    pub fn in_progress(&self) -> Option<Arc<Graph>> {
        self.building
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Rebuild in response to a project event
    pub async fn handle_event(&self, event: ProjectEvent) -> Result<BuildOutcome> {
        match event {
            ProjectEvent::Opened(root) => {
                tracing::info!("Project opened: {}", root.display());
                *self.root.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = root;
            }
            ProjectEvent::Changed(paths) => {
                tracing::info!("{} project files changed, rebuilding", paths.len());
            }
        }
        self.build().await
    }

    /// Cancel the build in flight, if any
    pub fn cancel(&self) {
        if let Some(token) = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
        {
            token.cancel();
        }
    }

    /// Build the project graph from scratch.
    ///
    /// Fails only with `Error::Cancelled` (superseded by a newer build) or when
    /// the markup files cannot be listed. Unreadable files end up in the report.
    pub async fn build(&self) -> Result<BuildOutcome> {
        let token = CancelToken::new();
        {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(previous) = in_flight.replace(token.clone()) {
                tracing::debug!("Superseding build in flight");
                previous.cancel();
            }
        }

        let _serial = self.serial.lock().await;
        let result = self.run_build(&token).await;

        {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            if in_flight.as_ref().is_some_and(|t| t.same_as(&token)) {
                *in_flight = None;
            }
        }
        result
    }

    async fn run_build(&self, token: &CancelToken) -> Result<BuildOutcome> {
        if token.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let started = Instant::now();
        let root = self.root();
        let graph = Arc::new(Graph::new());
        self.set_building(Some(Arc::clone(&graph)));
        tracing::info!("Building project map for {}", root.display());

        let files = self.list_markup(&root).await;
        let files = match files {
            Ok(files) => files,
            Err(e) => {
                self.set_building(None);
                return Err(e);
            }
        };

        let mut report = BuildReport {
            root: path_key(&root),
            ..BuildReport::default()
        };
        for file in files {
            if !is_legal_filename(&file.name) {
                tracing::debug!("Skipping illegal file name: {}", file.full_path);
                report.skipped.push(file.full_path);
                continue;
            }
            let (_, created) = graph.get_or_create(NodeKind::Markup, &file.full_path);
            if created {
                report.seeded += 1;
            }
        }

        let mut scanner = Scanner::new(
            Arc::clone(&graph),
            Arc::clone(&self.source),
            Arc::clone(&self.registry),
            Resolver::new(&root, self.settings.resolution),
        )
        .with_max_concurrency(self.settings.max_concurrency)
        .with_cancel(token.clone());
        if let Some(progress) = &self.progress {
            scanner = scanner.with_progress(progress.clone());
        }

        let scan = scanner.run().await;
        self.set_building(None);
        report.scan = scan?;
        report.failures = scanner.failures();
        report.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        if token.is_cancelled() {
            return Err(Error::Cancelled);
        }
        *self.current.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(Arc::clone(&graph));

        tracing::info!(
            "Project map complete: {} markup, {} style, {} script, {} failed reads",
            graph.len(NodeKind::Markup),
            graph.len(NodeKind::Style),
            graph.len(NodeKind::Script),
            report.failures.len()
        );
        Ok(BuildOutcome { graph, report })
    }

    async fn list_markup(&self, root: &Path) -> Result<Vec<IndexedFile>> {
        let indexer = Arc::clone(&self.indexer);
        let root = root.to_path_buf();
        let extensions = self.settings.markup_extensions.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<IndexedFile>> {
            let mut files = Vec::new();
            for extension in &extensions {
                files.extend(indexer.list_files(&root, extension)?);
            }
            files.sort();
            files.dedup();
            Ok(files)
        })
        .await
        .map_err(|e| Error::Io(std::io::Error::other(e)))?
    }

    fn set_building(&self, graph: Option<Arc<Graph>>) {
        *self.building.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = graph;
    }
}
