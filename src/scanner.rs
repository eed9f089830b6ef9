//! Convergent scanner
//!
//! Sweeps one node kind at a time in discrete passes:
//!
//! 1. Snapshot the kind's unprocessed nodes (the frontier).
//! 2. Stop if the frontier is empty.
//! 3. Read and scan every frontier node concurrently, bounded by
//!    `max_concurrency`, adding discovered children to the graph.
//! 4. Wait for the whole pass to settle.
//! 5. Repeat while the pass created at least one node.
//!
//! Nodes created during a pass are never lost: they are unprocessed, so the
//! next snapshot picks them up. Kinds are swept markup, then style, then
//! script, since only style sheets and scripts can reference more files of
//! their own kind.

use crate::edge::EdgeKind;
use crate::extract::ExtractorRegistry;
use crate::graph::Graph;
use crate::kind::NodeKind;
use crate::node::{NodeId, ReadStatus};
use crate::report::ReadFailure;
use crate::resolve::Resolver;
use crate::source::FileSource;
use crate::ui::ProgressMessage;
use crate::{Error, Result};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Reads allowed in flight per pass unless configured otherwise
pub const DEFAULT_MAX_CONCURRENCY: usize = 32;

/// Shared flag that stops a scan before its next pass.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Whether two handles control the same scan
    pub fn same_as(&self, other: &CancelToken) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Counters for one kind's sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepStats {
    /// Non-empty passes run
    pub passes: usize,
    /// Files read (or attempted)
    pub scanned: usize,
    /// Nodes created, of any kind
    pub created: usize,
    /// Reads that failed
    pub failed: usize,
}

/// Sweep counters for every kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub markup: SweepStats,
    pub style: SweepStats,
    pub script: SweepStats,
}

impl ScanStats {
    pub fn get(&self, kind: NodeKind) -> &SweepStats {
        match kind {
            NodeKind::Markup => &self.markup,
            NodeKind::Style => &self.style,
            NodeKind::Script => &self.script,
        }
    }

    fn get_mut(&mut self, kind: NodeKind) -> &mut SweepStats {
        match kind {
            NodeKind::Markup => &mut self.markup,
            NodeKind::Style => &mut self.style,
            NodeKind::Script => &mut self.script,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct NodeOutcome {
    scanned: bool,
    failed: bool,
    created: usize,
}

/// Drives the sweep passes of one build over a shared graph.
pub struct Scanner {
    graph: Arc<Graph>,
    source: Arc<dyn FileSource>,
    registry: Arc<ExtractorRegistry>,
    resolver: Resolver,
    max_concurrency: usize,
    cancel: CancelToken,
    progress: Option<crossbeam::channel::Sender<ProgressMessage>>,
    failures: Mutex<Vec<ReadFailure>>,
}

impl Scanner {
    pub fn new(
        graph: Arc<Graph>,
        source: Arc<dyn FileSource>,
        registry: Arc<ExtractorRegistry>,
        resolver: Resolver,
    ) -> Self {
        Self {
            graph,
            source,
            registry,
            resolver,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            cancel: CancelToken::new(),
            progress: None,
            failures: Mutex::new(Vec::new()),
        }
    }

    /// Cap the reads in flight per pass. Zero is treated as one.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_progress(mut self, progress: crossbeam::channel::Sender<ProgressMessage>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Sweep markup, then style, then script, each to its fixed point.
    pub async fn run(&self) -> Result<ScanStats> {
        let mut stats = ScanStats::default();
        for kind in NodeKind::all() {
            *stats.get_mut(*kind) = self.sweep(*kind).await?;
        }
        Ok(stats)
    }

    /// Sweep one kind until a pass creates no new node.
    pub async fn sweep(&self, kind: NodeKind) -> Result<SweepStats> {
        let mut stats = SweepStats::default();

        loop {
            if self.cancel.is_cancelled() {
                tracing::info!("Scan cancelled before {} pass {}", kind, stats.passes + 1);
                return Err(Error::Cancelled);
            }

            let frontier = self.graph.unprocessed(kind);
            if frontier.is_empty() {
                break;
            }

            stats.passes += 1;
            let pass = stats.passes;
            tracing::debug!("{} pass {}: {} files", kind, pass, frontier.len());
            self.notify(ProgressMessage::Started {
                phase: kind,
                pass,
                total: frontier.len(),
            });

            let outcomes: Vec<NodeOutcome> = stream::iter(frontier)
                .map(|id| self.scan_node(id))
                .buffer_unordered(self.max_concurrency)
                .collect()
                .await;

            let created: usize = outcomes.iter().map(|o| o.created).sum();
            stats.scanned += outcomes.iter().filter(|o| o.scanned).count();
            stats.failed += outcomes.iter().filter(|o| o.failed).count();
            stats.created += created;
            tracing::debug!("{} pass {} created {} nodes", kind, pass, created);

            if created == 0 {
                break;
            }
        }

        tracing::info!(
            "{} converged after {} passes ({} files, {} failed)",
            kind,
            stats.passes,
            stats.scanned,
            stats.failed
        );
        self.notify(ProgressMessage::Finished {
            phase: kind,
            passes: stats.passes,
        });
        Ok(stats)
    }

    /// Failed reads so far, sorted by node
    pub fn failures(&self) -> Vec<ReadFailure> {
        let mut failures = self
            .failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        failures.sort_by(|a, b| a.id.cmp(&b.id));
        failures
    }

    async fn scan_node(&self, id: NodeId) -> NodeOutcome {
        // Another pass or a concurrent duplicate already owns this node
        if !self.graph.mark_processed(&id) {
            return NodeOutcome::default();
        }

        match self.source.read_text(&id.path).await {
            Ok(text) => {
                self.graph.set_status(&id, ReadStatus::Read);
                let created = self.apply(&id, &text);
                self.notify(ProgressMessage::Progress {
                    phase: id.kind,
                    file: Some(id.path.clone()),
                });
                NodeOutcome {
                    scanned: true,
                    failed: false,
                    created,
                }
            }
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", id, e);
                let error = e.to_string();
                self.graph.set_status(&id, ReadStatus::Failed(error.clone()));
                self.notify(ProgressMessage::Error(error.clone()));
                self.failures
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .push(ReadFailure { id, error });
                NodeOutcome {
                    scanned: true,
                    failed: true,
                    created: 0,
                }
            }
        }
    }

    /// Add every reference in `text` under `parent`; returns nodes created.
    fn apply(&self, parent: &NodeId, text: &str) -> usize {
        let mut created = 0;
        for reference in self.registry.extract(parent.kind, text) {
            let Some(edge_kind) = EdgeKind::between(parent.kind, reference.target) else {
                tracing::debug!("{} cannot reference a {} file, skipping {:?}", parent, reference.target, reference.raw);
                continue;
            };
            let path = self.resolver.resolve(edge_kind, &parent.path, &reference.raw);
            match self.graph.discover(parent, reference.target, &path) {
                Ok((child, is_new)) => {
                    tracing::debug!("  {} ({}:{}): {}", edge_kind, parent.file_name(), reference.line, child.path);
                    if is_new {
                        created += 1;
                    }
                }
                Err(e) => tracing::warn!("Dropping reference {:?} in {}: {}", reference.raw, parent, e),
            }
        }
        created
    }

    fn notify(&self, message: ProgressMessage) {
        if let Some(tx) = &self.progress {
            tx.send(message).ok();
        }
    }
}
