//! Build diagnostics
//!
//! A failed read never stops a build: the node simply has no children. The
//! failure is still recorded here so callers can see which edges are missing
//! and which references point at files that are not there.

use crate::graph::Graph;
use crate::node::{NodeId, ReadStatus};
use crate::scanner::ScanStats;
use serde::Serialize;
use std::fmt;

/// A file that could not be read during a build
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadFailure {
    pub id: NodeId,
    pub error: String,
}

/// What happened during one build
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
    /// Project root the build ran against
    pub root: String,
    /// Markup files the graph was seeded with
    pub seeded: usize,
    /// Markup files skipped for an illegal name
    pub skipped: Vec<String>,
    /// Reads that failed, sorted by node
    pub failures: Vec<ReadFailure>,
    /// Pass counts per kind
    pub scan: ScanStats,
    pub elapsed_ms: u64,
}

impl BuildReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Build Report ({}):", self.root)?;
        writeln!(f, "  Seeded markup files: {}", self.seeded)?;
        if !self.skipped.is_empty() {
            writeln!(f, "  Skipped (illegal name): {}", self.skipped.len())?;
        }
        writeln!(
            f,
            "  Passes: markup {}, style {}, script {}",
            self.scan.markup.passes, self.scan.style.passes, self.scan.script.passes
        )?;
        writeln!(f, "  Failed reads: {}", self.failures.len())?;
        write!(f, "  Elapsed: {} ms", self.elapsed_ms)
    }
}

/// A referenced file that could not be read, with everything referencing it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaleReference {
    pub id: NodeId,
    pub error: String,
    pub referenced_by: Vec<NodeId>,
}

/// Every unreadable node that some other file references.
///
/// Unreadable seed documents have no parents and are not references, so
/// they only show up in `BuildReport::failures`.
pub fn stale_references(graph: &Graph) -> Vec<StaleReference> {
    graph
        .unreadable()
        .into_iter()
        .filter(|node| !node.parents.is_empty())
        .map(|node| StaleReference {
            error: match &node.status {
                ReadStatus::Failed(error) => error.clone(),
                _ => String::new(),
            },
            referenced_by: node.parents.iter().cloned().collect(),
            id: node.id,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::NodeKind;

    #[test]
    fn test_stale_references_need_a_parent() {
        let graph = Graph::new();
        let (page, _) = graph.get_or_create(NodeKind::Markup, "/p/index.html");
        let (orphan, _) = graph.get_or_create(NodeKind::Markup, "/p/gone.html");
        let (sheet, _) = graph.discover(&page, NodeKind::Style, "/p/missing.css").unwrap();
        let (ok, _) = graph.discover(&page, NodeKind::Script, "/p/app.js").unwrap();
        graph.set_status(&sheet, ReadStatus::Failed("no such file".to_string()));
        graph.set_status(&orphan, ReadStatus::Failed("no such file".to_string()));
        graph.set_status(&ok, ReadStatus::Read);

        let stale = stale_references(&graph);
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].id, sheet);
        assert_eq!(stale[0].error, "no such file");
        assert_eq!(stale[0].referenced_by, vec![page]);
    }

    #[test]
    fn test_report_display() {
        let report = BuildReport {
            root: "/p".to_string(),
            seeded: 2,
            ..Default::default()
        };
        let text = report.to_string();
        assert!(text.contains("Seeded markup files: 2"));
        assert!(text.contains("Failed reads: 0"));
        assert!(report.is_clean());
    }
}
