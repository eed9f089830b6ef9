//! Project graph - the three node tables of one build
//!
//! Holds one table per node kind, keyed by canonical path, and records every
//! edge on both of its ends. All mutation goes through short critical
//! sections on a single mutex, so the graph can be shared by every read in
//! flight during a scan pass.

use crate::edge::{Edge, EdgeKind};
use crate::kind::NodeKind;
use crate::node::{Node, NodeId, ReadStatus};
use crate::{Error, Result};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Tables {
    markup: HashMap<String, Node>,
    style: HashMap<String, Node>,
    script: HashMap<String, Node>,
}

impl Tables {
    fn table(&self, kind: NodeKind) -> &HashMap<String, Node> {
        match kind {
            NodeKind::Markup => &self.markup,
            NodeKind::Style => &self.style,
            NodeKind::Script => &self.script,
        }
    }

    fn table_mut(&mut self, kind: NodeKind) -> &mut HashMap<String, Node> {
        match kind {
            NodeKind::Markup => &mut self.markup,
            NodeKind::Style => &mut self.style,
            NodeKind::Script => &mut self.script,
        }
    }

    fn get(&self, id: &NodeId) -> Option<&Node> {
        self.table(id.kind).get(&id.path)
    }

    fn get_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.table_mut(id.kind).get_mut(&id.path)
    }

    fn get_or_create(&mut self, kind: NodeKind, path: &str) -> (NodeId, bool) {
        let table = self.table_mut(kind);
        if let Some(node) = table.get(path) {
            return (node.id.clone(), false);
        }
        let node = Node::new(kind, path);
        let id = node.id.clone();
        table.insert(path.to_string(), node);
        (id, true)
    }

    fn link(&mut self, parent: &NodeId, child: &NodeId) -> Result<bool> {
        Edge::new(parent.clone(), child.clone())?;
        if self.get(child).is_none() {
            return Err(Error::NodeNotFound(child.to_string()));
        }
        let inserted = self
            .get_mut(parent)
            .ok_or_else(|| Error::NodeNotFound(parent.to_string()))?
            .children
            .entry(child.kind)
            .or_default()
            .insert(child.path.clone());
        if let Some(node) = self.get_mut(child) {
            node.parents.insert(parent.clone());
        }
        Ok(inserted)
    }
}

/// In-memory graph for one build.
#[derive(Debug, Default)]
pub struct Graph {
    tables: Mutex<Tables>,
}

impl Graph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Return the node for `(kind, path)`, creating it if absent.
    ///
    /// The flag is `true` only for the call that created the node.
    pub fn get_or_create(&self, kind: NodeKind, path: &str) -> (NodeId, bool) {
        self.lock().get_or_create(kind, path)
    }

    /// Record the edge `parent → child` on both nodes.
    ///
    /// Linking an existing pair again changes nothing and returns `false`.
    pub fn link(&self, parent: &NodeId, child: &NodeId) -> Result<bool> {
        self.lock().link(parent, child)
    }

    /// Get-or-create the child and link it to `parent` in one step.
    ///
    /// Returns the child id and whether the child node was created.
    pub fn discover(&self, parent: &NodeId, kind: NodeKind, path: &str) -> Result<(NodeId, bool)> {
        EdgeKind::between(parent.kind, kind).ok_or_else(|| {
            Error::InvalidEdge(format!("{} cannot reference a {} file", parent, kind))
        })?;
        let mut tables = self.lock();
        if tables.get(parent).is_none() {
            return Err(Error::NodeNotFound(parent.to_string()));
        }
        let (child, created) = tables.get_or_create(kind, path);
        tables.link(parent, &child)?;
        Ok((child, created))
    }

    /// Flag a node as processed. Only the first call for a node returns `true`.
    pub fn mark_processed(&self, id: &NodeId) -> bool {
        match self.lock().get_mut(id) {
            Some(node) if !node.processed => {
                node.processed = true;
                true
            }
            _ => false,
        }
    }

    pub fn set_status(&self, id: &NodeId, status: ReadStatus) {
        if let Some(node) = self.lock().get_mut(id) {
            node.status = status;
        }
    }

    /// Snapshot of the unprocessed nodes of one kind, sorted by path.
    pub fn unprocessed(&self, kind: NodeKind) -> Vec<NodeId> {
        let tables = self.lock();
        let mut ids: Vec<NodeId> = tables
            .table(kind)
            .values()
            .filter(|node| !node.processed)
            .map(|node| node.id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Get a copy of a node
    pub fn node(&self, id: &NodeId) -> Option<Node> {
        self.lock().get(id).cloned()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.lock().get(id).is_some()
    }

    /// Copies of every node of one kind, sorted by path
    pub fn nodes(&self, kind: NodeKind) -> Vec<Node> {
        let mut nodes: Vec<Node> = self.lock().table(kind).values().cloned().collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        nodes
    }

    /// Canonical paths of one kind
    pub fn paths(&self, kind: NodeKind) -> BTreeSet<String> {
        self.lock().table(kind).keys().cloned().collect()
    }

    /// Ids of every node with this path, in any table
    pub fn find_path(&self, path: &str) -> Vec<NodeId> {
        let tables = self.lock();
        NodeKind::all()
            .iter()
            .filter_map(|kind| tables.table(*kind).get(path).map(|node| node.id.clone()))
            .collect()
    }

    pub fn len(&self, kind: NodeKind) -> usize {
        self.lock().table(kind).len()
    }

    pub fn total_nodes(&self) -> usize {
        let tables = self.lock();
        NodeKind::all().iter().map(|kind| tables.table(*kind).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_nodes() == 0
    }

    /// Child ids of a node
    pub fn children(&self, id: &NodeId) -> Vec<NodeId> {
        self.lock()
            .get(id)
            .map(|node| node.child_ids().collect())
            .unwrap_or_default()
    }

    /// Parent ids of a node
    pub fn parents(&self, id: &NodeId) -> Vec<NodeId> {
        self.lock()
            .get(id)
            .map(|node| node.parents.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Every edge, sorted
    pub fn edges(&self) -> Vec<Edge> {
        let tables = self.lock();
        let mut edges: Vec<Edge> = NodeKind::all()
            .iter()
            .flat_map(|kind| tables.table(*kind).values())
            .flat_map(|node| {
                node.child_ids()
                    .filter_map(|child| Edge::new(node.id.clone(), child).ok())
                    .collect::<Vec<_>>()
            })
            .collect();
        edges.sort();
        edges
    }

    pub fn edge_count(&self) -> usize {
        let tables = self.lock();
        NodeKind::all()
            .iter()
            .flat_map(|kind| tables.table(*kind).values())
            .map(Node::child_count)
            .sum()
    }

    /// Nodes whose file could not be read, sorted
    pub fn unreadable(&self) -> Vec<Node> {
        let tables = self.lock();
        let mut nodes: Vec<Node> = NodeKind::all()
            .iter()
            .flat_map(|kind| tables.table(*kind).values())
            .filter(|node| node.is_unreadable())
            .cloned()
            .collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        nodes
    }

    /// Perform impact analysis - every node that pulls in `id`, directly or not.
    ///
    /// Breadth-first over parent edges, up to `depth` levels; each node is
    /// reported once at its shortest distance. The start node is not included.
    pub fn dependents(&self, id: &NodeId, depth: usize) -> Vec<Reached> {
        self.walk(id, depth, |node| node.parents.iter().cloned().collect())
    }

    /// Every node `id` pulls in, directly or not, up to `depth` levels.
    pub fn dependencies(&self, id: &NodeId, depth: usize) -> Vec<Reached> {
        self.walk(id, depth, |node| node.child_ids().collect())
    }

    fn walk(&self, start: &NodeId, depth: usize, next: impl Fn(&Node) -> Vec<NodeId>) -> Vec<Reached> {
        let tables = self.lock();
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([(start.clone(), 0usize)]);
        let mut reached = Vec::new();
        visited.insert(start.clone());

        while let Some((current, current_depth)) = queue.pop_front() {
            if current_depth >= depth {
                continue;
            }
            let Some(node) = tables.get(&current) else {
                continue;
            };
            for neighbour in next(node) {
                if visited.insert(neighbour.clone()) {
                    reached.push(Reached {
                        id: neighbour.clone(),
                        depth: current_depth + 1,
                    });
                    queue.push_back((neighbour, current_depth + 1));
                }
            }
        }

        reached
    }

    /// Serializable copy of the whole graph
    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            markup: self.nodes(NodeKind::Markup),
            style: self.nodes(NodeKind::Style),
            script: self.nodes(NodeKind::Script),
        }
    }

    /// Get statistics about the graph
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            markup: self.len(NodeKind::Markup),
            style: self.len(NodeKind::Style),
            script: self.len(NodeKind::Script),
            edges: self.edge_count(),
            unreadable: self.unreadable().len(),
        }
    }
}

/// A node reached by a graph walk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reached {
    pub id: NodeId,
    /// Number of edges from the start node (1 = direct)
    pub depth: usize,
}

impl Reached {
    pub fn is_direct(&self) -> bool {
        self.depth == 1
    }
}

/// Owned copy of a graph, one sorted list per table
#[derive(Debug, Clone, Serialize)]
pub struct GraphSnapshot {
    pub markup: Vec<Node>,
    pub style: Vec<Node>,
    pub script: Vec<Node>,
}

/// Statistics about a project graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub markup: usize,
    pub style: usize,
    pub script: usize,
    pub edges: usize,
    pub unreadable: usize,
}

impl std::fmt::Display for GraphStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Project Graph Statistics:")?;
        writeln!(f, "  Markup: {}", self.markup)?;
        writeln!(f, "  Style sheets: {}", self.style)?;
        writeln!(f, "  Scripts: {}", self.script)?;
        writeln!(f, "  Edges: {} (unreadable files: {})", self.edges, self.unreadable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn id(kind: NodeKind, path: &str) -> NodeId {
        NodeId::new(kind, path)
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let graph = Graph::new();
        let (a, created) = graph.get_or_create(NodeKind::Style, "/p/a.css");
        assert!(created);
        let (again, created) = graph.get_or_create(NodeKind::Style, "/p/a.css");
        assert!(!created);
        assert_eq!(a, again);
        assert_eq!(graph.len(NodeKind::Style), 1);

        // Same path in another table is a different node
        let (_, created) = graph.get_or_create(NodeKind::Script, "/p/a.css");
        assert!(created);
        assert_eq!(graph.find_path("/p/a.css").len(), 2);
    }

    #[test]
    fn test_link_is_bidirectional_and_idempotent() {
        let graph = Graph::new();
        let (page, _) = graph.get_or_create(NodeKind::Markup, "/p/index.html");
        let (sheet, _) = graph.get_or_create(NodeKind::Style, "/p/a.css");

        assert!(graph.link(&page, &sheet).unwrap());
        assert!(!graph.link(&page, &sheet).unwrap());

        assert_eq!(graph.children(&page), vec![sheet.clone()]);
        assert_eq!(graph.parents(&sheet), vec![page.clone()]);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_link_rejects_illegal_kinds() {
        let graph = Graph::new();
        let (sheet, _) = graph.get_or_create(NodeKind::Style, "/p/a.css");
        let (script, _) = graph.get_or_create(NodeKind::Script, "/p/a.js");
        let (page, _) = graph.get_or_create(NodeKind::Markup, "/p/index.html");

        assert!(matches!(graph.link(&sheet, &script), Err(Error::InvalidEdge(_))));
        assert!(matches!(graph.link(&script, &page), Err(Error::InvalidEdge(_))));
        assert!(graph.discover(&sheet, NodeKind::Script, "/p/b.js").is_err());
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.len(NodeKind::Script), 1);
    }

    #[test]
    fn test_link_requires_both_nodes() {
        let graph = Graph::new();
        let (page, _) = graph.get_or_create(NodeKind::Markup, "/p/index.html");
        let missing = id(NodeKind::Style, "/p/missing.css");
        assert!(matches!(graph.link(&page, &missing), Err(Error::NodeNotFound(_))));
        assert!(graph.children(&page).is_empty());
    }

    #[test]
    fn test_self_reference_and_cycle() {
        let graph = Graph::new();
        let (a, _) = graph.get_or_create(NodeKind::Style, "/p/a.css");
        let (b, created) = graph.discover(&a, NodeKind::Style, "/p/b.css").unwrap();
        assert!(created);
        let (back, created) = graph.discover(&b, NodeKind::Style, "/p/a.css").unwrap();
        assert!(!created);
        assert_eq!(back, a);
        graph.discover(&a, NodeKind::Style, "/p/a.css").unwrap();

        let a_node = graph.node(&a).unwrap();
        assert!(a_node.has_child(&b));
        assert!(a_node.has_child(&a));
        assert!(a_node.parents.contains(&b));
        assert!(a_node.parents.contains(&a));
        assert_eq!(graph.parents(&b), vec![a.clone()]);
    }

    #[test]
    fn test_mark_processed_once() {
        let graph = Graph::new();
        let (a, _) = graph.get_or_create(NodeKind::Script, "/p/a.js");
        graph.get_or_create(NodeKind::Script, "/p/b.js");

        assert_eq!(graph.unprocessed(NodeKind::Script).len(), 2);
        assert!(graph.mark_processed(&a));
        assert!(!graph.mark_processed(&a));
        assert_eq!(graph.unprocessed(NodeKind::Script), vec![id(NodeKind::Script, "/p/b.js")]);
        assert!(!graph.mark_processed(&id(NodeKind::Script, "/p/nope.js")));
    }

    #[test]
    fn test_concurrent_discovery_creates_one_node() {
        let graph = Arc::new(Graph::new());
        let parents: Vec<NodeId> = (0..8)
            .map(|i| graph.get_or_create(NodeKind::Markup, &format!("/p/{}.html", i)).0)
            .collect();

        let handles: Vec<_> = parents
            .into_iter()
            .map(|parent| {
                let graph = Arc::clone(&graph);
                std::thread::spawn(move || {
                    (0..50)
                        .filter(|_| graph.discover(&parent, NodeKind::Style, "/p/shared.css").unwrap().1)
                        .count()
                })
            })
            .collect();

        let created: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(created, 1);
        assert_eq!(graph.len(NodeKind::Style), 1);
        assert_eq!(graph.parents(&id(NodeKind::Style, "/p/shared.css")).len(), 8);
    }

    #[test]
    fn test_impact_analysis() {
        let graph = Graph::new();
        // index.html -> a.css -> b.css -> c.css, about.html -> c.css
        let (index, _) = graph.get_or_create(NodeKind::Markup, "/p/index.html");
        let (about, _) = graph.get_or_create(NodeKind::Markup, "/p/about.html");
        let (a, _) = graph.discover(&index, NodeKind::Style, "/p/a.css").unwrap();
        let (b, _) = graph.discover(&a, NodeKind::Style, "/p/b.css").unwrap();
        let (c, _) = graph.discover(&b, NodeKind::Style, "/p/c.css").unwrap();
        graph.discover(&about, NodeKind::Style, "/p/c.css").unwrap();

        let all = graph.dependents(&c, usize::MAX);
        let ids: Vec<_> = all.iter().map(|r| r.id.clone()).collect();
        assert_eq!(all.len(), 4);
        assert!(ids.contains(&index));
        assert!(all.iter().any(|r| r.id == about && r.is_direct()));
        assert!(all.iter().any(|r| r.id == index && r.depth == 3));

        let direct = graph.dependents(&c, 1);
        assert_eq!(direct.len(), 2);

        let deps = graph.dependencies(&index, usize::MAX);
        assert_eq!(deps.iter().map(|r| r.id.clone()).collect::<Vec<_>>(), vec![a, b, c]);
    }

    #[test]
    fn test_walk_terminates_on_cycles() {
        let graph = Graph::new();
        let (a, _) = graph.get_or_create(NodeKind::Script, "/p/a.js");
        let (b, _) = graph.discover(&a, NodeKind::Script, "/p/b.js").unwrap();
        graph.discover(&b, NodeKind::Script, "/p/a.js").unwrap();

        assert_eq!(graph.dependencies(&a, usize::MAX), vec![Reached { id: b.clone(), depth: 1 }]);
        assert_eq!(graph.dependents(&a, usize::MAX), vec![Reached { id: b, depth: 1 }]);
    }

    #[test]
    fn test_stats_and_unreadable() {
        let graph = Graph::new();
        let (page, _) = graph.get_or_create(NodeKind::Markup, "/p/index.html");
        let (sheet, _) = graph.discover(&page, NodeKind::Style, "/p/a.css").unwrap();
        graph.discover(&page, NodeKind::Script, "/p/a.js").unwrap();
        graph.set_status(&sheet, ReadStatus::Failed("not found".to_string()));

        let stats = graph.stats();
        assert_eq!(stats.markup, 1);
        assert_eq!(stats.style, 1);
        assert_eq!(stats.script, 1);
        assert_eq!(stats.edges, 2);
        assert_eq!(stats.unreadable, 1);
        assert_eq!(graph.unreadable()[0].id, sheet);
        assert_eq!(graph.edges().len(), 2);
    }

    #[test]
    fn test_snapshot_serializes() {
        let graph = Graph::new();
        let (page, _) = graph.get_or_create(NodeKind::Markup, "/p/index.html");
        graph.discover(&page, NodeKind::Style, "/p/a.css").unwrap();

        let json = serde_json::to_value(graph.snapshot()).unwrap();
        assert_eq!(json["markup"][0]["id"]["path"], "/p/index.html");
        assert_eq!(json["markup"][0]["children"]["style"][0], "/p/a.css");
        assert_eq!(json["style"][0]["status"]["state"], "pending");
    }
}
