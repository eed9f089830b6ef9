//! Node identity and per-file scan state
//!
//! A node is identified by its kind and canonical path: `style:/site/css/main.css`.
//! The same path may exist in more than one table, so the kind is part of the key.

use crate::kind::NodeKind;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Stable key of a node within one build's graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    /// Which table the node lives in
    pub kind: NodeKind,
    /// Canonical path, unique within the kind's table
    pub path: String,
}

impl NodeId {
    /// Create a new NodeId
    pub fn new(kind: NodeKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }

    /// Parse an id string
    ///
    /// Expected format: `<kind>:<path>`
    pub fn parse(s: &str) -> Result<Self> {
        let (kind, path) = s
            .split_once(':')
            .ok_or_else(|| Error::NodeNotFound(format!("expected <kind>:<path>, got {}", s)))?;
        if path.is_empty() {
            return Err(Error::NodeNotFound(format!("empty path in {}", s)));
        }
        Ok(Self::new(NodeKind::from_str(kind)?, path))
    }

    /// File name portion of the path, for display
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.path)
    }
}

impl FromStr for NodeId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Outcome of reading a node's file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "error", rename_all = "lowercase")]
pub enum ReadStatus {
    /// Not read yet
    #[default]
    Pending,
    /// Read and scanned
    Read,
    /// The read failed; the node contributes no references
    Failed(String),
}

/// A file in the project graph.
///
/// Edges are stored by key on both ends: `children` on the referencing node,
/// `parents` on the referenced one. Neither side owns the other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Set once, right before the file is read
    pub processed: bool,
    pub status: ReadStatus,
    /// Child paths grouped by child kind
    pub children: BTreeMap<NodeKind, BTreeSet<String>>,
    /// Nodes referencing this one
    pub parents: BTreeSet<NodeId>,
}

impl Node {
    pub fn new(kind: NodeKind, path: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(kind, path),
            processed: false,
            status: ReadStatus::Pending,
            children: BTreeMap::new(),
            parents: BTreeSet::new(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.id.kind
    }

    pub fn path(&self) -> &str {
        &self.id.path
    }

    /// Child paths of one kind
    pub fn children_of(&self, kind: NodeKind) -> impl Iterator<Item = &str> {
        self.children
            .get(&kind)
            .into_iter()
            .flat_map(|paths| paths.iter().map(String::as_str))
    }

    /// All child ids, markup children first by kind order
    pub fn child_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.children
            .iter()
            .flat_map(|(kind, paths)| paths.iter().map(move |p| NodeId::new(*kind, p.clone())))
    }

    pub fn has_child(&self, child: &NodeId) -> bool {
        self.children
            .get(&child.kind)
            .is_some_and(|paths| paths.contains(&child.path))
    }

    pub fn child_count(&self) -> usize {
        self.children.values().map(BTreeSet::len).sum()
    }

    pub fn is_unreadable(&self) -> bool {
        matches!(self.status, ReadStatus::Failed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_roundtrip() {
        let id = NodeId::new(NodeKind::Style, "/site/css/main.css");
        let s = id.to_string();
        assert_eq!(s, "style:/site/css/main.css");
        assert_eq!(NodeId::parse(&s).unwrap(), id);
    }

    #[test]
    fn test_id_parse_keeps_colons_in_path() {
        let id = NodeId::parse("script:C:/site/app.js").unwrap();
        assert_eq!(id.kind, NodeKind::Script);
        assert_eq!(id.path, "C:/site/app.js");
    }

    #[test]
    fn test_id_parse_rejects_garbage() {
        assert!(NodeId::parse("no-separator").is_err());
        assert!(NodeId::parse("style:").is_err());
        assert!(NodeId::parse("image:/a.png").is_err());
    }

    #[test]
    fn test_new_node_is_unprocessed() {
        let node = Node::new(NodeKind::Markup, "/site/index.html");
        assert!(!node.processed);
        assert_eq!(node.status, ReadStatus::Pending);
        assert_eq!(node.child_count(), 0);
        assert_eq!(node.id.file_name(), "index.html");
    }

    #[test]
    fn test_children_by_kind() {
        let mut node = Node::new(NodeKind::Markup, "/site/index.html");
        node.children
            .entry(NodeKind::Style)
            .or_default()
            .insert("/site/a.css".to_string());
        node.children
            .entry(NodeKind::Script)
            .or_default()
            .insert("/site/a.js".to_string());

        assert_eq!(node.children_of(NodeKind::Style).collect::<Vec<_>>(), vec!["/site/a.css"]);
        assert!(node.has_child(&NodeId::new(NodeKind::Script, "/site/a.js")));
        assert!(!node.has_child(&NodeId::new(NodeKind::Style, "/site/a.js")));
        assert_eq!(node.child_ids().count(), 2);
    }
}
