//! Edge types - how one file pulls in another
//!
//! Only four relationships exist:
//! - `Stylesheet`: markup → style (`<link rel="stylesheet">`, inline `@import`)
//! - `Script`: markup → script (`<script src>`)
//! - `Import`: style → style (`@import`)
//! - `Require`: script → script (`require(...)`)

use crate::kind::NodeKind;
use crate::node::NodeId;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Relationship kinds. The pair of endpoint kinds fully determines the edge kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// Markup pulls in a style sheet
    Stylesheet,
    /// Markup pulls in a script
    Script,
    /// Style sheet imports a style sheet
    Import,
    /// Script requires a script
    Require,
}

impl EdgeKind {
    /// Get the string representation of the edge kind
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Stylesheet => "stylesheet",
            EdgeKind::Script => "script",
            EdgeKind::Import => "import",
            EdgeKind::Require => "require",
        }
    }

    /// Get all edge kinds
    pub fn all() -> &'static [EdgeKind] {
        &[
            EdgeKind::Stylesheet,
            EdgeKind::Script,
            EdgeKind::Import,
            EdgeKind::Require,
        ]
    }

    /// Edge kind for a parent/child kind pair, or `None` if the pair may not be linked.
    pub fn between(parent: NodeKind, child: NodeKind) -> Option<EdgeKind> {
        match (parent, child) {
            (NodeKind::Markup, NodeKind::Style) => Some(EdgeKind::Stylesheet),
            (NodeKind::Markup, NodeKind::Script) => Some(EdgeKind::Script),
            (NodeKind::Style, NodeKind::Style) => Some(EdgeKind::Import),
            (NodeKind::Script, NodeKind::Script) => Some(EdgeKind::Require),
            _ => None,
        }
    }

    pub fn parent_kind(&self) -> NodeKind {
        match self {
            EdgeKind::Stylesheet | EdgeKind::Script => NodeKind::Markup,
            EdgeKind::Import => NodeKind::Style,
            EdgeKind::Require => NodeKind::Script,
        }
    }

    pub fn child_kind(&self) -> NodeKind {
        match self {
            EdgeKind::Stylesheet | EdgeKind::Import => NodeKind::Style,
            EdgeKind::Script | EdgeKind::Require => NodeKind::Script,
        }
    }
}

impl FromStr for EdgeKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "stylesheet" | "link" => Ok(EdgeKind::Stylesheet),
            "script" | "src" => Ok(EdgeKind::Script),
            "import" | "@import" => Ok(EdgeKind::Import),
            "require" => Ok(EdgeKind::Require),
            _ => Err(Error::InvalidEdge(format!("Unknown edge kind: {}", s))),
        }
    }
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A directed edge from a referencing file to a referenced one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub kind: EdgeKind,
}

impl Edge {
    /// Create an edge, rejecting kind pairs that may not be linked
    pub fn new(from: NodeId, to: NodeId) -> Result<Self> {
        let kind = EdgeKind::between(from.kind, to.kind)
            .ok_or_else(|| Error::InvalidEdge(format!("{} cannot reference {}", from, to)))?;
        Ok(Self { from, to, kind })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_kind_roundtrip() {
        for kind in EdgeKind::all() {
            let parsed: EdgeKind = kind.as_str().parse().unwrap();
            assert_eq!(*kind, parsed);
        }
    }

    #[test]
    fn test_between_matches_endpoints() {
        for kind in EdgeKind::all() {
            assert_eq!(EdgeKind::between(kind.parent_kind(), kind.child_kind()), Some(*kind));
        }
    }

    #[test]
    fn test_illegal_pairs() {
        assert_eq!(EdgeKind::between(NodeKind::Style, NodeKind::Script), None);
        assert_eq!(EdgeKind::between(NodeKind::Script, NodeKind::Style), None);
        assert_eq!(EdgeKind::between(NodeKind::Style, NodeKind::Markup), None);
        assert_eq!(EdgeKind::between(NodeKind::Markup, NodeKind::Markup), None);
    }

    #[test]
    fn test_edge_new() {
        let from = NodeId::new(NodeKind::Markup, "/p/index.html");
        let to = NodeId::new(NodeKind::Script, "/p/app.js");
        let edge = Edge::new(from.clone(), to.clone()).unwrap();
        assert_eq!(edge.kind, EdgeKind::Script);

        assert!(Edge::new(to, from).is_err());
    }
}
