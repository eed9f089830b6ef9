//! Node kinds - the three file tables of the graph
//!
//! Every file in the graph is one of:
//! - `Markup`: HTML documents, the roots of the graph
//! - `Style`: style sheets, reachable through `<link>` and `@import`
//! - `Script`: scripts, reachable through `<script src>` and `require`

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// The kind of file a node stands for. Each kind has its own table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// HTML document
    Markup,
    /// Style sheet
    Style,
    /// Script file
    Script,
}

impl NodeKind {
    /// Get the string representation of the node kind
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Markup => "markup",
            NodeKind::Style => "style",
            NodeKind::Script => "script",
        }
    }

    /// Get all node kinds, in scan order
    pub fn all() -> &'static [NodeKind] {
        &[NodeKind::Markup, NodeKind::Style, NodeKind::Script]
    }

    /// Kinds this kind may reference.
    ///
    /// Markup references both style sheets and scripts; style sheets and
    /// scripts only reference their own kind.
    pub fn child_kinds(&self) -> &'static [NodeKind] {
        match self {
            NodeKind::Markup => &[NodeKind::Style, NodeKind::Script],
            NodeKind::Style => &[NodeKind::Style],
            NodeKind::Script => &[NodeKind::Script],
        }
    }

    /// Guess the kind of a file from its extension
    pub fn from_path(path: &Path) -> Option<NodeKind> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "html" | "htm" => Some(NodeKind::Markup),
            "css" => Some(NodeKind::Style),
            "js" | "mjs" | "cjs" => Some(NodeKind::Script),
            _ => None,
        }
    }
}

impl FromStr for NodeKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "markup" | "html" | "htm" | "document" => Ok(NodeKind::Markup),
            "style" | "css" | "stylesheet" => Ok(NodeKind::Style),
            "script" | "js" | "javascript" => Ok(NodeKind::Script),
            _ => Err(Error::UnknownKind(s.to_string())),
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
