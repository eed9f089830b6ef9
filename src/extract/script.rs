//! Script extractor
//!
//! Every `require` on a line names another script through the first quoted
//! string that follows it: `require("util.js")`, `require(['a.js'], cb)`.
//! The string is kept as written; resolving it is the resolver's job.

use super::framework::{ReferenceExtractor, quoted_after_each};
use crate::kind::NodeKind;

/// Reference extractor for scripts
#[derive(Debug, Default)]
pub struct ScriptExtractor;

impl ScriptExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl ReferenceExtractor for ScriptExtractor {
    fn source_kind(&self) -> NodeKind {
        NodeKind::Script
    }

    fn scan_line(&self, line: &str) -> Vec<(NodeKind, String)> {
        quoted_after_each(line, "require")
            .into_iter()
            .map(|raw| (NodeKind::Script, raw.to_string()))
            .collect()
    }
}
