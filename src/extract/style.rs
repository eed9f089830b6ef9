//! Style sheet extractor
//!
//! Every `@import` on a line names another style sheet through the first
//! quoted string that follows it, so both `@import "a.css";` and
//! `@import url('a.css');` are found. Unquoted `url(a.css)` is not.

use super::framework::{ReferenceExtractor, quoted_after_each};
use crate::kind::NodeKind;

/// Reference extractor for style sheets
#[derive(Debug, Default)]
pub struct StyleExtractor;

impl StyleExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl ReferenceExtractor for StyleExtractor {
    fn source_kind(&self) -> NodeKind {
        NodeKind::Style
    }

    fn scan_line(&self, line: &str) -> Vec<(NodeKind, String)> {
        quoted_after_each(line, "@import")
            .into_iter()
            .map(|raw| (NodeKind::Style, raw.to_string()))
            .collect()
    }
}
