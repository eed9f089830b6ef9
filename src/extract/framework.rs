//! Core extractor framework
//!
//! Defines the trait every per-kind extractor implements, the registry that
//! picks one by source kind, and the small pattern helpers they share.

use crate::kind::NodeKind;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// A reference found in a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    /// Kind of the referenced file
    pub target: NodeKind,
    /// The reference exactly as written
    pub raw: String,
    /// Line the reference was found on (1-indexed)
    pub line: usize,
}

impl Reference {
    pub fn new(target: NodeKind, raw: impl Into<String>, line: usize) -> Self {
        Self {
            target,
            raw: raw.into(),
            line,
        }
    }
}

/// Trait for reference extractors
///
/// An extractor handles exactly one source kind. It only has to say what a
/// single line references; the default `extract` turns that into a lazy,
/// single-pass iterator over the whole text.
pub trait ReferenceExtractor: Send + Sync {
    /// The kind of file this extractor reads
    fn source_kind(&self) -> NodeKind;

    /// References on one line, in order of appearance
    fn scan_line(&self, line: &str) -> Vec<(NodeKind, String)>;

    /// Lazily extract every reference in `text`
    fn extract<'a>(&'a self, text: &'a str) -> Box<dyn Iterator<Item = Reference> + 'a> {
        Box::new(text.lines().enumerate().flat_map(move |(idx, line)| {
            self.scan_line(line)
                .into_iter()
                .map(move |(target, raw)| Reference::new(target, raw, idx + 1))
        }))
    }
}

/// Registry of reference extractors
#[derive(Default)]
pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn ReferenceExtractor>>,
}

impl ExtractorRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an extractor. A later registration for the same kind wins.
    pub fn register(&mut self, extractor: impl ReferenceExtractor + 'static) {
        let kind = extractor.source_kind();
        self.extractors.retain(|e| e.source_kind() != kind);
        self.extractors.push(Box::new(extractor));
    }

    /// Find the extractor for a source kind
    pub fn find(&self, kind: NodeKind) -> Option<&dyn ReferenceExtractor> {
        self.extractors
            .iter()
            .find(|e| e.source_kind() == kind)
            .map(|e| e.as_ref())
    }

    /// Extract references from `text`; empty when no extractor handles `kind`
    pub fn extract<'a>(
        &'a self,
        kind: NodeKind,
        text: &'a str,
    ) -> Box<dyn Iterator<Item = Reference> + 'a> {
        match self.find(kind) {
            Some(extractor) => extractor.extract(text),
            None => Box::new(std::iter::empty()),
        }
    }
}

/// Create a default registry with the three built-in extractors
pub fn default_registry() -> ExtractorRegistry {
    let mut registry = ExtractorRegistry::new();
    registry.register(super::markup::MarkupExtractor::new());
    registry.register(super::style::StyleExtractor::new());
    registry.register(super::script::ScriptExtractor::new());
    registry
}

fn quoted_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"["']([^"']*)"#).ok()).as_ref()
}

/// First quoted string in `s`. Empty strings count as no match.
pub(crate) fn first_quoted(s: &str) -> Option<&str> {
    quoted_re()?
        .captures(s)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|value| !value.is_empty())
}

/// The first quoted string after each occurrence of `keyword` in `line`.
///
/// `@import "a.css"; @import "b.css";` yields both paths.
pub(crate) fn quoted_after_each<'a>(line: &'a str, keyword: &str) -> Vec<&'a str> {
    line.match_indices(keyword)
        .filter_map(|(idx, _)| first_quoted(&line[idx + keyword.len()..]))
        .collect()
}
