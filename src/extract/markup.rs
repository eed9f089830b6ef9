//! Markup extractor
//!
//! Finds, on each line:
//! - `<link rel="stylesheet" href="...">` elements → style sheets
//! - `@import "..."` directives (inline `<style>` blocks) → style sheets
//! - `<script src="...">` elements whose source names a `.js` file → scripts

use super::framework::{ReferenceExtractor, quoted_after_each};
use crate::kind::NodeKind;
use regex::Regex;

/// Reference extractor for HTML documents
pub struct MarkupExtractor {
    patterns: Option<MarkupPatterns>,
}

struct MarkupPatterns {
    link: Regex,
    rel_stylesheet: Regex,
    href: Regex,
    script: Regex,
    src: Regex,
}

impl MarkupPatterns {
    fn compile() -> Option<Self> {
        Some(Self {
            link: Regex::new(r"(?i)<link\s[^>]*>").ok()?,
            rel_stylesheet: Regex::new(r#"(?i)\brel\s*=\s*["']?stylesheet\b"#).ok()?,
            href: Regex::new(r#"(?i)\bhref\s*=\s*["']([^"']*)"#).ok()?,
            script: Regex::new(r"(?i)<script\s[^>]*>").ok()?,
            src: Regex::new(r#"(?i)\bsrc\s*=\s*["']([^"']*)"#).ok()?,
        })
    }
}

/// Marker a script source must contain to count as a script file
const SCRIPT_MARKER: &str = ".js";

impl MarkupExtractor {
    pub fn new() -> Self {
        Self {
            patterns: MarkupPatterns::compile(),
        }
    }

    fn attribute<'a>(pattern: &Regex, element: &'a str) -> Option<&'a str> {
        pattern
            .captures(element)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .filter(|value| !value.is_empty())
    }
}

impl Default for MarkupExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceExtractor for MarkupExtractor {
    fn source_kind(&self) -> NodeKind {
        NodeKind::Markup
    }

    fn scan_line(&self, line: &str) -> Vec<(NodeKind, String)> {
        let Some(p) = &self.patterns else {
            return Vec::new();
        };
        let mut refs = Vec::new();

        for element in p.link.find_iter(line) {
            let element = element.as_str();
            if !p.rel_stylesheet.is_match(element) {
                continue;
            }
            if let Some(href) = Self::attribute(&p.href, element) {
                refs.push((NodeKind::Style, href.to_string()));
            }
        }

        for raw in quoted_after_each(line, "@import") {
            refs.push((NodeKind::Style, raw.to_string()));
        }

        for element in p.script.find_iter(line) {
            if let Some(src) = Self::attribute(&p.src, element.as_str()) {
                if src.contains(SCRIPT_MARKER) {
                    refs.push((NodeKind::Script, src.to_string()));
                }
            }
        }

        refs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> Vec<(NodeKind, String)> {
        MarkupExtractor::new()
            .extract(text)
            .map(|r| (r.target, r.raw))
            .collect()
    }

    fn style(s: &str) -> (NodeKind, String) {
        (NodeKind::Style, s.to_string())
    }

    fn script(s: &str) -> (NodeKind, String) {
        (NodeKind::Script, s.to_string())
    }

    #[test]
    fn test_stylesheet_link() {
        let refs = extract(r#"<link rel="stylesheet" href="css/main.css">"#);
        assert_eq!(refs, vec![style("css/main.css")]);
    }

    #[test]
    fn test_link_attribute_order_and_quotes() {
        let refs = extract("<link href='print.css' media=\"print\" rel='stylesheet' />");
        assert_eq!(refs, vec![style("print.css")]);
    }

    #[test]
    fn test_non_stylesheet_links_are_ignored() {
        let refs = extract(r#"<link rel="icon" href="favicon.ico"><link rel="preload" href="font.woff2">"#);
        assert!(refs.is_empty());
    }

    #[test]
    fn test_two_links_on_one_line() {
        let refs = extract(
            r#"<link rel="stylesheet" href="a.css"><link rel="stylesheet" href="b.css">"#,
        );
        assert_eq!(refs, vec![style("a.css"), style("b.css")]);
    }

    #[test]
    fn test_inline_import() {
        let text = "<style>\n  @import \"theme.css\";\n  @import url('print.css') print;\n</style>";
        assert_eq!(extract(text), vec![style("theme.css"), style("print.css")]);
    }

    #[test]
    fn test_script_src_requires_js_marker() {
        let text = r#"
            <script src="js/app.js"></script>
            <script type="text/template" src="view.tmpl"></script>
            <script>var inline = 1;</script>
            <script src='vendor/lib.min.js?v=2' defer></script>
        "#;
        assert_eq!(extract(text), vec![script("js/app.js"), script("vendor/lib.min.js?v=2")]);
    }

    #[test]
    fn test_mixed_document() {
        let text = r#"<html><head>
<link rel="stylesheet" href="style.css">
<script src="app.js"></script>
</head></html>"#;
        let refs: Vec<_> = MarkupExtractor::new().extract(text).collect();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].raw, "style.css");
        assert_eq!(refs[0].line, 2);
        assert_eq!(refs[1].target, NodeKind::Script);
        assert_eq!(refs[1].line, 3);
    }

    #[test]
    fn test_malformed_fragments_are_skipped() {
        let text = r#"
            <link rel="stylesheet" href="">
            <link rel="stylesheet">
            <script src=></script>
            @import ;
            <link rel="stylesheet"
                  href="split-across-lines.css">
        "#;
        assert!(extract(text).is_empty());
    }

    #[test]
    fn test_empty_document() {
        assert!(extract("").is_empty());
        assert!(extract("<p>no references here</p>").is_empty());
    }
}
