//! File name legality
//!
//! Some names are refused even where the host filesystem allows them, so a
//! project behaves the same on every platform: names with path or shell
//! metacharacters, dot-only names and the reserved Windows device names.

use regex::Regex;
use std::sync::OnceLock;

/// Characters that may not appear anywhere in a file name
pub const ILLEGAL_CHARACTERS: &[char] = &['/', '?', '*', ':', ';', '{', '}', '<', '>', '\\', '|'];

fn reserved_name_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(\.+|com[1-9]|lpt[1-9]|nul|con|prn|aux)$").ok())
        .as_ref()
}

/// Check a bare file name (no directory part) for illegal characters or reserved names.
pub fn is_legal_filename(name: &str) -> bool {
    if name.contains(ILLEGAL_CHARACTERS) {
        return false;
    }
    match reserved_name_re() {
        Some(re) => !re.is_match(name),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinary_names_are_legal() {
        for name in ["index.html", "about-us.html", "con.html", "com10", "nul.txt", ".hidden.html"] {
            assert!(is_legal_filename(name), "{} should be legal", name);
        }
    }

    #[test]
    fn test_illegal_characters() {
        for name in ["a*b.html", "what?.html", "a:b", "x;y", "{a}", "<a>", "a\\b", "a|b", "a/b"] {
            assert!(!is_legal_filename(name), "{} should be illegal", name);
        }
    }

    #[test]
    fn test_reserved_names() {
        for name in [".", "..", "...", "con", "CON", "Prn", "aux", "nul", "com1", "COM9", "lpt1", "LPT9"] {
            assert!(!is_legal_filename(name), "{} should be illegal", name);
        }
    }
}
