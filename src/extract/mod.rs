//! Reference extraction
//!
//! Each file kind has an extractor that scans text line by line for the
//! patterns that name other files. Extraction is pattern matching, not
//! parsing: references built at runtime or split across lines are not found.

pub mod framework;
pub mod markup;
pub mod style;
pub mod script;

pub use framework::{ExtractorRegistry, Reference, ReferenceExtractor, default_registry};
pub use markup::MarkupExtractor;
pub use script::ScriptExtractor;
pub use style::StyleExtractor;
