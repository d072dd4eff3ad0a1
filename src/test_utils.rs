//! Shared helpers for unit tests.

use crate::tree::TranslationUnit;
use std::path::Path;

/// Builds a translation unit over the given source with an empty arena, so
/// tests can push nodes with hand-picked kinds and spans.
#[must_use]
pub fn synthetic_unit(path: &str, source: &str) -> TranslationUnit {
    let empty = ruff_python_parser::parse_module("")
        .expect("empty module parses")
        .into_syntax();
    TranslationUnit::new(Path::new(path), source.to_owned(), empty)
}

/// Parses real Python source into a fully-lowered translation unit.
#[must_use]
pub fn parsed_unit(path: &str, source: &str) -> TranslationUnit {
    crate::tree::parse::parse_unit(Path::new(path), source.to_owned()).expect("valid test source")
}
