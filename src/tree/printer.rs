//! Serializes translation units back to source text.

use crate::tree::rewrite::{apply_edits, RewriteError};
use crate::tree::TranslationUnit;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// How a unit is rendered back to text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrettyPrintingStrategy {
    /// Minimal diff: only the recorded edits change the file.
    #[default]
    Sniper,
    /// Edits plus normalization: trailing whitespace is stripped from every
    /// line and the file is terminated with a newline.
    Normal,
}

impl FromStr for PrettyPrintingStrategy {
    type Err = StrategyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "sniper" => Ok(Self::Sniper),
            "normal" => Ok(Self::Normal),
            _ => Err(StrategyParseError {
                value: s.to_owned(),
                expected: "sniper, normal",
            }),
        }
    }
}

/// Unrecognized strategy name supplied by the frontend.
#[derive(Debug, Clone, Error)]
#[error("unknown strategy {value:?} (expected one of: {expected})")]
pub struct StrategyParseError {
    /// The rejected input.
    pub value: String,
    /// Comma-separated list of accepted names.
    pub expected: &'static str,
}

/// Renders a unit's source with all recorded edits applied.
///
/// # Errors
///
/// Returns a [`RewriteError`] when the recorded edits cannot be applied.
pub fn render_unit(
    unit: &TranslationUnit,
    strategy: PrettyPrintingStrategy,
) -> Result<String, RewriteError> {
    let rendered = apply_edits(unit.source(), unit.edits())?;
    Ok(match strategy {
        PrettyPrintingStrategy::Sniper => rendered,
        PrettyPrintingStrategy::Normal => normalize(&rendered),
    })
}

/// Renders a unit and writes it to `dest`, creating parent directories.
///
/// # Errors
///
/// Fails when rendering fails or the destination cannot be written.
pub fn write_unit(
    unit: &TranslationUnit,
    strategy: PrettyPrintingStrategy,
    dest: &Path,
) -> Result<()> {
    let rendered = render_unit(unit, strategy)
        .with_context(|| format!("rendering {}", unit.path().display()))?;
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {}", parent.display()))?;
    }
    fs::write(dest, rendered).with_context(|| format!("writing {}", dest.display()))
}

fn normalize(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    for line in source.split_inclusive('\n') {
        let (content, newline) = match line.strip_suffix('\n') {
            Some(rest) => (rest, true),
            None => (line, false),
        };
        out.push_str(content.trim_end_matches([' ', '\t', '\r']));
        if newline {
            out.push('\n');
        }
    }
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::synthetic_unit;
    use crate::tree::rewrite::Edit;

    #[test]
    fn sniper_touches_only_edited_ranges() {
        let mut unit = synthetic_unit("/proj/a.py", "x = 1   \ny == None\n");
        let pos = unit.source().find("==").unwrap();
        unit.try_add_edit(Edit::new(pos, pos + 2, "is")).unwrap();

        let rendered = render_unit(&unit, PrettyPrintingStrategy::Sniper).unwrap();
        assert_eq!(rendered, "x = 1   \ny is None\n");
    }

    #[test]
    fn normal_strips_trailing_whitespace_and_adds_final_newline() {
        let unit = synthetic_unit("/proj/a.py", "x = 1   \ny = 2\t");
        let rendered = render_unit(&unit, PrettyPrintingStrategy::Normal).unwrap();
        assert_eq!(rendered, "x = 1\ny = 2\n");
    }

    #[test]
    fn strategy_names_parse_case_insensitively() {
        assert_eq!(
            "SNIPER".parse::<PrettyPrintingStrategy>().unwrap(),
            PrettyPrintingStrategy::Sniper
        );
        assert_eq!(
            "normal".parse::<PrettyPrintingStrategy>().unwrap(),
            PrettyPrintingStrategy::Normal
        );
        assert!("pretty".parse::<PrettyPrintingStrategy>().is_err());
    }
}
