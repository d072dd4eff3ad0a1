//! The violation position model: an immutable record of one diagnostic.

use crate::utils::normalize_path;
use std::fmt;
use std::path::{Path, PathBuf};

/// A rule violation reported by the analyzer against a source position.
///
/// Line numbers are 1-based; columns are 0-based character offsets within
/// their line. A violation is a standalone fact record: construction never
/// validates anything against a tree.
///
/// The derived ordering is lexicographic on (file, `start_line`, `start_col`,
/// `end_line`, `end_col`), with the rule key and check name as final
/// tie-breakers. That order is the single source of determinism for matching
/// and repair iteration. Equality and hashing use the same fields, which
/// deduplicates identical diagnostics across repeated analyzer runs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Violation {
    file: PathBuf,
    start_line: usize,
    start_col: usize,
    end_line: usize,
    end_col: usize,
    rule_key: String,
    check_name: String,
}

impl Violation {
    /// Creates a violation record. The file path is normalized to an
    /// absolute, canonical form so it compares equal to translation-unit
    /// paths regardless of how the analyzer spelled it.
    #[must_use]
    pub fn new(
        rule_key: impl Into<String>,
        check_name: impl Into<String>,
        file: &Path,
        start_line: usize,
        start_col: usize,
        end_line: usize,
        end_col: usize,
    ) -> Self {
        Self {
            file: normalize_path(file),
            start_line,
            start_col,
            end_line,
            end_col,
            rule_key: rule_key.into(),
            check_name: check_name.into(),
        }
    }

    /// Key of the violated rule, e.g. `"S1116"`.
    #[must_use]
    pub fn rule_key(&self) -> &str {
        &self.rule_key
    }

    /// Name of the check that produced this violation.
    #[must_use]
    pub fn check_name(&self) -> &str {
        &self.check_name
    }

    /// Normalized absolute path of the offending file.
    #[must_use]
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// 1-based line on which the violation starts.
    #[must_use]
    pub fn start_line(&self) -> usize {
        self.start_line
    }

    /// 0-based character column at which the violation starts.
    #[must_use]
    pub fn start_col(&self) -> usize {
        self.start_col
    }

    /// 1-based line on which the violation ends.
    #[must_use]
    pub fn end_line(&self) -> usize {
        self.end_line
    }

    /// 0-based character column at which the violation ends.
    #[must_use]
    pub fn end_col(&self) -> usize {
        self.end_col
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {}:{}:{}",
            self.rule_key,
            self.file.display(),
            self.start_line,
            self.start_col
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn violation(file: &str, sl: usize, sc: usize, el: usize, ec: usize) -> Violation {
        Violation::new("S1116", "NeedlessPassCheck", Path::new(file), sl, sc, el, ec)
    }

    #[test]
    fn ordering_is_lexicographic_on_position() {
        let a = violation("/proj/a.py", 3, 0, 3, 4);
        let b = violation("/proj/a.py", 3, 2, 3, 4);
        let c = violation("/proj/a.py", 10, 0, 10, 4);
        let d = violation("/proj/b.py", 1, 0, 1, 1);

        assert!(a < b);
        assert!(b < c);
        assert!(c < d);
    }

    #[test]
    fn identical_diagnostics_deduplicate() {
        let mut set = BTreeSet::new();
        set.insert(violation("/proj/a.py", 3, 0, 3, 4));
        set.insert(violation("/proj/a.py", 3, 0, 3, 4));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn distinct_rules_at_same_position_both_survive() {
        let mut set = BTreeSet::new();
        set.insert(violation("/proj/a.py", 3, 0, 3, 4));
        set.insert(Violation::new(
            "S5727",
            "ComparisonToNoneCheck",
            Path::new("/proj/a.py"),
            3,
            0,
            3,
            4,
        ));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn file_path_is_normalized() {
        let v = violation("/proj/pkg/../a.py", 1, 0, 1, 1);
        assert_eq!(v.file(), Path::new("/proj/a.py"));
    }
}
