//! Rule-specific repair policies.
//!
//! Each supported rule is one variant of the closed [`Processor`] enum. A
//! processor is a stateless policy: it judges whether a candidate node can be
//! repaired in context, and performs the mutation by recording edits (and
//! detach marks, for deletions) against the node's translation unit. Lookup
//! is by rule key via [`Processor::for_rule`].

mod bare_except;
mod comparison_to_none;
mod needless_pass;
mod redundant_jump;

use crate::tree::rewrite::{Edit, RewriteError};
use crate::tree::{NodeId, NodeKind, TranslationUnit};
use std::fmt;
use thiserror::Error;

/// The repair policies shipped with this tool, one per rule key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Processor {
    /// S1116: `pass` in a block that has other statements.
    NeedlessPass,
    /// S3626: `continue` as the last statement of a loop body.
    RedundantJump,
    /// S5727: `== None` / `!= None` comparisons.
    ComparisonToNone,
    /// S5754: bare `except:` clauses.
    BareExcept,
}

/// All processors, in rule-key order.
pub const ALL_PROCESSORS: [Processor; 4] = [
    Processor::NeedlessPass,
    Processor::RedundantJump,
    Processor::ComparisonToNone,
    Processor::BareExcept,
];

impl Processor {
    /// Looks up the processor for a rule key. `None` means the rule is not
    /// supported; callers treat that as a fatal configuration error.
    #[must_use]
    pub fn for_rule(rule_key: &str) -> Option<Self> {
        ALL_PROCESSORS
            .into_iter()
            .find(|p| p.rule_key() == rule_key)
    }

    /// Rule key this processor repairs.
    #[must_use]
    pub fn rule_key(self) -> &'static str {
        match self {
            Self::NeedlessPass => "S1116",
            Self::RedundantJump => "S3626",
            Self::ComparisonToNone => "S5727",
            Self::BareExcept => "S5754",
        }
    }

    /// Name of the analyzer check backing this rule.
    #[must_use]
    pub fn check_name(self) -> &'static str {
        match self {
            Self::NeedlessPass => "NeedlessPassCheck",
            Self::RedundantJump => "RedundantJumpCheck",
            Self::ComparisonToNone => "ComparisonToNoneCheck",
            Self::BareExcept => "BareExceptCheck",
        }
    }

    /// One-line human description, for the rules listing.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::NeedlessPass => "Remove `pass` statements from blocks that have other statements",
            Self::RedundantJump => "Remove `continue` statements that end a loop body",
            Self::ComparisonToNone => "Rewrite `== None` / `!= None` to `is None` / `is not None`",
            Self::BareExcept => "Narrow bare `except:` clauses to `except Exception:`",
        }
    }

    /// Node kind this processor targets; the matcher only ever offers nodes
    /// of this kind.
    #[must_use]
    pub fn target_kind(self) -> NodeKind {
        match self {
            Self::NeedlessPass => NodeKind::Pass,
            Self::RedundantJump => NodeKind::Continue,
            Self::ComparisonToNone => NodeKind::Compare,
            Self::BareExcept => NodeKind::ExceptHandler,
        }
    }

    /// Coarse shape filter: does the node's kind match the target kind?
    #[must_use]
    pub fn is_applicable(self, unit: &TranslationUnit, id: NodeId) -> bool {
        unit.node(id).kind == self.target_kind()
    }

    /// Context-sensitive precondition, evaluated against the node inside its
    /// unit. Pure with respect to the tree.
    #[must_use]
    pub fn is_repairable(self, unit: &TranslationUnit, id: NodeId) -> bool {
        unit.is_attached(id)
            && match self {
                Self::NeedlessPass => needless_pass::is_repairable(unit, id),
                Self::RedundantJump => redundant_jump::is_repairable(unit, id),
                Self::ComparisonToNone => comparison_to_none::is_repairable(unit, id),
                Self::BareExcept => bare_except::is_repairable(unit, id),
            }
    }

    /// Performs the repair by recording edits against the unit. A failure
    /// leaves the unit untouched beyond the node's own locality.
    ///
    /// # Errors
    ///
    /// Returns a [`RepairError`] when the edit collides with an earlier
    /// repair or the node's text no longer has the expected shape.
    pub fn repair(self, unit: &mut TranslationUnit, id: NodeId) -> Result<(), RepairError> {
        match self {
            Self::NeedlessPass => needless_pass::repair(unit, id),
            Self::RedundantJump => redundant_jump::repair(unit, id),
            Self::ComparisonToNone => comparison_to_none::repair(unit, id),
            Self::BareExcept => bare_except::repair(unit, id),
        }
    }
}

impl fmt::Display for Processor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.rule_key(), self.check_name())
    }
}

/// Failure of a single repair. Scoped to one node; the rule's pass continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepairError {
    /// The repair's edit collides with one recorded by an earlier repair.
    #[error("edit conflict: {0}")]
    EditConflict(#[source] RewriteError),
    /// The node's source text did not have the shape the rule expects.
    #[error("node text does not look like {expected}")]
    UnsupportedShape {
        /// What was expected, for the log line.
        expected: &'static str,
    },
}

/// Deletes a statement node: records the edit and detaches the subtree.
///
/// When the statement stands alone on a single line the whole line goes,
/// newline included. Statements sharing a line via `;` separators lose the
/// separator too, whichever side it is on.
pub(crate) fn delete_statement(
    unit: &mut TranslationUnit,
    id: NodeId,
) -> Result<(), RepairError> {
    let (start, end) = {
        let node = unit.node(id);
        (node.start, node.end)
    };
    let edit = {
        let source = unit.source();
        let line = unit.line_index().line_of(start);
        let (line_start, line_end) = unit.line_index().line_span(source, line);
        let alone_on_line = end <= line_end
            && source[line_start..start].trim().is_empty()
            && source[end..line_end].trim().is_empty();
        if alone_on_line {
            Edit::delete(line_start, line_end)
        } else {
            let (wide_start, wide_end) = expand_over_separator(source, start, end);
            Edit::delete(wide_start, wide_end)
        }
    };
    unit.try_add_edit(edit).map_err(RepairError::EditConflict)?;
    unit.detach(id);
    Ok(())
}

/// Widens `[start, end)` over an adjacent `;` separator so that deleting an
/// inline statement does not leave a dangling semicolon.
fn expand_over_separator(source: &str, start: usize, end: usize) -> (usize, usize) {
    let bytes = source.as_bytes();

    // Trailing separator: "pass; x = 1" -> consume "; ".
    let mut after = end;
    while after < bytes.len() && matches!(bytes[after], b' ' | b'\t') {
        after += 1;
    }
    if after < bytes.len() && bytes[after] == b';' {
        after += 1;
        while after < bytes.len() && matches!(bytes[after], b' ' | b'\t') {
            after += 1;
        }
        return (start, after);
    }

    // Leading separator: "x = 1; pass" -> consume "; ".
    let mut before = start;
    while before > 0 && matches!(bytes[before - 1], b' ' | b'\t') {
        before -= 1;
    }
    if before > 0 && bytes[before - 1] == b';' {
        return (before - 1, end);
    }

    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::parsed_unit;

    fn node_of_kind(unit: &TranslationUnit, kind: NodeKind) -> NodeId {
        unit.node_ids()
            .find(|&id| unit.node(id).kind == kind)
            .unwrap()
    }

    #[test]
    fn for_rule_covers_the_whole_catalog() {
        for processor in ALL_PROCESSORS {
            assert_eq!(Processor::for_rule(processor.rule_key()), Some(processor));
        }
        assert_eq!(Processor::for_rule("S9999"), None);
    }

    #[test]
    fn delete_statement_removes_whole_line_when_alone() {
        let mut unit = parsed_unit("/proj/a.py", "def f():\n    pass\n    return 1\n");
        let pass = node_of_kind(&unit, NodeKind::Pass);
        delete_statement(&mut unit, pass).unwrap();

        let rendered =
            crate::tree::rewrite::apply_edits(unit.source(), unit.edits()).unwrap();
        assert_eq!(rendered, "def f():\n    return 1\n");
        assert!(!unit.is_attached(pass));
    }

    #[test]
    fn delete_statement_consumes_inline_separator() {
        let mut unit = parsed_unit("/proj/a.py", "def f():\n    pass; x = 1\n");
        let pass = node_of_kind(&unit, NodeKind::Pass);
        delete_statement(&mut unit, pass).unwrap();

        let rendered =
            crate::tree::rewrite::apply_edits(unit.source(), unit.edits()).unwrap();
        assert_eq!(rendered, "def f():\n    x = 1\n");
    }

    #[test]
    fn delete_statement_consumes_leading_separator() {
        let mut unit = parsed_unit("/proj/a.py", "def f():\n    x = 1; pass\n");
        let pass = node_of_kind(&unit, NodeKind::Pass);
        delete_statement(&mut unit, pass).unwrap();

        let rendered =
            crate::tree::rewrite::apply_edits(unit.source(), unit.edits()).unwrap();
        assert_eq!(rendered, "def f():\n    x = 1\n");
    }
}
