//! The rule detectors.
//!
//! Block-structure rules walk the parsed AST so that statement grouping is
//! exact; text-shape rules scan the lowered arena, where spans and kind tags
//! are enough.

use crate::constants::{bare_except_re, comparison_to_none_re};
use crate::processor::Processor;
use crate::tree::{NodeKind, TranslationUnit};
use crate::violation::Violation;
use ruff_python_ast::{ExceptHandler, Stmt};
use ruff_text_size::Ranged;
use std::collections::BTreeSet;

pub(super) fn check(
    unit: &TranslationUnit,
    processor: Processor,
    out: &mut BTreeSet<Violation>,
) {
    match processor {
        Processor::NeedlessPass => needless_pass(unit, out),
        Processor::RedundantJump => redundant_jump(unit, out),
        Processor::ComparisonToNone => comparison_to_none(unit, out),
        Processor::BareExcept => bare_except(unit, out),
    }
}

/// S1116: `pass` in a block that has other statements.
fn needless_pass(unit: &TranslationUnit, out: &mut BTreeSet<Violation>) {
    visit_bodies(&unit.ast().body, false, &mut |body, _| {
        if body.len() < 2 {
            return;
        }
        for stmt in body {
            if let Stmt::Pass(node) = stmt {
                emit(unit, Processor::NeedlessPass, ranged_span(node), out);
            }
        }
    });
}

/// S3626: `continue` as the last statement of a loop body.
fn redundant_jump(unit: &TranslationUnit, out: &mut BTreeSet<Violation>) {
    visit_bodies(&unit.ast().body, false, &mut |body, is_loop_body| {
        if !is_loop_body {
            return;
        }
        if let Some(Stmt::Continue(node)) = body.last() {
            emit(unit, Processor::RedundantJump, ranged_span(node), out);
        }
    });
}

/// S5727: comparison whose final comparator is the `None` literal.
fn comparison_to_none(unit: &TranslationUnit, out: &mut BTreeSet<Violation>) {
    for id in unit.node_ids() {
        let node = unit.node(id);
        if node.kind != NodeKind::Compare {
            continue;
        }
        let has_none_operand = unit.node_ids().any(|child| {
            let c = unit.node(child);
            c.parent == Some(id) && c.kind == NodeKind::NoneLiteral
        });
        if has_none_operand && comparison_to_none_re().is_match(unit.span_text(id)) {
            emit(unit, Processor::ComparisonToNone, (node.start, node.end), out);
        }
    }
}

/// S5754: bare `except:` clause. The reported span runs from the `except`
/// keyword through the colon.
fn bare_except(unit: &TranslationUnit, out: &mut BTreeSet<Violation>) {
    for id in unit.node_ids() {
        let node = unit.node(id);
        if node.kind != NodeKind::ExceptHandler {
            continue;
        }
        if let Some(caps) = bare_except_re().captures(unit.span_text(id)) {
            if let Some(colon) = caps.get(2) {
                emit(
                    unit,
                    Processor::BareExcept,
                    (node.start, node.start + colon.end()),
                    out,
                );
            }
        }
    }
}

fn ranged_span(ranged: &impl Ranged) -> (usize, usize) {
    let range = ranged.range();
    (range.start().to_usize(), range.end().to_usize())
}

fn emit(
    unit: &TranslationUnit,
    processor: Processor,
    span: (usize, usize),
    out: &mut BTreeSet<Violation>,
) {
    let source = unit.source();
    let (start_line, start_col) = unit.line_index().location(source, span.0);
    let (end_line, end_col) = unit.line_index().location(source, span.1);
    out.insert(Violation::new(
        processor.rule_key(),
        processor.check_name(),
        unit.path(),
        start_line,
        start_col,
        end_line,
        end_col,
    ));
}

/// Calls `f` on every statement block in the module, with a flag telling
/// whether the block is the direct body of a loop. Loop `else` clauses and
/// nested conditionals are ordinary blocks.
fn visit_bodies(body: &[Stmt], is_loop_body: bool, f: &mut impl FnMut(&[Stmt], bool)) {
    f(body, is_loop_body);
    for stmt in body {
        match stmt {
            Stmt::FunctionDef(n) => visit_bodies(&n.body, false, f),
            Stmt::ClassDef(n) => visit_bodies(&n.body, false, f),
            Stmt::If(n) => {
                visit_bodies(&n.body, false, f);
                for clause in &n.elif_else_clauses {
                    visit_bodies(&clause.body, false, f);
                }
            }
            Stmt::While(n) => {
                visit_bodies(&n.body, true, f);
                visit_bodies(&n.orelse, false, f);
            }
            Stmt::For(n) => {
                visit_bodies(&n.body, true, f);
                visit_bodies(&n.orelse, false, f);
            }
            Stmt::With(n) => visit_bodies(&n.body, false, f),
            Stmt::Try(n) => {
                visit_bodies(&n.body, false, f);
                for handler in &n.handlers {
                    let ExceptHandler::ExceptHandler(h) = handler;
                    visit_bodies(&h.body, false, f);
                }
                visit_bodies(&n.orelse, false, f);
                visit_bodies(&n.finalbody, false, f);
            }
            Stmt::Match(n) => {
                for case in &n.cases {
                    visit_bodies(&case.body, false, f);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::parsed_unit;

    fn violations_for(source: &str, processor: Processor) -> Vec<Violation> {
        let unit = parsed_unit("/proj/a.py", source);
        let mut out = BTreeSet::new();
        check(&unit, processor, &mut out);
        out.into_iter().collect()
    }

    #[test]
    fn lone_pass_in_a_block_is_not_flagged() {
        let found = violations_for("def f():\n    pass\n", Processor::NeedlessPass);
        assert!(found.is_empty());
    }

    #[test]
    fn pass_next_to_other_statements_is_flagged_with_its_span() {
        let found = violations_for(
            "def f():\n    pass\n    return 1\n",
            Processor::NeedlessPass,
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].start_line(), 2);
        assert_eq!(found[0].start_col(), 4);
        assert_eq!(found[0].end_col(), 8);
    }

    #[test]
    fn only_trailing_continue_is_flagged() {
        let flagged = violations_for(
            "for x in xs:\n    f(x)\n    continue\n",
            Processor::RedundantJump,
        );
        assert_eq!(flagged.len(), 1);

        let not_flagged = violations_for(
            "for x in xs:\n    continue\n    f(x)\n",
            Processor::RedundantJump,
        );
        assert!(not_flagged.is_empty());
    }

    #[test]
    fn continue_inside_nested_if_is_not_flagged() {
        let found = violations_for(
            "for x in xs:\n    if x:\n        continue\n",
            Processor::RedundantJump,
        );
        assert!(found.is_empty());
    }

    #[test]
    fn none_comparison_reports_the_compare_span() {
        let found = violations_for("y = x == None\n", Processor::ComparisonToNone);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].start_col(), 4);
        assert_eq!(found[0].end_col(), 13);
    }

    #[test]
    fn none_on_the_left_is_not_flagged() {
        let found = violations_for("y = None == x\n", Processor::ComparisonToNone);
        assert!(found.is_empty());
    }

    #[test]
    fn bare_except_span_ends_at_the_colon() {
        let found = violations_for(
            "try:\n    f()\nexcept:\n    pass\n",
            Processor::BareExcept,
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].start_line(), 3);
        assert_eq!(found[0].start_col(), 0);
        assert_eq!(found[0].end_col(), 7);
    }

    #[test]
    fn typed_except_is_not_flagged() {
        let found = violations_for(
            "try:\n    f()\nexcept ValueError:\n    pass\n",
            Processor::BareExcept,
        );
        assert!(found.is_empty());
    }
}
