//! S5727: `x == None` / `x != None` rewritten to identity comparison.

use crate::constants::comparison_to_none_re;
use crate::processor::RepairError;
use crate::tree::rewrite::Edit;
use crate::tree::{NodeId, NodeKind, TranslationUnit};

/// Repairable when the comparison has a direct `None` literal operand and
/// its text ends in `== None` / `!= None`. Chained comparisons still match
/// as long as `None` is the final comparator.
pub(super) fn is_repairable(unit: &TranslationUnit, id: NodeId) -> bool {
    let has_none_operand = unit
        .node_ids()
        .any(|child| {
            let node = unit.node(child);
            node.parent == Some(id) && node.kind == NodeKind::NoneLiteral
        });
    has_none_operand && comparison_to_none_re().is_match(unit.span_text(id))
}

pub(super) fn repair(unit: &mut TranslationUnit, id: NodeId) -> Result<(), RepairError> {
    let edit = {
        let start = unit.node(id).start;
        let caps = comparison_to_none_re()
            .captures(unit.span_text(id))
            .ok_or(RepairError::UnsupportedShape {
                expected: "a comparison against None",
            })?;
        // Capture 2 is the operator adjacent to the trailing None.
        let op = caps.get(2).ok_or(RepairError::UnsupportedShape {
            expected: "a comparison against None",
        })?;
        let replacement = if op.as_str() == "==" { "is" } else { "is not" };
        Edit::new(start + op.start(), start + op.end(), replacement)
    };
    unit.try_add_edit(edit).map_err(RepairError::EditConflict)
}
