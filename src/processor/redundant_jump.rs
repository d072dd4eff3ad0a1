//! S3626: a `continue` statement that ends a loop body.

use crate::processor::{delete_statement, RepairError};
use crate::tree::{NodeId, NodeKind, TranslationUnit};

/// Repairable when the `continue` sits directly inside a loop, is the last
/// of its attached statement siblings, and is not the only statement left
/// (deleting it would otherwise empty the body).
pub(super) fn is_repairable(unit: &TranslationUnit, id: NodeId) -> bool {
    let node = unit.node(id);
    let parent_is_loop = node
        .parent
        .is_some_and(|p| matches!(unit.node(p).kind, NodeKind::While | NodeKind::For));
    if !parent_is_loop {
        return false;
    }
    let siblings = unit.statement_siblings(id);
    !siblings.is_empty() && siblings.iter().all(|&s| unit.node(s).start < node.start)
}

pub(super) fn repair(unit: &mut TranslationUnit, id: NodeId) -> Result<(), RepairError> {
    delete_statement(unit, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::Processor;
    use crate::test_utils::parsed_unit;

    fn continue_node(unit: &TranslationUnit) -> NodeId {
        unit.node_ids()
            .find(|&id| unit.node(id).kind == NodeKind::Continue)
            .unwrap()
    }

    #[test]
    fn trailing_continue_is_repairable() {
        let unit = parsed_unit("/proj/a.py", "for x in xs:\n    f(x)\n    continue\n");
        assert!(Processor::RedundantJump.is_repairable(&unit, continue_node(&unit)));
    }

    #[test]
    fn mid_body_continue_is_not_repairable() {
        let unit = parsed_unit("/proj/a.py", "for x in xs:\n    continue\n    f(x)\n");
        assert!(!Processor::RedundantJump.is_repairable(&unit, continue_node(&unit)));
    }

    #[test]
    fn lone_continue_is_not_repairable() {
        let unit = parsed_unit("/proj/a.py", "while x:\n    continue\n");
        assert!(!Processor::RedundantJump.is_repairable(&unit, continue_node(&unit)));
    }

    #[test]
    fn continue_outside_a_loop_body_is_not_repairable() {
        // The guard also rejects a continue nested one statement deeper, so
        // only the loop body's own trailing jump is ever deleted.
        let unit = parsed_unit(
            "/proj/a.py",
            "for x in xs:\n    if x:\n        continue\n",
        );
        assert!(!Processor::RedundantJump.is_repairable(&unit, continue_node(&unit)));
    }

    #[test]
    fn repair_deletes_the_jump() {
        let mut unit = parsed_unit("/proj/a.py", "while x:\n    f()\n    continue\n");
        let id = continue_node(&unit);
        Processor::RedundantJump.repair(&mut unit, id).unwrap();

        let rendered =
            crate::tree::rewrite::apply_edits(unit.source(), unit.edits()).unwrap();
        assert_eq!(rendered, "while x:\n    f()\n");
    }
}
