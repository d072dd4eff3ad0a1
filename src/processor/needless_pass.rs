//! S1116: a `pass` statement in a block that already has other statements.

use crate::processor::{delete_statement, RepairError};
use crate::tree::{NodeId, TranslationUnit};

/// Repairable when the `pass` still has at least one attached statement
/// sibling; deleting the only statement of a block would leave it empty,
/// which is not valid Python.
pub(super) fn is_repairable(unit: &TranslationUnit, id: NodeId) -> bool {
    !unit.statement_siblings(id).is_empty()
}

pub(super) fn repair(unit: &mut TranslationUnit, id: NodeId) -> Result<(), RepairError> {
    delete_statement(unit, id)
}
