//! S5754: a bare `except:` clause narrowed to `except Exception:`.

use crate::constants::bare_except_re;
use crate::processor::RepairError;
use crate::tree::rewrite::Edit;
use crate::tree::{NodeId, TranslationUnit};

pub(super) fn is_repairable(unit: &TranslationUnit, id: NodeId) -> bool {
    bare_except_re().is_match(unit.span_text(id))
}

pub(super) fn repair(unit: &mut TranslationUnit, id: NodeId) -> Result<(), RepairError> {
    let edit = {
        let start = unit.node(id).start;
        let caps = bare_except_re()
            .captures(unit.span_text(id))
            .ok_or(RepairError::UnsupportedShape {
                expected: "a bare except clause",
            })?;
        let keyword = caps.get(1).ok_or(RepairError::UnsupportedShape {
            expected: "a bare except clause",
        })?;
        let colon = caps.get(2).ok_or(RepairError::UnsupportedShape {
            expected: "a bare except clause",
        })?;
        // Replace whatever sits between the keyword and the colon.
        Edit::new(start + keyword.end(), start + colon.start(), " Exception")
    };
    unit.try_add_edit(edit).map_err(RepairError::EditConflict)
}
