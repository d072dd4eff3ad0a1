//! The analyzer boundary.
//!
//! Detectors inspect parsed units and report purely textual [`Violation`]
//! records (1-based lines, 0-based character columns). No tree node ever
//! crosses this boundary; the matcher re-derives node identity from the
//! reported positions.

mod checks;

use crate::processor::Processor;
use crate::tree::{UnitId, Workspace};
use crate::violation::Violation;
use std::collections::BTreeSet;

/// Runs the detectors for the given rules over a set of units. The returned
/// set deduplicates identical diagnostics and iterates in violation order.
#[must_use]
pub fn analyze_units(
    workspace: &Workspace,
    units: &[UnitId],
    processors: &[Processor],
) -> BTreeSet<Violation> {
    let mut violations = BTreeSet::new();
    for &unit_id in units {
        let unit = workspace.unit(unit_id);
        for &processor in processors {
            checks::check(unit, processor, &mut violations);
        }
    }
    violations
}

/// Runs the detectors over every loaded unit.
#[must_use]
pub fn analyze(workspace: &Workspace, processors: &[Processor]) -> BTreeSet<Violation> {
    let units: Vec<UnitId> = workspace.iter().map(|(id, _)| id).collect();
    analyze_units(workspace, &units, processors)
}
