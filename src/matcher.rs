//! Violation-to-node best-fit matching.
//!
//! Analyzer diagnostics are textual (line/column); repairs need tree nodes.
//! This module reconciles the two: one pass over the loaded units collects
//! candidate nodes per violation, candidates are scored by how much of their
//! span the violation covers, and each violation claims at most one node.
//! The resulting map is injective by construction.

use crate::processor::Processor;
use crate::tree::{NodeHandle, NodeId, TranslationUnit, UnitId, Workspace};
use crate::violation::Violation;
use rustc_hash::{FxHashMap, FxHashSet};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Two intersection fractions closer than this are treated as a tie, and
/// the tie goes to the candidate with the larger span: when overlap is
/// ambiguous, the wider node is the safer fit.
pub const INTERSECTION_FRACTION_TOLERANCE: f64 = 0.005;

/// Caller bug surfaced by the matcher's precondition check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    /// A violation in the input set belongs to a different rule than the
    /// processor it was matched against.
    #[error("violation for rule {violation_rule} handed to the {processor_rule} processor")]
    RuleMismatch {
        /// Rule key of the processor.
        processor_rule: &'static str,
        /// Rule key carried by the offending violation.
        violation_rule: String,
    },
}

/// One violation with its endpoints resolved to byte offsets in its unit.
struct ResolvedViolation<'a> {
    violation: &'a Violation,
    unit: UnitId,
    start: usize,
    end: usize,
    intersecting: Vec<(NodeId, f64)>,
    same_line: Vec<(NodeId, f64)>,
}

/// Computes the injective node-to-violation assignment for one rule.
///
/// Violations must all carry the processor's rule key; the set typically
/// comes straight out of the analyzer partitioned by rule. Violations whose
/// file is not loaded, or that attract no repairable candidate, are simply
/// absent from the result.
///
/// # Errors
///
/// Returns [`MatchError::RuleMismatch`] when a violation belongs to a
/// different rule; that is a caller bug and aborts before any matching.
pub fn calculate_best_fits(
    workspace: &Workspace,
    violations: &BTreeSet<Violation>,
    processor: Processor,
) -> Result<BTreeMap<NodeHandle, Violation>, MatchError> {
    for violation in violations {
        if violation.rule_key() != processor.rule_key() {
            return Err(MatchError::RuleMismatch {
                processor_rule: processor.rule_key(),
                violation_rule: violation.rule_key().to_owned(),
            });
        }
    }

    // Resolve line/column endpoints onto the byte-offset coordinate system
    // of each violation's unit. Unresolvable files drop out here.
    let mut resolved: Vec<ResolvedViolation<'_>> = violations
        .iter()
        .filter_map(|violation| {
            let unit_id = workspace.find_by_path(violation.file())?;
            let unit = workspace.unit(unit_id);
            let index = unit.line_index();
            let start =
                index.offset_at(unit.source(), violation.start_line(), violation.start_col());
            let end = index.offset_at(unit.source(), violation.end_line(), violation.end_col());
            Some(ResolvedViolation {
                violation,
                unit: unit_id,
                start,
                end,
                intersecting: Vec::new(),
                same_line: Vec::new(),
            })
        })
        .collect();

    let mut by_unit: FxHashMap<UnitId, Vec<usize>> = FxHashMap::default();
    for (i, r) in resolved.iter().enumerate() {
        by_unit.entry(r.unit).or_default().push(i);
    }

    // One traversal. Units without violations are skipped outright.
    for (unit_id, unit) in workspace.iter() {
        let Some(indices) = by_unit.get(&unit_id) else {
            continue;
        };
        for node_id in unit.node_ids() {
            if !processor.is_applicable(unit, node_id) {
                continue;
            }
            let node = unit.node(node_id);
            let node_line = unit.start_line(node_id);
            for &i in indices {
                let r = &mut resolved[i];
                // Touching endpoints count as intersection.
                if r.start <= node.end && node.start <= r.end {
                    let fraction = intersection_fraction(r.start, r.end, node.start, node.end);
                    r.intersecting.push((node_id, fraction));
                }
                // Independent of intersection, to tolerate analyzer
                // off-by-a-few-characters reporting.
                if node_line == r.violation.start_line() {
                    let fraction = intersection_fraction(r.start, r.end, node.start, node.end);
                    r.same_line.push((node_id, fraction));
                }
            }
        }
    }

    // Violations iterate in their natural order, which is the deterministic
    // tie-break between violations competing for the same node.
    let mut best_fits = BTreeMap::new();
    let mut claimed: FxHashSet<NodeHandle> = FxHashSet::default();
    for r in &mut resolved {
        let unit = workspace.unit(r.unit);
        let mut pool: Vec<(NodeId, f64)> = Vec::with_capacity(r.intersecting.len() + r.same_line.len());
        pool.append(&mut r.intersecting);
        pool.append(&mut r.same_line);
        sort_candidates(unit, &mut pool);

        let chosen = pool.into_iter().map(|(id, _)| id).find(|&id| {
            let handle = NodeHandle {
                unit: r.unit,
                node: id,
            };
            !claimed.contains(&handle) && processor.is_repairable(unit, id)
        });
        if let Some(node) = chosen {
            let handle = NodeHandle {
                unit: r.unit,
                node,
            };
            claimed.insert(handle);
            best_fits.insert(handle, r.violation.clone());
        }
    }

    Ok(best_fits)
}

/// Fraction of the candidate's span covered by the violation, `0.0` when
/// they do not overlap or the candidate's span is empty.
fn intersection_fraction(v_start: usize, v_end: usize, n_start: usize, n_end: usize) -> f64 {
    let len = n_end.saturating_sub(n_start);
    if len == 0 {
        return 0.0;
    }
    let overlap = v_end.min(n_end).saturating_sub(v_start.max(n_start));
    if overlap == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let fraction = overlap as f64 / len as f64;
    fraction
}

/// Sorts candidates best-first. Candidates whose fraction comes within
/// [`INTERSECTION_FRACTION_TOLERANCE`] of the pool's best fraction form one
/// tie group ordered by span length, largest first; everything else follows
/// in fraction order. Anchoring the tie window to the best fraction keeps
/// the comparison a total order even across chains of near-ties. The sort
/// is stable, so the intersecting list stays ahead of the same-line list
/// among full ties.
fn sort_candidates(unit: &TranslationUnit, pool: &mut [(NodeId, f64)]) {
    let best = pool.iter().map(|&(_, f)| f).fold(0.0_f64, f64::max);
    pool.sort_by(|&(a, fa), &(b, fb)| {
        let a_tied = best - fa < INTERSECTION_FRACTION_TOLERANCE;
        let b_tied = best - fb < INTERSECTION_FRACTION_TOLERANCE;
        match (a_tied, b_tied) {
            (true, true) => unit.node(b).span_len().cmp(&unit.node(a).span_len()),
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => fb.partial_cmp(&fa).unwrap_or(Ordering::Equal),
        }
    });
}
