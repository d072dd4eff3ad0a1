//! Registry of translation units touched by repairs.
//!
//! Every successful repair registers the owning unit here; finalizing asks
//! for the distinct set of changed units under the changed-only output
//! strategy. Paths are the map key but units deduplicate by handle, since
//! one unit may be reachable through more than one raw path spelling before
//! normalization.

use crate::tree::{NodeHandle, UnitId, Workspace};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Collects the units that received at least one repair.
#[derive(Debug)]
pub struct UnitCollector {
    units: BTreeMap<PathBuf, UnitId>,
    original_root: PathBuf,
    intermediate_root: PathBuf,
}

impl UnitCollector {
    /// Creates a collector aware of the two output roots: the original
    /// source root and the segmented-repair staging directory.
    #[must_use]
    pub fn new(original_root: &Path, intermediate_root: &Path) -> Self {
        Self {
            units: BTreeMap::new(),
            original_root: crate::utils::normalize_path(original_root),
            intermediate_root: crate::utils::normalize_path(intermediate_root),
        }
    }

    /// Registers the unit owning a repaired node. Must be called after every
    /// successful repair.
    pub fn collect(&mut self, workspace: &Workspace, handle: NodeHandle) {
        let path = workspace.unit(handle.unit).path().to_path_buf();
        self.evict_original_version(&path);
        self.units.insert(path, handle.unit);
    }

    /// When a staged intermediate copy of a file is collected for the first
    /// time, drop any entry for the file's original path. Without this, a
    /// changed-only finalize would emit a stale full snapshot of the
    /// original over the incrementally edited copy.
    fn evict_original_version(&mut self, path: &Path) {
        if self.units.contains_key(path) {
            return;
        }
        if let Ok(relative) = path.strip_prefix(&self.intermediate_root) {
            self.units.remove(&self.original_root.join(relative));
        }
    }

    /// The distinct changed units, deduplicated by handle, in handle order.
    #[must_use]
    pub fn collected_units(&self) -> Vec<UnitId> {
        let distinct: BTreeSet<UnitId> = self.units.values().copied().collect();
        distinct.into_iter().collect()
    }

    /// Number of distinct changed units.
    #[must_use]
    pub fn changed_count(&self) -> usize {
        self.collected_units().len()
    }
}
