//! Byte-range safe edit engine.
//!
//! Repairs are expressed as byte-range edits against the original source of
//! a translation unit. Edits are validated for bounds and overlap when they
//! are recorded, and applied in reverse order so earlier offsets stay valid.

use thiserror::Error;

/// A single edit operation over a half-open byte range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
    /// Replacement content.
    pub replacement: String,
}

impl Edit {
    /// Create a replacement edit.
    #[must_use]
    pub fn new(start: usize, end: usize, replacement: impl Into<String>) -> Self {
        Self {
            start,
            end,
            replacement: replacement.into(),
        }
    }

    /// Create a deletion edit.
    #[must_use]
    pub fn delete(start: usize, end: usize) -> Self {
        Self::new(start, end, "")
    }

    /// Create an insertion edit (insert before position).
    #[must_use]
    pub fn insert(position: usize, content: impl Into<String>) -> Self {
        Self::new(position, position, content)
    }

    /// Check if this edit overlaps with another.
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Error while recording or applying edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewriteError {
    /// The edit overlaps one already recorded against the same source.
    #[error("edit {incoming:?} overlaps pending edit {existing:?}")]
    OverlappingEdits {
        /// Span of the edit being added.
        incoming: (usize, usize),
        /// Span of the previously recorded edit it collides with.
        existing: (usize, usize),
    },
    /// Edit range is out of bounds for the source.
    #[error("edit ends at {end} but source is {source_len} bytes")]
    OutOfBounds {
        /// End byte of the bad edit.
        end: usize,
        /// Length of the source.
        source_len: usize,
    },
}

/// Validates one edit against the source length and the already-recorded
/// edits it would join.
pub fn validate_edit(source_len: usize, pending: &[Edit], edit: &Edit) -> Result<(), RewriteError> {
    if edit.end > source_len || edit.start > edit.end {
        return Err(RewriteError::OutOfBounds {
            end: edit.end.max(edit.start),
            source_len,
        });
    }
    for existing in pending {
        if edit.overlaps(existing) {
            return Err(RewriteError::OverlappingEdits {
                incoming: (edit.start, edit.end),
                existing: (existing.start, existing.end),
            });
        }
    }
    Ok(())
}

/// Applies all edits and returns the modified source.
///
/// Edits are applied in reverse order (by start position) so byte offsets
/// recorded against the original source stay valid throughout. Callers are
/// expected to have validated edits on insertion via [`validate_edit`]; the
/// bounds and overlap checks are repeated here as a final guard.
///
/// # Errors
/// Returns an error if edits overlap or are out of bounds.
pub fn apply_edits(source: &str, edits: &[Edit]) -> Result<String, RewriteError> {
    let mut checked: Vec<&Edit> = Vec::with_capacity(edits.len());
    for edit in edits {
        if edit.end > source.len() || edit.start > edit.end {
            return Err(RewriteError::OutOfBounds {
                end: edit.end.max(edit.start),
                source_len: source.len(),
            });
        }
        for existing in &checked {
            if edit.overlaps(existing) {
                return Err(RewriteError::OverlappingEdits {
                    incoming: (edit.start, edit.end),
                    existing: (existing.start, existing.end),
                });
            }
        }
        checked.push(edit);
    }

    let mut sorted: Vec<&Edit> = edits.iter().collect();
    sorted.sort_by(|a, b| b.start.cmp(&a.start));

    let mut result = source.to_owned();
    for edit in sorted {
        result.replace_range(edit.start..edit.end, &edit.replacement);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_replacement() {
        let edits = [Edit::new(0, 5, "hi")];
        assert_eq!(apply_edits("hello world", &edits).unwrap(), "hi world");
    }

    #[test]
    fn multiple_non_overlapping_edits() {
        let edits = [Edit::new(0, 3, "AAA"), Edit::new(8, 11, "CCC")];
        assert_eq!(apply_edits("aaa bbb ccc", &edits).unwrap(), "AAA bbb CCC");
    }

    #[test]
    fn overlapping_edits_error() {
        let edits = [Edit::new(0, 8, "hi"), Edit::new(5, 10, "there")];
        let result = apply_edits("hello world", &edits);
        assert!(matches!(
            result,
            Err(RewriteError::OverlappingEdits { .. })
        ));
    }

    #[test]
    fn out_of_bounds_error() {
        let edits = [Edit::new(0, 100, "long")];
        let result = apply_edits("short", &edits);
        assert!(matches!(result, Err(RewriteError::OutOfBounds { .. })));
    }

    #[test]
    fn deletion_and_insertion() {
        let edits = [Edit::delete(5, 11)];
        assert_eq!(apply_edits("hello world", &edits).unwrap(), "hello");

        let edits = [Edit::insert(5, " beautiful")];
        assert_eq!(
            apply_edits("hello world", &edits).unwrap(),
            "hello beautiful world"
        );
    }

    #[test]
    fn adjacent_edits_do_not_overlap() {
        let edits = [Edit::new(0, 3, "XXX"), Edit::new(3, 6, "YYY")];
        assert_eq!(apply_edits("abcdef", &edits).unwrap(), "XXXYYY");
    }

    #[test]
    fn validate_edit_rejects_overlap_with_pending() {
        let pending = vec![Edit::delete(4, 10)];
        let err = validate_edit(20, &pending, &Edit::new(8, 12, "x")).unwrap_err();
        assert!(matches!(err, RewriteError::OverlappingEdits { .. }));
        assert!(validate_edit(20, &pending, &Edit::new(10, 12, "x")).is_ok());
    }

    #[test]
    fn empty_edits_preserve_source() {
        assert_eq!(apply_edits("hello", &[]).unwrap(), "hello");
    }

    #[test]
    fn preserves_surrounding_formatting() {
        let source = "def foo():\n    # important comment\n    return 42\n";
        let pos = source.find("42").unwrap();
        let edits = [Edit::new(pos, pos + 2, "100")];
        let result = apply_edits(source, &edits).unwrap();
        assert!(result.contains("# important comment"));
        assert!(result.contains("return 100"));
    }
}
