//! Line/column <-> byte offset conversion and path normalization helpers.

use std::path::{Component, Path, PathBuf};

/// A utility struct to convert between byte offsets and line/column positions.
///
/// Analyzer diagnostics carry 1-based line numbers and 0-based character
/// columns, while tree spans are byte offsets into the file. This table of
/// line-start offsets puts both onto one coordinate system.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Stores the byte index of the start of each line.
    line_starts: Vec<usize>,
}

impl LineIndex {
    /// Creates a new `LineIndex` by scanning the source code for newlines.
    /// Uses byte iteration since '\n' is always a single byte in UTF-8.
    #[must_use]
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, byte) in source.as_bytes().iter().enumerate() {
            if *byte == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts }
    }

    /// Number of lines in the indexed source.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Byte offset of a (1-based line, 0-based character column) position.
    ///
    /// Columns count characters, not bytes, so multi-byte codepoints earlier
    /// on the line are accounted for. Positions past the end of a line clamp
    /// to the line break, and lines past the end of the file clamp to
    /// `source.len()`; analyzer positions are tolerated rather than trusted.
    #[must_use]
    pub fn offset_at(&self, source: &str, line: usize, col: usize) -> usize {
        let Some(&start) = line.checked_sub(1).and_then(|l| self.line_starts.get(l)) else {
            return source.len();
        };
        let end = self.line_starts.get(line).copied().unwrap_or(source.len());
        let mut offset = start;
        let mut chars = source[start..end].chars();
        for _ in 0..col {
            match chars.next() {
                Some('\n') | None => break,
                Some(ch) => offset += ch.len_utf8(),
            }
        }
        offset
    }

    /// Converts a byte offset to a (1-based line, 0-based character column).
    #[must_use]
    pub fn location(&self, source: &str, offset: usize) -> (usize, usize) {
        let line = self.line_starts.partition_point(|&s| s <= offset).max(1);
        let start = self.line_starts[line - 1];
        let offset = offset.clamp(start, source.len());
        let col = source[start..offset].chars().count();
        (line, col)
    }

    /// 1-based line number containing the given byte offset.
    #[must_use]
    pub fn line_of(&self, offset: usize) -> usize {
        self.line_starts.partition_point(|&s| s <= offset).max(1)
    }

    /// Byte span `[start, end)` of a 1-based line, including its newline.
    #[must_use]
    pub fn line_span(&self, source: &str, line: usize) -> (usize, usize) {
        let start = line
            .checked_sub(1)
            .and_then(|l| self.line_starts.get(l).copied())
            .unwrap_or(source.len());
        let end = self.line_starts.get(line).copied().unwrap_or(source.len());
        (start, end)
    }
}

/// Normalizes a path to an absolute, canonical form.
///
/// Falls back to a lexical cleanup (resolving `.` and `..` against the
/// current directory) when the path does not exist on disk, so that synthetic
/// paths used by violations and translation units still compare equal.
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }

    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(parts.last(), Some(Component::Normal(_))) {
                    parts.pop();
                }
            }
            other => parts.push(other),
        }
    }
    parts.iter().collect()
}

/// Normalizes a path for CLI display.
///
/// Converts backslashes to forward slashes and strips a leading "./" prefix.
#[must_use]
pub fn normalize_display_path(path: &Path) -> String {
    let s = path.to_string_lossy();
    let normalized = s.replace('\\', "/");
    normalized
        .strip_prefix("./")
        .unwrap_or(&normalized)
        .to_owned()
}
