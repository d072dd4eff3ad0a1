//! Shared constants and lazily-built regex patterns.

use regex::Regex;
use std::sync::OnceLock;

/// File extension of the sources this tool repairs.
pub const PYTHON_EXT: &str = "py";

/// Default workspace directory, created next to wherever the tool is run.
pub const WORKSPACE_DEFAULT: &str = "pymend-workspace";

/// Subdirectory of the workspace that receives printed output files.
pub const FIXED_DIR: &str = "fixed";

/// Subdirectory of [`FIXED_DIR`] used as staging area by segmented repair.
pub const INTERMEDIATE_DIR: &str = "intermediate";

/// Name of the standalone configuration file.
pub const CONFIG_FILENAME: &str = "pymend.toml";

/// Name of the Python project file that may carry a `[tool.pymend]` table.
pub const PYPROJECT_FILENAME: &str = "pyproject.toml";

/// Default number of files loaded per segment in segmented repair.
pub const DEFAULT_MAX_FILES_PER_SEGMENT: usize = 6500;

/// Regex matching a comparison whose right-hand side is the `None` literal.
///
/// Capture 1 is the left operand, capture 2 the offending operator.
///
/// # Panics
///
/// Panics if the regex pattern is invalid.
pub fn comparison_to_none_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    RE.get_or_init(|| {
        Regex::new(r"(?s)^(.*?)\s*(==|!=)\s*None\s*$")
            .expect("Invalid comparison-to-None regex pattern")
    })
}

/// Regex matching the head of a bare `except:` clause.
///
/// Capture 1 is the `except` keyword, capture 2 the colon. Star handlers
/// (`except*`) do not match.
///
/// # Panics
///
/// Panics if the regex pattern is invalid.
pub fn bare_except_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    RE.get_or_init(|| {
        Regex::new(r"^(except)[ \t]*(:)").expect("Invalid bare-except regex pattern")
    })
}
