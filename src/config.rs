//! Configuration file loading.
//!
//! Defaults can live in a `pymend.toml` next to the project, or in the
//! `[tool.pymend]` table of `pyproject.toml`. CLI flags always win over
//! file values; the merge happens in the repair command, so the
//! orchestrator only ever sees one resolved [`crate::repair::RepairConfig`].

use crate::constants::{CONFIG_FILENAME, PYPROJECT_FILENAME};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level configuration file contents.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// The `[pymend]` section.
    #[serde(default)]
    pub pymend: PymendConfig,
    /// Where this configuration was loaded from, `None` for defaults.
    #[serde(skip)]
    pub config_file_path: Option<PathBuf>,
}

/// Options settable from a configuration file. Every field is optional;
/// unset fields fall back to CLI values or built-in defaults.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct PymendConfig {
    /// Rule keys to repair, in pass order.
    pub rules: Option<Vec<String>>,
    /// Per-rule cap on successful repairs.
    pub max_fixes_per_rule: Option<usize>,
    /// `changed-only` or `all`.
    pub file_output_strategy: Option<String>,
    /// `sniper` or `normal`.
    pub pretty_printing_strategy: Option<String>,
    /// `default` or `segment`.
    pub repair_strategy: Option<String>,
    /// Segment size for segmented repair.
    pub max_files_per_segment: Option<usize>,
    /// Workspace directory for outputs.
    pub workspace: Option<PathBuf>,
    /// Where to write the JSON statistics report.
    pub stats_output_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct PyProject {
    tool: ToolConfig,
}

#[derive(Debug, Deserialize)]
struct ToolConfig {
    pymend: PymendConfig,
}

impl Config {
    /// Loads configuration from the current directory upward.
    #[must_use]
    pub fn load() -> Self {
        Self::load_from_path(Path::new("."))
    }

    /// Loads configuration starting at `path` and walking up the directory
    /// tree. `pymend.toml` takes precedence over `pyproject.toml` within a
    /// directory; unreadable or unparsable files are skipped.
    #[must_use]
    pub fn load_from_path(path: &Path) -> Self {
        let mut current = crate::utils::normalize_path(path);
        if current.is_file() {
            current.pop();
        }

        loop {
            let pymend_toml = current.join(CONFIG_FILENAME);
            if pymend_toml.exists() {
                if let Ok(content) = fs::read_to_string(&pymend_toml) {
                    if let Ok(mut config) = toml::from_str::<Self>(&content) {
                        config.config_file_path = Some(pymend_toml);
                        return config;
                    }
                }
            }

            let pyproject_toml = current.join(PYPROJECT_FILENAME);
            if pyproject_toml.exists() {
                if let Ok(content) = fs::read_to_string(&pyproject_toml) {
                    if let Ok(pyproject) = toml::from_str::<PyProject>(&content) {
                        return Self {
                            pymend: pyproject.tool.pymend,
                            config_file_path: Some(pyproject_toml),
                        };
                    }
                }
            }

            if !current.pop() {
                return Self::default();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn missing_files_yield_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from_path(dir.path());
        assert!(config.pymend.rules.is_none());
        assert!(config.config_file_path.is_none());
    }

    #[test]
    fn pymend_toml_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        let mut file = fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[pymend]\nrules = [\"S1116\", \"S5727\"]\nmax_fixes_per_rule = 3\n"
        )
        .unwrap();

        let config = Config::load_from_path(dir.path());
        assert_eq!(
            config.pymend.rules,
            Some(vec!["S1116".to_owned(), "S5727".to_owned()])
        );
        assert_eq!(config.pymend.max_fixes_per_rule, Some(3));
        assert!(config.config_file_path.is_some());
    }

    #[test]
    fn pyproject_tool_table_is_loaded_from_a_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("pkg/sub");
        fs::create_dir_all(&nested).unwrap();
        fs::write(
            dir.path().join(PYPROJECT_FILENAME),
            "[tool.pymend]\nrepair_strategy = \"segment\"\n",
        )
        .unwrap();

        let config = Config::load_from_path(&nested);
        assert_eq!(
            config.pymend.repair_strategy.as_deref(),
            Some("segment")
        );
    }

    #[test]
    fn pymend_toml_wins_over_pyproject() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILENAME),
            "[pymend]\nmax_fixes_per_rule = 1\n",
        )
        .unwrap();
        fs::write(
            dir.path().join(PYPROJECT_FILENAME),
            "[tool.pymend]\nmax_fixes_per_rule = 9\n",
        )
        .unwrap();

        let config = Config::load_from_path(dir.path());
        assert_eq!(config.pymend.max_fixes_per_rule, Some(1));
    }
}
