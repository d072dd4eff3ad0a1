//! The repair orchestrator: analyze, match, repair, finalize.

use crate::analyzer;
use crate::collector::UnitCollector;
use crate::constants::{DEFAULT_MAX_FILES_PER_SEGMENT, FIXED_DIR, INTERMEDIATE_DIR, PYTHON_EXT, WORKSPACE_DEFAULT};
use crate::events::{Phase, RepairRecord, StatsCollector};
use crate::matcher;
use crate::processor::Processor;
use crate::tree::parse::parse_unit;
use crate::tree::printer::{self, PrettyPrintingStrategy, StrategyParseError};
use crate::tree::{NodeHandle, UnitId, Workspace};
use crate::utils::normalize_path;
use crate::violation::Violation;
use anyhow::Result;
use colored::Colorize;
use ignore::WalkBuilder;
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Which files finalize writes to the output directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileOutputStrategy {
    /// Only files that received at least one successful repair.
    #[default]
    ChangedOnly,
    /// Every input file, changed or not.
    All,
}

impl FromStr for FileOutputStrategy {
    type Err = StrategyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "changed-only" => Ok(Self::ChangedOnly),
            "all" => Ok(Self::All),
            _ => Err(StrategyParseError {
                value: s.to_owned(),
                expected: "changed-only, all",
            }),
        }
    }
}

/// How the input is fed through the repair pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepairStrategy {
    /// The whole input in one pass.
    #[default]
    Default,
    /// The input split into bounded segments, each parsed, repaired,
    /// staged, flushed to its output and released before the next loads.
    /// Keeps peak memory bounded on large trees.
    Segment,
}

impl FromStr for RepairStrategy {
    type Err = StrategyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "default" => Ok(Self::Default),
            "segment" => Ok(Self::Segment),
            _ => Err(StrategyParseError {
                value: s.to_owned(),
                expected: "default, segment",
            }),
        }
    }
}

/// Everything a repair run needs. The frontend builds and validates this;
/// the orchestrator never reads flags or files of its own.
#[derive(Debug, Clone)]
pub struct RepairConfig {
    /// File or directory holding the sources to repair.
    pub source: PathBuf,
    /// Rule keys to repair, in the order their passes run.
    pub rule_keys: Vec<String>,
    /// Per-rule cap on successful repairs.
    pub max_fixes_per_rule: usize,
    /// Which files finalize writes.
    pub file_output_strategy: FileOutputStrategy,
    /// How finalize renders each file.
    pub pretty_printing_strategy: PrettyPrintingStrategy,
    /// Whole-input or segmented processing.
    pub repair_strategy: RepairStrategy,
    /// Segment size for [`RepairStrategy::Segment`].
    pub max_files_per_segment: usize,
    /// Workspace directory receiving `fixed/` output.
    pub workspace: PathBuf,
    /// Where to write the statistics report, if requested.
    pub stats_output_file: Option<PathBuf>,
}

impl RepairConfig {
    /// Builds a config with default strategies and an unlimited fix cap.
    #[must_use]
    pub fn new(source: PathBuf, rule_keys: Vec<String>) -> Self {
        Self {
            source,
            rule_keys,
            max_fixes_per_rule: usize::MAX,
            file_output_strategy: FileOutputStrategy::default(),
            pretty_printing_strategy: PrettyPrintingStrategy::default(),
            repair_strategy: RepairStrategy::default(),
            max_files_per_segment: DEFAULT_MAX_FILES_PER_SEGMENT,
            workspace: PathBuf::from(WORKSPACE_DEFAULT),
            stats_output_file: None,
        }
    }
}

/// Fatal configuration problem, detected before any tree is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// No rule keys came from the CLI or the configuration file.
    #[error("no rule keys requested; pass --rule-keys or set `rules` in the configuration file")]
    NoRulesRequested,
    /// A requested rule key has no processor.
    #[error("unsupported rule key {0:?}; `pymend rules` lists the catalog")]
    UnsupportedRule(String),
    /// An option that must be positive is zero.
    #[error("{option} must be positive")]
    NonPositive {
        /// The offending option, in CLI spelling.
        option: &'static str,
    },
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepairSummary {
    /// Successful repairs across all rules.
    pub total_repairs: usize,
    /// Matched nodes skipped because an earlier repair detached them or
    /// removed the context their precondition relied on.
    pub skipped: usize,
    /// Repairs that failed and were logged.
    pub failed_repairs: usize,
    /// Files that could not be read or parsed.
    pub failed_parses: usize,
    /// Distinct files with at least one successful repair.
    pub changed_files: usize,
}

/// Checks the configuration and resolves rule keys to processors, in the
/// requested order.
///
/// # Errors
///
/// Returns a [`ConfigError`] describing the first problem found.
pub fn validate(config: &RepairConfig) -> Result<Vec<Processor>, ConfigError> {
    if config.rule_keys.is_empty() {
        return Err(ConfigError::NoRulesRequested);
    }
    if config.max_fixes_per_rule == 0 {
        return Err(ConfigError::NonPositive {
            option: "--max-fixes-per-rule",
        });
    }
    if config.max_files_per_segment == 0 {
        return Err(ConfigError::NonPositive {
            option: "--max-files-per-segment",
        });
    }
    config
        .rule_keys
        .iter()
        .map(|key| Processor::for_rule(key).ok_or_else(|| ConfigError::UnsupportedRule(key.clone())))
        .collect()
}

/// Runs the full pipeline: discover, parse, analyze, match, repair,
/// finalize. Fatal configuration problems abort before any file is read;
/// per-file and per-node problems are logged and counted.
///
/// # Errors
///
/// Fails on invalid configuration, on matcher precondition violations, and
/// on I/O errors against the workspace directory.
pub fn run<W: Write>(config: &RepairConfig, writer: &mut W) -> Result<RepairSummary> {
    let processors = validate(config)?;

    let source_root = normalize_path(&config.source);
    let files = discover_python_files(&source_root)?;
    let fixed_root = config.workspace.join(FIXED_DIR);
    let intermediate_root = fixed_root.join(INTERMEDIATE_DIR);
    fs::create_dir_all(&fixed_root)?;

    let mut workspace = Workspace::new();
    let mut collector = UnitCollector::new(&source_root, &normalize_path(&intermediate_root));
    let mut stats = StatsCollector::new();
    let mut summary = RepairSummary::default();
    let mut remaining: FxHashMap<Processor, usize> = processors
        .iter()
        .map(|&p| (p, config.max_fixes_per_rule))
        .collect();

    let segment_size = match config.repair_strategy {
        RepairStrategy::Default => files.len().max(1),
        RepairStrategy::Segment => config.max_files_per_segment,
    };

    for segment in files.chunks(segment_size) {
        stats.record(Phase::ParseStart);
        let segment_units = load_segment(&mut workspace, segment, &mut summary, writer)?;
        stats.record(Phase::ParseEnd);

        let violations = analyzer::analyze_units(&workspace, &segment_units, &processors);

        stats.record(Phase::RepairStart);
        for &processor in &processors {
            let rule_violations: BTreeSet<Violation> = violations
                .iter()
                .filter(|v| v.rule_key() == processor.rule_key())
                .cloned()
                .collect();
            if rule_violations.is_empty() {
                continue;
            }
            let best_fits = matcher::calculate_best_fits(&workspace, &rule_violations, processor)?;
            let budget = remaining.get(&processor).copied().unwrap_or(0);
            let outcome = apply_best_fits(
                &mut workspace,
                best_fits,
                processor,
                budget,
                &mut collector,
                &mut stats,
                writer,
            )?;
            if let Some(r) = remaining.get_mut(&processor) {
                *r -= outcome.fixed;
            }
            summary.total_repairs += outcome.fixed;
            summary.skipped += outcome.skipped;
            summary.failed_repairs += outcome.failed;
        }
        stats.record(Phase::RepairEnd);

        if config.repair_strategy == RepairStrategy::Segment {
            stage_segment(
                &workspace,
                &segment_units,
                &source_root,
                &intermediate_root,
                config.pretty_printing_strategy,
                writer,
            )?;
            flush_segment(
                &workspace,
                &segment_units,
                config,
                &source_root,
                &fixed_root,
                writer,
            )?;
            // Outputs are on disk; the segment's sources, ASTs and arenas
            // can go before the next segment loads.
            for &id in &segment_units {
                workspace.release_unit(id);
            }
        }
    }

    if config.repair_strategy == RepairStrategy::Default {
        finalize(
            &workspace,
            &collector,
            config,
            &source_root,
            &fixed_root,
            writer,
        )?;
    }
    summary.changed_files = collector.changed_count();

    if let Some(stats_path) = &config.stats_output_file {
        match stats.report() {
            Some(_) => stats.write_report(stats_path)?,
            None => writeln!(
                writer,
                "{} no statistics recorded, skipping {}",
                "Warning:".yellow(),
                stats_path.display()
            )?,
        }
    }

    writeln!(
        writer,
        "{} {} repair(s) across {} file(s), {} skipped, {} failed",
        "Done:".green().bold(),
        summary.total_repairs,
        summary.changed_files,
        summary.skipped,
        summary.failed_repairs
    )?;

    Ok(summary)
}

fn load_segment<W: Write>(
    workspace: &mut Workspace,
    segment: &[PathBuf],
    summary: &mut RepairSummary,
    writer: &mut W,
) -> Result<Vec<UnitId>> {
    let mut units = Vec::with_capacity(segment.len());
    for path in segment {
        match fs::read_to_string(path) {
            Ok(source) => match parse_unit(path, source) {
                Ok(unit) => units.push(workspace.add_unit(unit)),
                Err(err) => {
                    summary.failed_parses += 1;
                    writeln!(writer, "{} {err}", "Warning:".yellow())?;
                }
            },
            Err(err) => {
                summary.failed_parses += 1;
                writeln!(
                    writer,
                    "{} cannot read {}: {err}",
                    "Warning:".yellow(),
                    path.display()
                )?;
            }
        }
    }
    Ok(units)
}

struct PassOutcome {
    fixed: usize,
    skipped: usize,
    failed: usize,
}

/// One rule's repair pass over a best-fit map computed before any mutation.
///
/// Pairs iterate in violation order. Each target is re-validated against the
/// current tree first: an earlier repair in the same pass may have deleted
/// an enclosing statement, or the last sibling the precondition relied on.
/// Such pairs are skipped, never failed.
fn apply_best_fits<W: Write>(
    workspace: &mut Workspace,
    best_fits: BTreeMap<NodeHandle, Violation>,
    processor: Processor,
    budget: usize,
    collector: &mut UnitCollector,
    stats: &mut StatsCollector,
    writer: &mut W,
) -> Result<PassOutcome> {
    let mut pairs: Vec<(NodeHandle, Violation)> = best_fits.into_iter().collect();
    pairs.sort_by(|a, b| a.1.cmp(&b.1));

    let mut outcome = PassOutcome {
        fixed: 0,
        skipped: 0,
        failed: 0,
    };
    for (handle, violation) in pairs {
        if outcome.fixed >= budget {
            break;
        }
        if !processor.is_repairable(workspace.unit(handle.unit), handle.node) {
            outcome.skipped += 1;
            writeln!(
                writer,
                "{} {violation}: invalidated by an earlier repair",
                "Skipped".yellow()
            )?;
            continue;
        }
        let result = processor.repair(workspace.unit_mut(handle.unit), handle.node);
        match result {
            Ok(()) => {
                outcome.fixed += 1;
                collector.collect(workspace, handle);
                stats.record_repair(RepairRecord {
                    rule_key: violation.rule_key().to_owned(),
                    file_path: violation.file().display().to_string(),
                    start_line: violation.start_line(),
                    end_line: violation.end_line(),
                });
                writeln!(writer, "{} {violation}", "Repaired".green())?;
            }
            Err(err) => {
                outcome.failed += 1;
                writeln!(writer, "{} {violation}: {err}", "Failed".red())?;
            }
        }
    }
    Ok(outcome)
}

/// Segment mode: print this segment's changed units into the staging
/// directory before the next segment loads.
fn stage_segment<W: Write>(
    workspace: &Workspace,
    segment_units: &[UnitId],
    source_root: &Path,
    intermediate_root: &Path,
    strategy: PrettyPrintingStrategy,
    writer: &mut W,
) -> Result<()> {
    for &id in segment_units {
        let unit = workspace.unit(id);
        if !unit.has_edits() {
            continue;
        }
        let dest = intermediate_root.join(relative_output_path(unit.path(), source_root));
        if let Err(err) = printer::write_unit(unit, strategy, &dest) {
            writeln!(writer, "{} {err:#}", "Warning:".yellow())?;
        }
    }
    Ok(())
}

/// Segment mode writes a segment's final outputs as soon as its rule passes
/// finish, so finalize never needs the segment's units again.
fn flush_segment<W: Write>(
    workspace: &Workspace,
    segment_units: &[UnitId],
    config: &RepairConfig,
    source_root: &Path,
    fixed_root: &Path,
    writer: &mut W,
) -> Result<()> {
    for &id in segment_units {
        let unit = workspace.unit(id);
        if config.file_output_strategy == FileOutputStrategy::ChangedOnly && !unit.has_edits() {
            continue;
        }
        let dest = fixed_root.join(relative_output_path(unit.path(), source_root));
        if let Err(err) = printer::write_unit(unit, config.pretty_printing_strategy, &dest) {
            writeln!(writer, "{} {err:#}", "Warning:".yellow())?;
        }
    }
    Ok(())
}

fn finalize<W: Write>(
    workspace: &Workspace,
    collector: &UnitCollector,
    config: &RepairConfig,
    source_root: &Path,
    fixed_root: &Path,
    writer: &mut W,
) -> Result<()> {
    let to_print: Vec<UnitId> = match config.file_output_strategy {
        FileOutputStrategy::ChangedOnly => collector.collected_units(),
        FileOutputStrategy::All => workspace.iter().map(|(id, _)| id).collect(),
    };
    for id in to_print {
        let unit = workspace.unit(id);
        let dest = fixed_root.join(relative_output_path(unit.path(), source_root));
        if let Err(err) = printer::write_unit(unit, config.pretty_printing_strategy, &dest) {
            writeln!(writer, "{} {err:#}", "Warning:".yellow())?;
        }
    }
    Ok(())
}

/// Collects the `.py` files under `root` (gitignore-aware), sorted for
/// deterministic segment and parse order. A single-file root passes
/// through as-is.
fn discover_python_files(root: &Path) -> Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }
    let mut files = Vec::new();
    for entry in WalkBuilder::new(root).build() {
        let entry = entry?;
        if entry.file_type().is_some_and(|t| t.is_file())
            && entry.path().extension().and_then(|e| e.to_str()) == Some(PYTHON_EXT)
        {
            files.push(normalize_path(entry.path()));
        }
    }
    files.sort();
    Ok(files)
}

/// Output location of a unit relative to the source root; falls back to the
/// bare file name for paths outside the root (single-file input).
fn relative_output_path(unit_path: &Path, source_root: &Path) -> PathBuf {
    match unit_path.strip_prefix(source_root) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel.to_path_buf(),
        _ => unit_path
            .file_name()
            .map_or_else(PathBuf::new, PathBuf::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::parsed_unit;
    use crate::tree::NodeKind;

    fn config(rules: &[&str]) -> RepairConfig {
        RepairConfig::new(
            PathBuf::from("/proj"),
            rules.iter().map(|r| (*r).to_owned()).collect(),
        )
    }

    fn test_collector() -> UnitCollector {
        UnitCollector::new(Path::new("/proj"), Path::new("/work/fixed/intermediate"))
    }

    fn s1116_violation(line: usize, start_col: usize, end_col: usize) -> Violation {
        Violation::new(
            "S1116",
            "NeedlessPassCheck",
            Path::new("/proj/a.py"),
            line,
            start_col,
            line,
            end_col,
        )
    }

    #[test]
    fn validate_rejects_unknown_rules_and_zero_caps() {
        assert_eq!(validate(&config(&[])), Err(ConfigError::NoRulesRequested));
        assert_eq!(
            validate(&config(&["S9999"])),
            Err(ConfigError::UnsupportedRule("S9999".to_owned()))
        );

        let mut zero_cap = config(&["S1116"]);
        zero_cap.max_fixes_per_rule = 0;
        assert!(matches!(
            validate(&zero_cap),
            Err(ConfigError::NonPositive { .. })
        ));

        let mut zero_segment = config(&["S1116"]);
        zero_segment.repair_strategy = RepairStrategy::Segment;
        zero_segment.max_files_per_segment = 0;
        assert!(matches!(
            validate(&zero_segment),
            Err(ConfigError::NonPositive { .. })
        ));

        assert_eq!(
            validate(&config(&["S1116", "S5727"])),
            Ok(vec![Processor::NeedlessPass, Processor::ComparisonToNone])
        );
    }

    #[test]
    fn fix_cap_bounds_a_rule_pass() {
        let mut workspace = Workspace::new();
        workspace.add_unit(parsed_unit(
            "/proj/a.py",
            "def f():\n    pass\n    pass\n    pass\n    return 1\n",
        ));
        let violations: BTreeSet<Violation> = [
            s1116_violation(2, 4, 8),
            s1116_violation(3, 4, 8),
            s1116_violation(4, 4, 8),
        ]
        .into_iter()
        .collect();
        let best_fits =
            matcher::calculate_best_fits(&workspace, &violations, Processor::NeedlessPass)
                .unwrap();
        assert_eq!(best_fits.len(), 3);

        let mut collector = test_collector();
        let mut stats = StatsCollector::new();
        let mut out = Vec::new();
        let outcome = apply_best_fits(
            &mut workspace,
            best_fits,
            Processor::NeedlessPass,
            2,
            &mut collector,
            &mut stats,
            &mut out,
        )
        .unwrap();

        assert_eq!(outcome.fixed, 2);
        assert_eq!(stats.repairs().len(), 2);
    }

    #[test]
    fn two_repairs_in_one_file_collect_a_single_unit() {
        let mut workspace = Workspace::new();
        let unit_id = workspace.add_unit(parsed_unit(
            "/proj/a.py",
            "def f():\n    pass\n    pass\n    return 1\n",
        ));
        let violations: BTreeSet<Violation> =
            [s1116_violation(2, 4, 8), s1116_violation(3, 4, 8)]
                .into_iter()
                .collect();
        let best_fits =
            matcher::calculate_best_fits(&workspace, &violations, Processor::NeedlessPass)
                .unwrap();

        let mut collector = test_collector();
        let mut stats = StatsCollector::new();
        let mut out = Vec::new();
        let outcome = apply_best_fits(
            &mut workspace,
            best_fits,
            Processor::NeedlessPass,
            usize::MAX,
            &mut collector,
            &mut stats,
            &mut out,
        )
        .unwrap();

        assert_eq!(outcome.fixed, 2);
        assert_eq!(collector.collected_units(), vec![unit_id]);
        assert_eq!(workspace.unit(unit_id).edits().len(), 2);
    }

    #[test]
    fn detached_targets_are_skipped_not_failed() {
        let mut workspace = Workspace::new();
        let unit_id = workspace.add_unit(parsed_unit(
            "/proj/a.py",
            "def f():\n    pass\n    return 1\n",
        ));
        let violations: BTreeSet<Violation> =
            [s1116_violation(2, 4, 8)].into_iter().collect();
        let best_fits =
            matcher::calculate_best_fits(&workspace, &violations, Processor::NeedlessPass)
                .unwrap();
        assert_eq!(best_fits.len(), 1);

        // Simulate an earlier repair in the same pass deleting the
        // enclosing function after the snapshot was taken.
        let function = workspace
            .unit(unit_id)
            .node_ids()
            .find(|&id| workspace.unit(unit_id).node(id).kind == NodeKind::FunctionDef)
            .unwrap();
        workspace.unit_mut(unit_id).detach(function);

        let mut collector = test_collector();
        let mut stats = StatsCollector::new();
        let mut out = Vec::new();
        let outcome = apply_best_fits(
            &mut workspace,
            best_fits,
            Processor::NeedlessPass,
            usize::MAX,
            &mut collector,
            &mut stats,
            &mut out,
        )
        .unwrap();

        assert_eq!(outcome.fixed, 0);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.failed, 0);
        assert!(collector.collected_units().is_empty());
    }

    #[test]
    fn second_deletion_in_a_two_pass_block_is_skipped() {
        let mut workspace = Workspace::new();
        let unit_id = workspace.add_unit(parsed_unit(
            "/proj/a.py",
            "def f():\n    pass\n    pass\n",
        ));
        let violations: BTreeSet<Violation> =
            [s1116_violation(2, 4, 8), s1116_violation(3, 4, 8)]
                .into_iter()
                .collect();
        let best_fits =
            matcher::calculate_best_fits(&workspace, &violations, Processor::NeedlessPass)
                .unwrap();
        assert_eq!(best_fits.len(), 2);

        let mut collector = test_collector();
        let mut stats = StatsCollector::new();
        let mut out = Vec::new();
        let outcome = apply_best_fits(
            &mut workspace,
            best_fits,
            Processor::NeedlessPass,
            usize::MAX,
            &mut collector,
            &mut stats,
            &mut out,
        )
        .unwrap();

        // Deleting the first pass leaves the second as the block's only
        // statement; removing it too would empty the body.
        assert_eq!(outcome.fixed, 1);
        assert_eq!(outcome.skipped, 1);
        let unit = workspace.unit(unit_id);
        let rendered =
            crate::tree::rewrite::apply_edits(unit.source(), unit.edits()).unwrap();
        assert_eq!(rendered, "def f():\n    pass\n");
    }

    #[test]
    fn relative_output_paths_preserve_structure() {
        assert_eq!(
            relative_output_path(Path::new("/proj/pkg/a.py"), Path::new("/proj")),
            PathBuf::from("pkg/a.py")
        );
        assert_eq!(
            relative_output_path(Path::new("/proj/a.py"), Path::new("/proj/a.py")),
            PathBuf::from("a.py")
        );
        assert_eq!(
            relative_output_path(Path::new("/elsewhere/a.py"), Path::new("/proj")),
            PathBuf::from("a.py")
        );
    }

    #[test]
    fn strategy_names_parse() {
        assert_eq!(
            "CHANGED_ONLY".parse::<FileOutputStrategy>().unwrap(),
            FileOutputStrategy::ChangedOnly
        );
        assert_eq!("all".parse::<FileOutputStrategy>().unwrap(), FileOutputStrategy::All);
        assert_eq!(
            "segment".parse::<RepairStrategy>().unwrap(),
            RepairStrategy::Segment
        );
        assert!("parallel".parse::<RepairStrategy>().is_err());
    }
}
