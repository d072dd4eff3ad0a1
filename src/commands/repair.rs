//! The `repair` subcommand: resolve configuration and drive the
//! orchestrator.

use crate::cli::RepairArgs;
use crate::config::{Config, PymendConfig};
use crate::repair::{self, RepairConfig};
use anyhow::{Context, Result};
use std::io::Write;

/// Resolves CLI flags against the configuration file found near the source
/// path and runs the repair pipeline.
///
/// # Errors
///
/// Fails on invalid configuration or on orchestrator errors.
pub fn run<W: Write>(args: &RepairArgs, mut writer: W) -> Result<()> {
    let file_config = Config::load_from_path(&args.source);
    let config = resolve(args, &file_config.pymend)?;
    repair::run(&config, &mut writer)?;
    Ok(())
}

/// Merges CLI flags over file-config values over built-in defaults.
fn resolve(args: &RepairArgs, file: &PymendConfig) -> Result<RepairConfig> {
    let rules = if args.rule_keys.is_empty() {
        file.rules.clone().unwrap_or_default()
    } else {
        args.rule_keys.clone()
    };
    let mut config = RepairConfig::new(args.source.clone(), rules);

    if let Some(cap) = args.max_fixes_per_rule.or(file.max_fixes_per_rule) {
        config.max_fixes_per_rule = cap;
    }
    if let Some(strategy) = args.file_output_strategy {
        config.file_output_strategy = strategy;
    } else if let Some(name) = &file.file_output_strategy {
        config.file_output_strategy = name
            .parse()
            .context("invalid file_output_strategy in configuration file")?;
    }
    if let Some(strategy) = args.pretty_printing_strategy {
        config.pretty_printing_strategy = strategy;
    } else if let Some(name) = &file.pretty_printing_strategy {
        config.pretty_printing_strategy = name
            .parse()
            .context("invalid pretty_printing_strategy in configuration file")?;
    }
    if let Some(strategy) = args.repair_strategy {
        config.repair_strategy = strategy;
    } else if let Some(name) = &file.repair_strategy {
        config.repair_strategy = name
            .parse()
            .context("invalid repair_strategy in configuration file")?;
    }
    if let Some(size) = args.max_files_per_segment.or(file.max_files_per_segment) {
        config.max_files_per_segment = size;
    }
    if let Some(workspace) = args.workspace.clone().or_else(|| file.workspace.clone()) {
        config.workspace = workspace;
    }
    config.stats_output_file = args
        .stats_output_file
        .clone()
        .or_else(|| file.stats_output_file.clone());

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_MAX_FILES_PER_SEGMENT;
    use crate::repair::{FileOutputStrategy, RepairStrategy};
    use std::path::PathBuf;

    fn args(rules: &[&str]) -> RepairArgs {
        RepairArgs {
            source: PathBuf::from("/proj"),
            rule_keys: rules.iter().map(|r| (*r).to_owned()).collect(),
            max_fixes_per_rule: None,
            file_output_strategy: None,
            pretty_printing_strategy: None,
            repair_strategy: None,
            max_files_per_segment: None,
            workspace: None,
            stats_output_file: None,
        }
    }

    #[test]
    fn defaults_apply_when_nothing_is_configured() {
        let config = resolve(&args(&["S1116"]), &PymendConfig::default()).unwrap();
        assert_eq!(config.rule_keys, vec!["S1116"]);
        assert_eq!(config.max_fixes_per_rule, usize::MAX);
        assert_eq!(config.max_files_per_segment, DEFAULT_MAX_FILES_PER_SEGMENT);
        assert_eq!(config.file_output_strategy, FileOutputStrategy::ChangedOnly);
    }

    #[test]
    fn file_values_fill_unset_flags() {
        let file = PymendConfig {
            rules: Some(vec!["S5727".to_owned()]),
            max_fixes_per_rule: Some(5),
            repair_strategy: Some("segment".to_owned()),
            ..PymendConfig::default()
        };
        let config = resolve(&args(&[]), &file).unwrap();
        assert_eq!(config.rule_keys, vec!["S5727"]);
        assert_eq!(config.max_fixes_per_rule, 5);
        assert_eq!(config.repair_strategy, RepairStrategy::Segment);
    }

    #[test]
    fn cli_flags_win_over_file_values() {
        let file = PymendConfig {
            rules: Some(vec!["S5727".to_owned()]),
            max_fixes_per_rule: Some(5),
            ..PymendConfig::default()
        };
        let mut cli = args(&["S1116"]);
        cli.max_fixes_per_rule = Some(1);
        let config = resolve(&cli, &file).unwrap();
        assert_eq!(config.rule_keys, vec!["S1116"]);
        assert_eq!(config.max_fixes_per_rule, 1);
    }

    #[test]
    fn bad_strategy_name_in_file_is_an_error() {
        let file = PymendConfig {
            repair_strategy: Some("parallel".to_owned()),
            ..PymendConfig::default()
        };
        assert!(resolve(&args(&["S1116"]), &file).is_err());
    }
}
