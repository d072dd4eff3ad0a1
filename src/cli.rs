//! Command-line argument definitions.

use crate::repair::{FileOutputStrategy, RepairStrategy};
use crate::tree::printer::PrettyPrintingStrategy;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;

/// Help text for configuration file options, shown at the bottom of --help.
const CONFIG_HELP: &str = "\
CONFIGURATION FILE (pymend.toml or [tool.pymend] in pyproject.toml):
  Create this file in your project root to set defaults. CLI flags always
  take precedence.

  [pymend]
  rules = [\"S1116\", \"S5727\"]       # Rule keys, in pass order
  max_fixes_per_rule = 10          # Cap on repairs per rule
  file_output_strategy = \"changed-only\"   # or \"all\"
  pretty_printing_strategy = \"sniper\"     # or \"normal\"
  repair_strategy = \"default\"             # or \"segment\"
  max_files_per_segment = 6500
  workspace = \"pymend-workspace\"
  stats_output_file = \"pymend-stats.json\"
";

/// Automatic repair of static-analyzer violations in Python source.
#[derive(Parser, Debug)]
#[command(name = "pymend", version, after_help = CONFIG_HELP)]
pub struct Cli {
    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Repair analyzer violations under a source path.
    Repair(RepairArgs),
    /// List the supported rules.
    Rules {
        /// Output the catalog as JSON.
        #[arg(long)]
        json: bool,
    },
}

/// Options of the `repair` subcommand. Optional fields fall back to the
/// configuration file, then to built-in defaults.
#[derive(Args, Debug, Clone)]
pub struct RepairArgs {
    /// File or directory holding the sources to repair.
    #[arg(long, value_name = "PATH")]
    pub source: PathBuf,

    /// Comma-separated rule keys, repaired in the given order.
    #[arg(long, value_delimiter = ',', value_name = "KEY")]
    pub rule_keys: Vec<String>,

    /// Maximum number of successful repairs per rule.
    #[arg(long, value_name = "N")]
    pub max_fixes_per_rule: Option<usize>,

    /// Which files to write to the workspace: changed-only or all.
    #[arg(long, value_name = "STRATEGY", value_parser = FileOutputStrategy::from_str)]
    pub file_output_strategy: Option<FileOutputStrategy>,

    /// How output files are rendered: sniper (minimal diff) or normal.
    #[arg(long, value_name = "STRATEGY", value_parser = PrettyPrintingStrategy::from_str)]
    pub pretty_printing_strategy: Option<PrettyPrintingStrategy>,

    /// Whole input at once (default) or in bounded segments (segment).
    #[arg(long, value_name = "STRATEGY", value_parser = RepairStrategy::from_str)]
    pub repair_strategy: Option<RepairStrategy>,

    /// Number of files loaded per segment in segment mode.
    #[arg(long, value_name = "N")]
    pub max_files_per_segment: Option<usize>,

    /// Workspace directory receiving repaired files under fixed/.
    #[arg(long, value_name = "DIR")]
    pub workspace: Option<PathBuf>,

    /// Write a JSON statistics report to this file.
    #[arg(long, value_name = "FILE")]
    pub stats_output_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repair_args_parse_with_comma_separated_rules() {
        let cli = Cli::try_parse_from([
            "pymend",
            "repair",
            "--source",
            "src",
            "--rule-keys",
            "S1116,S5727",
            "--max-fixes-per-rule",
            "2",
        ])
        .unwrap();
        let Commands::Repair(args) = cli.command else {
            panic!("expected repair subcommand");
        };
        assert_eq!(args.rule_keys, vec!["S1116", "S5727"]);
        assert_eq!(args.max_fixes_per_rule, Some(2));
    }

    #[test]
    fn strategy_flags_parse_into_enums() {
        let cli = Cli::try_parse_from([
            "pymend",
            "repair",
            "--source",
            "src",
            "--rule-keys",
            "S1116",
            "--file-output-strategy",
            "all",
            "--pretty-printing-strategy",
            "normal",
            "--repair-strategy",
            "segment",
        ])
        .unwrap();
        let Commands::Repair(args) = cli.command else {
            panic!("expected repair subcommand");
        };
        assert_eq!(args.file_output_strategy, Some(FileOutputStrategy::All));
        assert_eq!(
            args.pretty_printing_strategy,
            Some(PrettyPrintingStrategy::Normal)
        );
        assert_eq!(args.repair_strategy, Some(RepairStrategy::Segment));
    }

    #[test]
    fn unknown_strategy_is_rejected_at_parse_time() {
        let result = Cli::try_parse_from([
            "pymend",
            "repair",
            "--source",
            "src",
            "--repair-strategy",
            "parallel",
        ]);
        assert!(result.is_err());
    }
}
