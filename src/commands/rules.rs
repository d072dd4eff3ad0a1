//! The `rules` subcommand: list the supported rule catalog.

use crate::processor::{Processor, ALL_PROCESSORS};
use anyhow::Result;
use comfy_table::Table;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RuleInfo {
    rule_key: &'static str,
    check_name: &'static str,
    description: &'static str,
}

impl From<Processor> for RuleInfo {
    fn from(processor: Processor) -> Self {
        Self {
            rule_key: processor.rule_key(),
            check_name: processor.check_name(),
            description: processor.description(),
        }
    }
}

/// Prints the rule catalog as a table, or as JSON with `--json`.
///
/// # Errors
///
/// Fails only on writer errors.
pub fn run<W: Write>(json: bool, mut writer: W) -> Result<()> {
    if json {
        let catalog: Vec<RuleInfo> = ALL_PROCESSORS.into_iter().map(RuleInfo::from).collect();
        writeln!(writer, "{}", serde_json::to_string_pretty(&catalog)?)?;
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Rule", "Check", "Description"]);
    for processor in ALL_PROCESSORS {
        table.add_row(vec![
            processor.rule_key(),
            processor.check_name(),
            processor.description(),
        ]);
    }
    writeln!(writer, "{table}")?;
    Ok(())
}
