//! Run statistics: per-phase durations and per-repair metadata.

use serde::Serialize;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

/// The phase boundaries a run records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// A parse interval opened.
    ParseStart,
    /// A parse interval closed.
    ParseEnd,
    /// A repair interval opened.
    RepairStart,
    /// A repair interval closed.
    RepairEnd,
}

/// Metadata of one successful repair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairRecord {
    /// Rule that was repaired.
    pub rule_key: String,
    /// File that received the edit.
    pub file_path: String,
    /// 1-based first line of the repaired violation.
    pub start_line: usize,
    /// 1-based last line of the repaired violation.
    pub end_line: usize,
}

/// Serializable statistics report, written on request at the end of a run.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    /// Total wall-clock milliseconds spent parsing.
    pub parse_duration_ms: u128,
    /// Total wall-clock milliseconds spent matching and repairing.
    pub repair_duration_ms: u128,
    /// Every successful repair, in the order they happened.
    pub repairs: Vec<RepairRecord>,
}

/// Accumulates the total time spent inside one phase's start/end intervals.
#[derive(Debug, Default)]
struct IntervalAccumulator {
    open: Option<Instant>,
    total: Duration,
    completed: bool,
}

impl IntervalAccumulator {
    fn start(&mut self) {
        if self.open.is_none() {
            self.open = Some(Instant::now());
        }
    }

    fn stop(&mut self) {
        if let Some(started) = self.open.take() {
            self.total += started.elapsed();
            self.completed = true;
        }
    }

    fn total(&self) -> Option<Duration> {
        self.completed.then_some(self.total)
    }
}

/// Append-only sink for phase durations and repair records.
///
/// Each start opens an interval for its phase and the matching end closes
/// it, adding the elapsed time to the phase's total. Segmented runs
/// re-enter both phases; their totals are the sum of the per-segment
/// intervals, so time spent repairing never leaks into the parse total or
/// vice versa. Ends without an open interval are ignored, as are repeated
/// starts, so exposed durations are always non-negative.
#[derive(Debug, Default)]
pub struct StatsCollector {
    parse: IntervalAccumulator,
    repair: IntervalAccumulator,
    repairs: Vec<RepairRecord>,
}

impl StatsCollector {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a phase boundary.
    pub fn record(&mut self, phase: Phase) {
        match phase {
            Phase::ParseStart => self.parse.start(),
            Phase::ParseEnd => self.parse.stop(),
            Phase::RepairStart => self.repair.start(),
            Phase::RepairEnd => self.repair.stop(),
        }
    }

    /// Records one successful repair.
    pub fn record_repair(&mut self, record: RepairRecord) {
        self.repairs.push(record);
    }

    /// Repairs recorded so far.
    #[must_use]
    pub fn repairs(&self) -> &[RepairRecord] {
        &self.repairs
    }

    /// Total time spent parsing, `None` until a parse interval completes.
    #[must_use]
    pub fn parse_duration(&self) -> Option<Duration> {
        self.parse.total()
    }

    /// Total time spent matching and repairing, `None` until a repair
    /// interval completes.
    #[must_use]
    pub fn repair_duration(&self) -> Option<Duration> {
        self.repair.total()
    }

    /// Builds the report, or `None` while either phase has no completed
    /// interval.
    #[must_use]
    pub fn report(&self) -> Option<StatsReport> {
        let parse = self.parse_duration()?;
        let repair = self.repair_duration()?;
        Some(StatsReport {
            parse_duration_ms: parse.as_millis(),
            repair_duration_ms: repair.as_millis(),
            repairs: self.repairs.clone(),
        })
    }

    /// Serializes the report as pretty JSON to `path`.
    ///
    /// # Errors
    ///
    /// Fails when the report is incomplete or the file cannot be written.
    pub fn write_report(&self, path: &Path) -> anyhow::Result<()> {
        let report = self
            .report()
            .ok_or_else(|| anyhow::anyhow!("statistics are incomplete, no report to write"))?;
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(path, json)
            .map_err(|e| anyhow::anyhow!("writing statistics to {}: {e}", path.display()))
    }
}
