//! Core library for `pymend`, an automatic repairer of static-analysis
//! violations in Python source.
//!
//! The pipeline parses the input into per-file translation units, runs the
//! analyzer's detectors to get textual violations, matches each violation to
//! the best-fitting tree node, and lets the rule's processor record a
//! bounded mutation. Changed files are written to a workspace directory.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

/// Rule detectors producing textual violation records.
pub mod analyzer;

/// Command-line argument definitions.
pub mod cli;

/// Registry of translation units touched by repairs.
pub mod collector;

/// Subcommand implementations.
pub mod commands;

/// Configuration file loading.
pub mod config;

/// Shared constants and regex patterns.
pub mod constants;

/// Phase timings and per-repair statistics.
pub mod events;

/// Violation-to-node best-fit matching.
pub mod matcher;

/// Rule-specific repair policies.
pub mod processor;

/// The repair orchestrator.
pub mod repair;

/// Arena tree, parser adapter, edit engine and printer.
pub mod tree;

/// Line/column mapping and path helpers.
pub mod utils;

/// The violation position model.
pub mod violation;

#[cfg(test)]
pub mod test_utils;
