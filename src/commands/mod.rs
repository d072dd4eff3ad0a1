//! Subcommand implementations.

pub mod repair;
pub mod rules;
