//! Command-line interface for carelog.
//!
//! This module provides the CLI structure and command handlers for the
//! `carelog` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    CardCommand, ConfigCommand, HistoryCommand, MeasureCommand, MeasurementTypeArg, OutputFormat,
    SideArg, StatusCommand, TrendCommand,
};

/// carelog - offline-first clinical records
///
/// Tracks patients' insurance cards and ROM/MMT assessments in a local,
/// on-device database and derives per-joint trend indicators from the
/// recorded history.
#[derive(Debug, Parser)]
#[command(name = "carelog")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Record a measurement
    Measure(MeasureCommand),

    /// Manage insurance cards
    #[command(subcommand)]
    Card(CardCommand),

    /// Show a patient's grouped measurement history
    History(HistoryCommand),

    /// Show per-group trend indicators
    Trend(TrendCommand),

    /// Show database status
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
