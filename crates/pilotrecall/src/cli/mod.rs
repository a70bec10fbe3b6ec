//! Command-line interface for pilotrecall.
//!
//! This module provides the CLI structure for the `pilotrec` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    parse_time, ConfigCommand, FlightCommand, FlightCreateArgs, ItemAddArgs, ItemCommand,
    ItemEditArgs, OutputFormat, ResetCommand, StatusCommand, ViewCommand,
};

use crate::logging::Verbosity;

/// pilotrec - Recall items for every phase of flight
///
/// Keeps memory items, threats and manual references organized by flight
/// phase, stored locally and available offline.
#[derive(Debug, Parser)]
#[command(name = "pilotrec")]
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
    /// Manage recall items
    #[command(subcommand)]
    Item(ItemCommand),

    /// Manage flights
    #[command(subcommand)]
    Flight(FlightCommand),

    /// Show the checklist for a phase
    View(ViewCommand),

    /// List flight phases in order
    Phases,

    /// Show storage status
    Status(StatusCommand),

    /// Delete all recall items and flights
    Reset(ResetCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Verbosity selected by `-q` and `-v`.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}
