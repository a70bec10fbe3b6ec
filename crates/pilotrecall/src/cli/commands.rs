//! CLI subcommand definitions.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDateTime};
use clap::{Args, Subcommand, ValueEnum};

use crate::phase::FlightPhase;

/// Recall item commands.
#[derive(Debug, Subcommand)]
pub enum ItemCommand {
    /// Add a recall item
    Add(ItemAddArgs),

    /// List recall items
    List {
        /// Only items tagged with this phase
        #[arg(short, long)]
        phase: Option<FlightPhase>,

        /// Only tier-1 items
        #[arg(long)]
        critical: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },

    /// Show one recall item
    Show {
        /// Item identifier
        id: i64,

        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },

    /// Change fields of a recall item
    Edit(ItemEditArgs),

    /// Delete a recall item
    Delete {
        /// Item identifier
        id: i64,
    },
}

/// Arguments for `item add`.
#[derive(Debug, Args)]
pub struct ItemAddArgs {
    /// Item title
    pub title: String,

    /// Phase the item applies to (repeat or comma-separate)
    #[arg(short, long = "phase", value_delimiter = ',', required = true)]
    pub phases: Vec<FlightPhase>,

    /// Longer description
    #[arg(short, long)]
    pub description: Option<String>,

    /// Manual reference, e.g. "OM-C 4.3.2"
    #[arg(short, long)]
    pub reference: Option<String>,

    /// Threat tag (repeatable)
    #[arg(short, long = "threat")]
    pub threats: Vec<String>,

    /// Mark as tier-1 (critical)
    #[arg(long)]
    pub tier1: bool,

    /// Treat the title as a deep link regardless of its shape
    #[arg(long)]
    pub deeplink: bool,

    /// File to attach
    #[arg(short, long, value_name = "FILE")]
    pub attachment: Option<PathBuf>,

    /// Media type of the attachment
    #[arg(long, default_value = "application/octet-stream")]
    pub media_type: String,

    /// Attach to this flight and make it the active one
    #[arg(long, value_name = "ID")]
    pub flight: Option<i64>,
}

/// Arguments for `item edit`.
#[derive(Debug, Args)]
pub struct ItemEditArgs {
    /// Item identifier
    pub id: i64,

    /// New title
    #[arg(long)]
    pub title: Option<String>,

    /// New description
    #[arg(short, long)]
    pub description: Option<String>,

    /// New reference
    #[arg(short, long)]
    pub reference: Option<String>,

    /// Replace the phases (repeat or comma-separate)
    #[arg(short, long = "phase", value_delimiter = ',')]
    pub phases: Vec<FlightPhase>,

    /// Replace the threat tags (repeatable)
    #[arg(short, long = "threat")]
    pub threats: Vec<String>,

    /// Set or clear the tier-1 flag
    #[arg(long, value_name = "BOOL")]
    pub tier1: Option<bool>,

    /// Replace the attachment with this file
    #[arg(short, long, value_name = "FILE", conflicts_with = "remove_attachment")]
    pub attachment: Option<PathBuf>,

    /// Media type of the new attachment
    #[arg(long, default_value = "application/octet-stream")]
    pub media_type: String,

    /// Remove the attachment
    #[arg(long)]
    pub remove_attachment: bool,
}

/// Flight commands.
#[derive(Debug, Subcommand)]
pub enum FlightCommand {
    /// Create a flight and make it active
    Create(FlightCreateArgs),

    /// List flights
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },

    /// Show a flight and its recall items
    Show {
        /// Flight identifier
        id: i64,

        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },

    /// Make a flight the active one
    Activate {
        /// Flight identifier
        id: i64,
    },

    /// Mark a flight as completed
    Complete {
        /// Flight identifier
        id: i64,
    },

    /// Delete a flight; its recall items are kept
    Delete {
        /// Flight identifier
        id: i64,
    },
}

/// Arguments for `flight create`.
#[derive(Debug, Args)]
pub struct FlightCreateArgs {
    /// Departure airport code
    pub from: String,

    /// Arrival airport code
    pub to: String,

    /// Departure time, RFC 3339 or "YYYY-MM-DD HH:MM" in UTC
    #[arg(short, long, value_parser = parse_time)]
    pub departure: i64,

    /// Arrival time, RFC 3339 or "YYYY-MM-DD HH:MM" in UTC
    #[arg(short, long, value_parser = parse_time)]
    pub arrival: i64,

    /// Free-text notes
    #[arg(short, long)]
    pub notes: Option<String>,
}

/// Arguments for `view`.
#[derive(Debug, Args)]
pub struct ViewCommand {
    /// Phase to show; defaults to the configured initial phase
    #[arg(short, long)]
    pub phase: Option<FlightPhase>,

    /// Only tier-1 items
    #[arg(long)]
    pub critical: bool,

    /// Limit the checklist to this flight's items and make it active
    #[arg(long, value_name = "ID")]
    pub flight: Option<i64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Reset command arguments.
#[derive(Debug, Args)]
pub struct ResetCommand {
    /// Confirm deleting every recall item and flight
    #[arg(long)]
    pub yes: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// JSON output
    Json,
}

/// Parse a UTC instant into epoch milliseconds.
///
/// # Errors
///
/// Returns a message naming the accepted formats.
pub fn parse_time(s: &str) -> Result<i64, String> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.timestamp_millis());
    }
    ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.and_utc().timestamp_millis())
        .ok_or_else(|| format!("invalid time '{s}': expected RFC 3339 or YYYY-MM-DD HH:MM"))
}
