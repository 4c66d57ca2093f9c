//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

/// Login command arguments.
#[derive(Debug, Args)]
pub struct LoginCommand {
    /// Account email
    #[arg(short, long)]
    pub email: String,

    /// Account password
    #[arg(short, long)]
    pub password: String,
}

/// Survey management commands.
#[derive(Debug, Subcommand)]
pub enum SurveyCommand {
    /// Add a survey
    Add {
        /// Survey name, e.g. "General Feedback Survey"
        #[arg(short, long)]
        name: String,

        /// Survey link, e.g. `https://emojot.com/fitsair`
        #[arg(short, long)]
        url: String,
    },

    /// List stored surveys
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Delete a survey
    Delete {
        /// Id of the survey to delete
        id: i64,
    },
}

/// Flight number management commands.
#[derive(Debug, Subcommand)]
pub enum FlightCommand {
    /// Add a flight number
    Add {
        /// Flight code, e.g. FA123
        number: String,
    },

    /// List stored flight numbers
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Delete a flight number
    Delete {
        /// Id of the flight number to delete
        id: i64,
    },
}

/// Dashboard command arguments.
#[derive(Debug, Args)]
pub struct DashboardCommand {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Launch command arguments.
#[derive(Debug, Args)]
pub struct LaunchCommand {
    /// Survey id (defaults to the first stored survey)
    #[arg(short, long)]
    pub survey: Option<i64>,

    /// Flight number id (defaults to the first stored flight)
    #[arg(short, long)]
    pub flight: Option<i64>,

    /// Record the survey as completed while offline
    #[arg(long)]
    pub offline: bool,
}

/// Offline record commands.
#[derive(Debug, Subcommand)]
pub enum RecordsCommand {
    /// List stored survey records
    List {
        /// Only show records waiting to be synced
        #[arg(long)]
        pending: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Delete a survey record
    Delete {
        /// Id of the record to delete
        id: i64,
    },

    /// Mark unsubmitted records as submitted
    Sync {
        /// Treat the device as offline
        #[arg(long)]
        offline: bool,
    },
}

/// Profile commands.
#[derive(Debug, Subcommand)]
pub enum ProfileCommand {
    /// Show the saved profile (or the fallback)
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Save the profile
    Set {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Contact email
        #[arg(short, long)]
        email: String,
    },
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
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
    /// Formatted table
    Table,
    /// JSON output
    Json,
}
