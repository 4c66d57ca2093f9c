//! Command-line interface for cabinsurvey.
//!
//! This module provides the CLI structure for the `cabinsurvey` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, DashboardCommand, FlightCommand, LaunchCommand, LoginCommand, OutputFormat,
    ProfileCommand, RecordsCommand, StatusCommand, SurveyCommand,
};

/// cabinsurvey - Launch passenger surveys and keep records offline
///
/// Pick a survey and a flight, open the survey link, and keep a local record
/// of every completed survey until it can be synced.
#[derive(Debug, Parser)]
#[command(name = "cabinsurvey")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for info, -vv for trace)
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
    /// Log in
    Login(LoginCommand),

    /// Log out
    Logout,

    /// Show who is logged in
    Whoami,

    /// View configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Record store commands
    #[command(flatten)]
    Store(StoreCommand),
}

/// Commands that work on the record store and need a logged-in session.
#[derive(Debug, Subcommand)]
pub enum StoreCommand {
    /// Show surveys, flights and greeting (seeds defaults on first use)
    Dashboard(DashboardCommand),

    /// Open a survey for a flight and record its completion
    Launch(LaunchCommand),

    /// Manage surveys
    #[command(subcommand)]
    Survey(SurveyCommand),

    /// Manage flight numbers
    #[command(subcommand)]
    Flight(FlightCommand),

    /// Manage stored survey records
    #[command(subcommand)]
    Records(RecordsCommand),

    /// View or update the user profile
    #[command(subcommand)]
    Profile(ProfileCommand),

    /// Show store status
    Status(StatusCommand),
}

impl Command {
    /// Whether the command needs a logged-in session.
    #[must_use]
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::Store(_))
    }
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
