use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Command-line front end for the returns desk
///
/// Loads return/warranty records from CSV files, turns free-text return
/// descriptions into structured records and summarizes what has been stored.
#[derive(Parser)]
#[command(version, about, name = "returns")]
pub struct Args {
    /// Path to the SQLite database file. Defaults to ReturnsData.db in the
    /// current directory
    #[arg(long, global = true)]
    pub database_file: Option<PathBuf>,

    /// Disable colored output and use plain text
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Print the dispatch response as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Recognize bare product names and reason phrases when no labeled
    /// value is present
    #[arg(long, global = true)]
    pub legacy_keywords: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands for the returns CLI
#[derive(Subcommand)]
pub enum Commands {
    /// Replace the returns table with the contents of a CSV file
    #[command(alias = "l")]
    Load {
        /// CSV file with a header row
        path: String,
    },
    /// Extract a record from a return description and insert it
    #[command(alias = "i")]
    Insert {
        /// Free-text description, e.g. "order: 2100 product: Tablet"
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Show all records, newest first
    #[command(alias = "q")]
    Query,
    /// Summarize all records into a JSON report
    Report {
        /// Output file. Defaults to report.json
        output: Option<String>,
    },
    /// Show what would be extracted from a description without inserting
    Extract {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Insert one description per line from stdin until EOF or "quit"
    Session,
}
