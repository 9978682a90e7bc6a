//! CLI argument definitions using clap
//!
//! Commands:
//! - explainer check --server-version <v> [--database <db>] [--config <path>]
//! - explainer satisfies --constraint <c> --version <v>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// explainer - version-aware EXPLAIN for captured queries
#[derive(Parser, Debug)]
#[command(name = "explainer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Classify a captured query from stdin and print the explain command
    /// that would be sent, or the reason it cannot be explained
    Check {
        /// Server version to check against, e.g. 3.4.7
        #[arg(long)]
        server_version: String,

        /// Target database (defaults to the one named in the capture)
        #[arg(long, default_value = "")]
        database: String,

        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Check a version against a constraint such as "< 3.4"
    Satisfies {
        /// Version constraint
        #[arg(long)]
        constraint: String,

        /// Version to test
        #[arg(long)]
        version: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
