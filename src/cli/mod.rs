//! CLI module for explainer
//!
//! Provides command-line interface for:
//! - check: Classify a captured query and print the prepared explain command
//! - satisfies: Evaluate a version constraint

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{check, check_query, run, run_command, satisfies_command};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{error_response, ok_response, read_request, write_json};
