//! CLI command implementations
//!
//! `check` never contacts a server: the version comes from the command
//! line and the explain command is only prepared. Explain failures are
//! reported on stdout as `{"status":"error",...}` responses with their
//! stable code; setup failures (config, arguments, stdin) are `CliError`s.

use std::path::Path;

use serde_json::{json, Value};

use crate::explain::{prepare, ExplainConfig, ExplainError};
use crate::version::{satisfies, ServerVersion};

use super::args::Command;
use super::errors::CliResult;
use super::io::{error_response, ok_response, read_request, write_json};

/// Main entry point for CLI
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Check {
            server_version,
            database,
            config,
        } => check(&server_version, &database, config.as_deref()),
        Command::Satisfies {
            constraint,
            version,
        } => satisfies_command(&constraint, &version),
    }
}

/// Check one captured query read from stdin
pub fn check(server_version: &str, database: &str, config_path: Option<&Path>) -> CliResult<()> {
    let config = load_config(config_path)?;
    config.apply_logging();

    let version = ServerVersion::parse(server_version)?;
    let raw = read_request()?;

    write_json(&check_query(&raw, database, &version, &config))
}

/// Print whether `version` satisfies `constraint`
pub fn satisfies_command(constraint: &str, version: &str) -> CliResult<()> {
    let matched = satisfies(constraint, version)?;
    write_json(&ok_response(json!(matched)))
}

fn load_config(path: Option<&Path>) -> CliResult<ExplainConfig> {
    match path {
        Some(path) => Ok(ExplainConfig::load(path)?),
        None => Ok(ExplainConfig::default()),
    }
}

/// Build the response for one captured query
pub fn check_query(
    raw: &str,
    database: &str,
    version: &ServerVersion,
    config: &ExplainConfig,
) -> Value {
    let prepared = serde_json::from_str::<Value>(raw)
        .map_err(ExplainError::Decode)
        .and_then(|query| {
            prepare(
                database,
                &query,
                version,
                &config.policy_table(),
                config.verbosity,
            )
        });

    match prepared {
        Ok(prepared) => ok_response(json!({
            "kind": prepared.kind,
            "database": prepared.database,
            "server_version": version.to_string(),
            "command": prepared.command,
        })),
        Err(err) => error_response(err.code(), &err.to_string()),
    }
}
