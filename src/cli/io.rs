//! JSON I/O handling for CLI
//!
//! - Input: a single captured query as one JSON line on stdin
//! - Output: a single JSON object on stdout
//! - UTF-8 only

use std::io::{self, BufRead, Write};

use serde_json::{json, Value};

use super::errors::{CliError, CliResult};

/// Read one raw input line from stdin
pub fn read_request() -> CliResult<String> {
    let stdin = io::stdin();
    let mut line = String::new();

    stdin.lock().read_line(&mut line)?;

    if line.trim().is_empty() {
        return Err(CliError::io_error("Empty input"));
    }

    Ok(line)
}

/// Success response envelope
pub fn ok_response(data: Value) -> Value {
    json!({
        "status": "ok",
        "data": data
    })
}

/// Error response envelope
pub fn error_response(code: &str, message: &str) -> Value {
    json!({
        "status": "error",
        "code": code,
        "message": message
    })
}

/// Write a response object to stdout
pub fn write_json(response: &Value) -> CliResult<()> {
    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, response)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}
