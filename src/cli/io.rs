//! JSON output for the CLI
//!
//! - One JSON object per line on stdout
//! - Logs never go to stdout
//! - UTF-8 only

use std::io::{self, Write};

use serde_json::{json, Value};

use super::errors::CliResult;

/// Write a value as one JSON line to `writer`
pub fn write_line<W: Write>(writer: &mut W, value: &Value) -> CliResult<()> {
    serde_json::to_writer(&mut *writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Report a resource that lost its user
pub fn write_lost_user(resource_name: &str) -> CliResult<()> {
    write_line(&mut io::stdout(), &lost_user_line(resource_name))
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    write_line(&mut io::stdout(), &json!({ "status": "ok", "data": data }))
}

fn lost_user_line(resource_name: &str) -> Value {
    json!({ "resource": resource_name })
}
