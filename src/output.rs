//! Machine-readable output
//!
//! With `--format json` every command prints a single envelope on stdout:
//! `{ "command": ..., "ok": ..., "data": ... }`.

use serde::Serialize;
use std::fmt;
use std::io::Write;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Human,
    Json,
}

impl OutputMode {
    pub fn is_human(&self) -> bool {
        matches!(self, OutputMode::Human)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputMode::Human => "human",
            OutputMode::Json => "json",
        }
    }
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" | "text" => Ok(OutputMode::Human),
            "json" => Ok(OutputMode::Json),
            _ => Err(format!("unknown output format: {}", s)),
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Serialize)]
pub struct Envelope<'a, T: Serialize> {
    pub command: &'a str,
    pub ok: bool,
    pub data: T,
}

pub fn envelope<T: Serialize>(command: &str, ok: bool, data: T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&Envelope { command, ok, data })
}

fn write_envelope<W: Write, T: Serialize>(out: &mut W, command: &str, ok: bool, data: T) -> anyhow::Result<()> {
    writeln!(out, "{}", envelope(command, ok, data)?)?;
    out.flush()?;
    Ok(())
}

/// Print a successful result; a no-op in human mode.
pub fn emit_success<T: Serialize>(mode: OutputMode, command: &str, data: T) -> anyhow::Result<()> {
    if mode == OutputMode::Json {
        write_envelope(&mut std::io::stdout().lock(), command, true, data)?;
    }
    Ok(())
}

/// Print a failed result; a no-op in human mode.
pub fn emit_failure<T: Serialize>(mode: OutputMode, command: &str, data: T) -> anyhow::Result<()> {
    if mode == OutputMode::Json {
        write_envelope(&mut std::io::stdout().lock(), command, false, data)?;
    }
    Ok(())
}

/// Report a top-level error as a JSON envelope on stdout, falling back to
/// plain text on stderr when stdout cannot be written.
pub fn report_json_error(command: &str, message: &str) {
    report_json_error_to(&mut std::io::stdout().lock(), &mut std::io::stderr().lock(), command, message);
}

fn report_json_error_to<O: Write, E: Write>(out: &mut O, err: &mut E, command: &str, message: &str) {
    let data = serde_json::json!({ "error": message });
    if let Err(write_err) = write_envelope(out, command, false, data) {
        let _ = writeln!(err, "[{}] error: {} (json output failed: {:#})", command, message, write_err);
    }
}
