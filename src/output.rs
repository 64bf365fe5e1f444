//! Rendering of command results as tables or JSON.

use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON on stdout
    Json,
}

/// Writes command results to stdout in one format.
#[derive(Debug, Clone, Copy)]
pub struct Printer {
    format: OutputFormat,
}

impl Printer {
    /// Create a printer for the selected format.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// A table, or a JSON array.
    pub fn rows<T: Serialize + Tabled>(&self, rows: &[T]) {
        match self.format {
            OutputFormat::Table if rows.is_empty() => println!("(none)"),
            OutputFormat::Table => println!("{}", Table::new(rows)),
            OutputFormat::Json => print_json(rows),
        }
    }

    /// A completed change. JSON mode prints `payload` instead of `line`.
    pub fn done<T: Serialize>(&self, line: &str, payload: &T) {
        match self.format {
            OutputFormat::Table => println!("✓ {line}"),
            OutputFormat::Json => print_json(payload),
        }
    }

    /// A request that changed nothing or was refused.
    pub fn unchanged<T: Serialize>(&self, line: &str, payload: &T) {
        match self.format {
            OutputFormat::Table => println!("⚠ {line}"),
            OutputFormat::Json => print_json(payload),
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => report_error(&format!("Failed to encode output: {e}")),
    }
}

/// Writes a failure to stderr.
pub fn report_error(msg: &str) {
    eprintln!("✗ {msg}");
}
