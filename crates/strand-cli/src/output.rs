// crates/strand-cli/src/output.rs
//
// Output formatting utilities for the Strand CLI.
// Supports table and JSON output modes.

use serde::Serialize;
use tabled::{Table, Tabled};

use strand_core::ids::Address;

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty-printed table output (default).
    Table,
    /// JSON output for machine consumption.
    Json,
}

impl OutputFormat {
    pub fn from_flag(json: bool) -> Self {
        if json {
            OutputFormat::Json
        } else {
            OutputFormat::Table
        }
    }
}

/// Format a slice of Tabled items as a table string.
pub fn format_table<T: Tabled>(data: &[T]) -> String {
    Table::new(data).to_string()
}

/// Format a serializable value as a pretty-printed JSON string.
pub fn format_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|e| format!("JSON serialization error: {}", e))
}

/// Trust as shown in tables.
pub fn format_trust(trust: Option<f64>) -> String {
    match trust {
        Some(t) => format!("{:.4}", t),
        None => "-".to_string(),
    }
}

pub fn format_address(address: Option<&Address>) -> String {
    address.map(|a| a.to_string()).unwrap_or_else(|| "-".to_string())
}
