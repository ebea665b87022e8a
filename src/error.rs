//! Error types for the configuration registry.

use std::path::PathBuf;
use thiserror::Error;

/// Raw file loading errors.
///
/// These never escape the registry: a failed load still produces a resident
/// file with no sections, and the error text is queued as a diagnostic.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to open config file: {}", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("Failed to read config file '{}': {source}", .path.display())]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Rejections raised by a section parser while ingesting a key/value pair.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IngestError {
    #[error("Duplicate Configuration Key: {key}")]
    DuplicateKey { key: String },

    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Lookup failures reported by the inspection commands.
#[derive(Error, Debug)]
pub enum InspectError {
    #[error("Section '{section}' not found{}", suggestion_suffix(.suggestion))]
    SectionNotFound {
        section: String,
        suggestion: Option<String>,
    },

    #[error("Key '{key}' not found in section '{section}'")]
    KeyNotFound { section: String, key: String },
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    suggestion
        .as_ref()
        .map(|s| format!(" (did you mean '{s}'?)"))
        .unwrap_or_default()
}
