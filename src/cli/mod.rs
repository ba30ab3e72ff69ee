//! Host support for running Basil programs.
//!
//! Provides programmatic access to the run/check pipeline for embedding in
//! other tools, the default file-based import resolver, and JSON
//! conversion for moving data in and out of scripts.

mod convert;
mod import;
mod run;

pub use convert::{json_to_value, value_to_json};
pub use import::register_file_imports;
pub use run::{execute_run, RunOptions, RunOutcome};

use std::io;

use crate::parser::ParseError;

/// Errors that can occur during CLI operations
#[derive(Debug)]
pub enum CliError {
    /// One or more parse errors; the program was not run
    Parse(Vec<ParseError>),
    /// The program finished with an uncaught error value
    Runtime(String),
    /// JSON conversion error
    Json(serde_json::Error),
    /// IO error
    Io(io::Error),
    /// No source provided
    NoInput,
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Parse(errors) => {
                writeln!(f, "found {} parse error(s):", errors.len())?;
                for error in errors {
                    writeln!(f, "  {}", error)?;
                }
                Ok(())
            }
            CliError::Runtime(message) => write!(f, "ERROR: {}", message),
            CliError::Json(e) => write!(f, "invalid JSON: {}", e),
            CliError::Io(e) => write!(f, "IO error: {}", e),
            CliError::NoInput => {
                write!(f, "no code provided. Pass an argument or pipe source to stdin.")
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Json(e) => Some(e),
            CliError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Json(e)
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        CliError::Io(e)
    }
}
