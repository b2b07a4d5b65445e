//! # Centralized Error Handling
//!
//! Unified error types for the entire crate using `thiserror`.

use thiserror::Error;

/// Main error type for rapcol operations
#[derive(Error, Debug)]
pub enum RapcolError {
    /// I/O errors (file missing, permission denied, read/write failures)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed input reads (bad entry fields, missing line terminator)
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Configuration errors (invalid CLI arguments)
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A column's coverage exceeds the fixed capacity of the engine
    #[error("coverage {coverage} at column {column} exceeds the maximum supported coverage {limit}")]
    Capacity {
        column: usize,
        coverage: usize,
        limit: usize,
    },

    /// No feasible solution exists under the chosen (alpha, error-rate)
    #[error("no feasible solution at column {column} (coverage {coverage}, k {k})")]
    Infeasible {
        column: usize,
        coverage: usize,
        k: usize,
    },
}

/// Type alias for Results using RapcolError
pub type Result<T> = std::result::Result<T, RapcolError>;

impl RapcolError {
    /// Create a parse error with a line reference
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
