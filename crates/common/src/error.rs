//! Error types for translit-check

use thiserror::Error;

/// Result type alias using the common Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by corpus loading and report generation
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid test case: {0}")]
    InvalidCase(String),

    #[error("Duplicate test case id: {0}")]
    DuplicateCase(String),

    /// A record whose column set differs from the first record's.
    #[error("Schema mismatch in row {row}: expected columns {expected:?}, found {found:?}")]
    SchemaMismatch {
        row: usize,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("CSV parse error at line {line}: {reason}")]
    CsvParse { line: usize, reason: String },
}
