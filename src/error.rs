//! Error types for qq

use thiserror::Error;

#[derive(Error, Debug)]
pub enum QqError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Execution error: {0}")]
    ExecutionError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Invalid delimiter pattern: {0}")]
    PatternError(#[from] regex::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("invalid encoding name: {0}")]
    UnknownEncoding(String),

    #[error("no such table: {0}")]
    NoSuchTable(String),

    #[error("no such column: {0}")]
    NoSuchColumn(String),

    #[error("ambiguous column name: {0}")]
    AmbiguousColumn(String),

    #[error("table {0} already exists")]
    DuplicateTable(String),

    #[error("duplicate column name: {0}")]
    DuplicateColumn(String),

    #[error("Readline error: {0}")]
    ReadlineError(String),
}

pub type Result<T> = std::result::Result<T, QqError>;
