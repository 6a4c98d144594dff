use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("CSV Error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("I/O Error: {0}")]
    IoError(#[from] io::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("{0} cannot be represented as a fixed-point decimal")]
    Unrepresentable(f64),
    #[error("Timestamp overflowed while advancing the stream")]
    TimestampOverflow,
    #[error("Line {line}: {reason}")]
    Invariant { line: u64, reason: String },
}
