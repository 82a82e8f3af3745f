//! Error types for the HTTP server.

use thiserror::Error;

use crate::parser::Error as ParserError;

/// Errors that can occur during HTTP server operation.
#[derive(Debug, Error)]
pub enum Error {
    /// Error parsing an HTTP request.
    #[error("Parse error: {0}")]
    ParseError(#[from] ParserError),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The request head did not fit in the read buffer.
    #[error("Request head exceeds {0} bytes")]
    HeadTooLarge(usize),

    /// An environment variable holds a value that cannot be used.
    #[error("Invalid value {value:?} for {key}")]
    Config { key: &'static str, value: String },

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
