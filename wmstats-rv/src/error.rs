//! Error types for the request view

use thiserror::Error;

/// Result type for request view operations
pub type Result<T> = std::result::Result<T, Error>;

/// Request view errors
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level failure talking to the document store
    #[error("Network error: {0}")]
    Network(String),

    /// Document store answered with a non-success status
    #[error("View query failed with status {status}: {body}")]
    Api { status: u16, body: String },

    /// Response body could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// A batch row carried no identifier
    #[error("Row {index} of the {batch} batch has no id")]
    MissingIdentifier { batch: &'static str, index: usize },

    /// A batch row carried a document that is not a JSON object
    #[error("Document for '{id}' is not a JSON object")]
    InvalidRecord { id: String },
}
