//! Shared error types for the test cluster workspace

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("Invalid service descriptor: {message}")]
    InvalidDescriptor { message: String },

    #[error("Invalid {field} '{value}': {reason}")]
    InvalidRecordKey {
        field: String,
        value: String,
        reason: String,
    },
}

pub type SharedResult<T> = Result<T, SharedError>;
