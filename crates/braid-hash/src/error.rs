//! Error types for hash-space arithmetic

use thiserror::Error;

/// Hash arithmetic error types
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HashError {
    /// Division by a zero hash value
    #[error("Division by zero hash value")]
    DivisionByZero,

    /// A decoded value does not fit the 127-bit hash space
    #[error("Value exceeds the 127-bit hash space")]
    OutOfRange,

    /// A serialized hash value could not be parsed
    #[error("Invalid hash encoding: {0}")]
    InvalidEncoding(String),
}
