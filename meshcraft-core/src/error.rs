//! Error types for meshcraft

use thiserror::Error;

/// Main error type for meshcraft core operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type alias for meshcraft core operations
pub type Result<T> = std::result::Result<T, Error>;
