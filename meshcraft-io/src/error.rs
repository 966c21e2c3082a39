//! Error types for I/O operations

use std::path::PathBuf;
use thiserror::Error;

/// Result type for mesh I/O operations.
pub type IoResult<T> = Result<T, IoError>;

/// Errors that can occur during I/O operations
#[derive(Error, Debug)]
pub enum IoError {
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Unknown mesh format: .{extension}")]
    UnknownFormat { extension: String },

    /// Neither the ASCII nor the binary STL reader accepted the input.
    #[error("Unable to detect STL format (ascii: {ascii}; binary: {binary})")]
    FormatDetection { ascii: String, binary: String },

    /// A binary STL triangle count above the sanity ceiling.
    #[error("File too large, got {count} triangles which exceeds the maximum of {max}")]
    OversizedCount { count: u64, max: u64 },

    /// ASCII STL grammar mismatch. `recoverable` is set while only the
    /// initial header lookahead has been consumed from the stream.
    #[error("ASCII STL parse error at line {line}: {message}")]
    AsciiParse {
        line: usize,
        message: String,
        recoverable: bool,
    },

    #[error("OBJ parse error at line {line}: {message}")]
    TextParse { line: usize, message: String },

    #[error("Invalid STL header: expected {expected} bytes, got {got}")]
    InvalidHeader { expected: usize, got: usize },

    #[error("Truncated STL data: expected {expected} triangles, got {got}")]
    Truncated { expected: u32, got: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] meshcraft_core::Error),
}

impl IoError {
    /// Whether a binary reader could still start from the peeked header.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, IoError::AsciiParse { recoverable: true, .. })
    }

    /// `Some(recoverable)` for ASCII grammar errors, `None` for anything else.
    pub(crate) fn ascii_recoverability(&self) -> Option<bool> {
        match self {
            IoError::AsciiParse { recoverable, .. } => Some(*recoverable),
            _ => None,
        }
    }

    /// Map a failed `File::open` to `FileNotFound` when appropriate.
    pub(crate) fn open(path: &std::path::Path, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            IoError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IoError::Io(err)
        }
    }
}
