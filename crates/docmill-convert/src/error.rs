//! Error types for converter supervision.

use thiserror::Error;

/// Result type for converter operations.
pub type ConvertResult<T> = Result<T, ConvertError>;

/// Errors that can occur while running the converter.
///
/// Exactly one of normal exit, timeout, or spawn failure occurs per
/// invocation; the variants keep those outcomes distinguishable.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Converter not found: {0}")]
    ConverterNotFound(String),

    #[error("Failed to spawn converter: {0}")]
    Spawn(std::io::Error),

    #[error("Converter exited with status {code:?}: {stderr}")]
    ExitFailure {
        code: Option<i32>,
        /// Truncated stderr excerpt for diagnostics
        stderr: String,
    },

    #[error("Conversion timed out after {0} ms")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
