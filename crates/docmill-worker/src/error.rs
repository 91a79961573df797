//! Worker error types.

use thiserror::Error;

use docmill_convert::ConvertError;
use docmill_queue::QueueError;
use docmill_storage::StorageError;

pub type WorkerResult<T> = Result<T, WorkerError>;

/// Errors terminal for one job invocation.
///
/// None of these are retried internally; retry belongs to the queue layer
/// based on the propagated failure.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Failed to acquire workspace: {0}")]
    AcquireWorkspace(std::io::Error),

    #[error("Transfer failed: {0}")]
    Transfer(StorageError),

    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("Conversion produced no output for format '{format}'")]
    NoOutput { format: String },

    #[error("Upload failed: {0}")]
    Upload(StorageError),

    #[error("Conversion failed: {0}")]
    Convert(#[from] ConvertError),

    #[error("Job failed: {0}")]
    JobFailed(String),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn job_failed(msg: impl Into<String>) -> Self {
        Self::JobFailed(msg.into())
    }

    /// Stable failure-taxonomy identifier reported in notifications.
    ///
    /// Local IO failures are wrapped at their pipeline step (transfer,
    /// workspace, upload) so every invocation failure resolves to a step
    /// reason; supervision IO after a successful spawn reports as
    /// `spawn_failed`.
    pub fn reason(&self) -> &'static str {
        match self {
            WorkerError::AcquireWorkspace(_) => "acquire_workspace_failed",
            WorkerError::Transfer(_) => "transfer_failed",
            WorkerError::ChecksumMismatch { .. } => "checksum_mismatch",
            WorkerError::NoOutput { .. } => "conversion_no_output",
            WorkerError::Upload(_) => "upload_failed",
            WorkerError::Convert(ConvertError::ConverterNotFound(_))
            | WorkerError::Convert(ConvertError::Spawn(_))
            | WorkerError::Convert(ConvertError::Io(_)) => "spawn_failed",
            WorkerError::Convert(ConvertError::Timeout(_)) => "conversion_timed_out",
            WorkerError::Convert(ConvertError::ExitFailure { .. }) => "conversion_nonzero_exit",
            _ => "job_failed",
        }
    }
}
