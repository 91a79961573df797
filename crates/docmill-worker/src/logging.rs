//! Per-job structured logging.

use tracing::{error, info, warn};

use docmill_models::JobId;

/// Attaches job context fields to pipeline log events.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    operation: String,
}

impl JobLogger {
    pub fn new(job_id: &JobId, operation: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn info(&self, message: &str) {
        info!(job_id = %self.job_id, operation = %self.operation, "{}", message);
    }

    pub fn warn(&self, message: &str) {
        warn!(job_id = %self.job_id, operation = %self.operation, "{}", message);
    }

    pub fn error(&self, message: &str) {
        error!(job_id = %self.job_id, operation = %self.operation, "{}", message);
    }
}
