//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum concurrent jobs (worker slots)
    pub max_concurrent_jobs: usize,
    /// Wall-clock deadline for one converter invocation
    pub convert_timeout: Duration,
    /// Converter binary (name or path)
    pub soffice_bin: PathBuf,
    /// Work directory for per-job scratch workspaces
    pub work_dir: PathBuf,
    /// Webhook endpoint for job lifecycle notifications; unset disables them
    pub webhook_url: Option<String>,
    /// Graceful shutdown timeout (drain of in-flight jobs)
    pub shutdown_timeout: Duration,
    /// How often the worker should scan for orphaned pending jobs
    pub claim_interval: Duration,
    /// Minimum idle time before a pending job can be claimed (crash recovery)
    pub claim_min_idle: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 1,
            convert_timeout: Duration::from_millis(5 * 60 * 1000),
            soffice_bin: PathBuf::from("soffice"),
            work_dir: PathBuf::from("/tmp/docmill"),
            webhook_url: None,
            shutdown_timeout: Duration::from_secs(30),
            claim_interval: Duration::from_secs(30),
            claim_min_idle: Duration::from_secs(300),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            max_concurrent_jobs: std::env::var("MAX_CONCURRENCY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1),
            convert_timeout: Duration::from_millis(
                std::env::var("JOB_TIMEOUT_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5 * 60 * 1000),
            ),
            soffice_bin: std::env::var("SOFFICE_BIN")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("soffice")),
            work_dir: std::env::var("WORKER_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/tmp/docmill")),
            webhook_url: std::env::var("WEBHOOK_URL").ok().filter(|s| !s.is_empty()),
            shutdown_timeout: Duration::from_secs(
                std::env::var("WORKER_SHUTDOWN_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            claim_interval: Duration::from_secs(
                std::env::var("WORKER_CLAIM_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            claim_min_idle: Duration::from_secs(
                std::env::var("WORKER_CLAIM_MIN_IDLE_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
        }
    }
}
