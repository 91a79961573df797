//! Document conversion worker.
//!
//! This crate provides:
//! - The per-job conversion pipeline (fetch, verify, convert, upload)
//! - A bounded-concurrency job executor with retry/DLQ disposition
//! - Best-effort webhook notifications
//! - Graceful shutdown

pub mod checksum;
pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod notify;
pub mod pipeline;
pub mod workspace;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use executor::JobExecutor;
pub use logging::JobLogger;
pub use notify::Notifier;
pub use pipeline::{run_job, ProcessingContext};
pub use workspace::Workspace;
