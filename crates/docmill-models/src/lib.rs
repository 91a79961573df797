//! Shared data models for the docmill conversion worker.
//!
//! This crate provides Serde-serializable types for:
//! - Conversion jobs and requested output formats
//! - Per-file conversion results
//! - Job outcomes reported to the dispatcher and webhook

pub mod job;
pub mod outcome;

pub use job::{ConversionJob, JobId, OutputRequest};
pub use outcome::{JobOutcome, ResultEntry};
