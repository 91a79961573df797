//! S3-compatible object storage client for conversion artifacts.
//!
//! This crate provides:
//! - Streaming download of input artifacts to local scratch files
//! - Streaming upload of produced artifacts
//! - Deterministic result-key derivation

pub mod client;
pub mod error;
pub mod keys;

pub use client::{StorageClient, StorageConfig};
pub use error::{StorageError, StorageResult};
pub use keys::{content_type_for, result_key};
