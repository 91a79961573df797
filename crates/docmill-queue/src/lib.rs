//! Redis Streams job queue.
//!
//! This crate provides:
//! - Job enqueueing via Redis Streams with idempotency-key dedup
//! - Worker consumption with retry counters and a dead letter stream
//! - Stale-job reclamation for crashed workers

pub mod error;
pub mod queue;

pub use error::{QueueError, QueueResult};
pub use queue::{JobQueue, QueueConfig};
