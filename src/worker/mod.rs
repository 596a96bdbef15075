//! Parallel wallet generation.
//!
//! This module provides:
//! - The request/response messages exchanged with workers
//! - The per-worker candidate generator
//! - A worker pool that splits a job into work units and merges the reports

mod generator;
mod message;
mod pool;

pub use generator::{CandidateGenerator, WorkerStats};
pub use message::{ResultRecord, WorkReport, WorkUnit};
pub use pool::{split_batches, Job, JobOutcome, Progress, WorkerPool, DEFAULT_ROUND_SIZE};
