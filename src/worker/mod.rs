//! Parallel search execution.
//!
//! This module provides:
//! - The batched point-increment enumerator (the hot loop)
//! - CPU worker threads
//! - Pool coordination: cancellation, deadlines, match collection

mod cpu;
mod pool;

pub use cpu::{BatchEnumerator, CpuWorker, WorkerStats};
pub use pool::{PoolOptions, SearchOutcome, SearchReport, VanityResult, WorkerPool};
