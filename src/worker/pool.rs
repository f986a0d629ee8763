//! Worker pool management.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, Sender};
use num_bigint::BigUint;

use crate::curve::EdwardsPoint;
use crate::matcher::Base64Prefix;

use super::cpu::{CpuWorker, WorkerStats};

/// A public key whose base64 encoding starts with the requested prefix,
/// together with the increment count that reached it.
#[derive(Debug, Clone)]
pub struct VanityResult {
    /// Montgomery u-coordinate bytes of the vanity public key.
    pub public_key: [u8; 32],
    /// Steps of Q from the starting point to this key.
    pub offset: BigUint,
    /// The worker that found it.
    pub worker_id: usize,
}

impl VanityResult {
    pub fn public_key_base64(&self) -> String {
        use base64::engine::general_purpose::STANDARD;
        use base64::Engine as _;
        STANDARD.encode(self.public_key)
    }
}

/// Why a search run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The requested number of matches was collected.
    Found,
    /// External cancellation fired before any match.
    Cancelled,
    /// The deadline elapsed before any match.
    TimedOut,
    /// Every worker spent its candidate limit without a match.
    Exhausted,
}

/// The collected results of a completed search run.
#[derive(Debug)]
pub struct SearchReport {
    pub matches: Vec<VanityResult>,
    pub outcome: SearchOutcome,
    pub attempts: u64,
    pub elapsed: Duration,
}

/// Search parameters shared by every worker in a pool.
#[derive(Debug, Clone)]
pub struct PoolOptions {
    /// Worker thread count.
    pub workers: usize,
    /// Candidates per batch; an even power of two in [2, 8192].
    pub batch_size: usize,
    /// Stop each worker after this many candidates.
    pub limit: Option<u64>,
    /// Collect up to this many matches before stopping.
    pub matches: usize,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            workers: num_cpus::get(),
            batch_size: 1024,
            limit: None,
            matches: 1,
        }
    }
}

/// Manages a pool of workers searching from a shared starting point.
///
/// Workers share nothing on the hot path except a stop flag and the
/// bulk-updated attempt counter; each owns its batch buffers and starts
/// at an independent random 64-bit skip.
pub struct WorkerPool {
    num_workers: usize,
    handles: Option<Vec<JoinHandle<()>>>,
    result_rx: Receiver<VanityResult>,
    stop_flag: Arc<AtomicBool>,
    stats: Arc<WorkerStats>,
    start_time: Instant,
    matches_wanted: usize,
}

impl WorkerPool {
    /// Spawn workers enumerating from `start`.
    pub fn new(start: EdwardsPoint, prefix: Base64Prefix, options: PoolOptions) -> Self {
        let num_workers = options.workers.max(1);
        let (result_tx, result_rx) = bounded(num_workers);
        let stop_flag = Arc::new(AtomicBool::new(false));
        let stats = Arc::new(WorkerStats::new());

        let handles = Self::spawn_workers(
            start,
            prefix,
            &options,
            num_workers,
            result_tx,
            stop_flag.clone(),
            stats.clone(),
        );

        Self {
            num_workers,
            handles: Some(handles),
            result_rx,
            stop_flag,
            stats,
            start_time: Instant::now(),
            matches_wanted: options.matches.max(1),
        }
    }

    fn spawn_workers(
        start: EdwardsPoint,
        prefix: Base64Prefix,
        options: &PoolOptions,
        num_workers: usize,
        result_tx: Sender<VanityResult>,
        stop_flag: Arc<AtomicBool>,
        stats: Arc<WorkerStats>,
    ) -> Vec<JoinHandle<()>> {
        let stop_on_match = options.matches <= 1;

        (0..num_workers)
            .map(|id| {
                let worker = CpuWorker::new(
                    id,
                    start,
                    rand::random::<u64>(),
                    options.batch_size,
                    options.limit,
                    prefix.clone(),
                    result_tx.clone(),
                    stop_flag.clone(),
                    stats.clone(),
                    stop_on_match,
                );

                thread::Builder::new()
                    .name(format!("vanity-worker-{}", id))
                    .spawn(move || worker.run())
                    .expect("failed to spawn worker thread")
            })
            .collect()
    }

    /// Waits for a result with a timeout. `None` on timeout.
    pub fn wait_for_result(&self, timeout: Duration) -> Option<VanityResult> {
        self.result_rx.recv_timeout(timeout).ok()
    }

    /// Receives a result without blocking.
    pub fn try_recv(&self) -> Option<VanityResult> {
        self.result_rx.try_recv().ok()
    }

    /// Signals all workers to stop at their next batch boundary.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.stop_flag.load(Ordering::Relaxed)
    }

    /// The stop flag, for wiring into a signal handler.
    pub fn stop_flag_clone(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    /// True once every worker thread has exited.
    pub fn workers_finished(&self) -> bool {
        self.handles
            .as_ref()
            .map(|handles| handles.iter().all(|h| h.is_finished()))
            .unwrap_or(true)
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    pub fn total_attempts(&self) -> u64 {
        self.stats.total_attempts()
    }

    pub fn total_matches(&self) -> u64 {
        self.stats.total_matches()
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn attempts_per_second(&self) -> f64 {
        let elapsed = self.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.total_attempts() as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Stops the workers and waits for them in place, leaving final
    /// statistics readable.
    pub fn shutdown(&mut self) {
        self.stop();
        if let Some(handles) = self.handles.take() {
            for handle in handles {
                let _ = handle.join();
            }
        }
    }

    /// Waits for all workers to complete.
    pub fn join(mut self) {
        self.shutdown();
    }

    /// Drives the search to completion and reports what happened.
    ///
    /// Ends when enough matches arrived, the deadline elapsed, the stop
    /// flag was raised externally, or every worker spent its candidate
    /// limit.
    /// Deadline and external cancellation compose: whichever fires first
    /// wins.
    pub fn run(mut self, deadline: Option<Duration>) -> SearchReport {
        let poll = Duration::from_millis(50);
        let mut matches = Vec::new();

        let outcome = loop {
            if let Some(result) = self.wait_for_result(poll) {
                matches.push(result);
                if matches.len() >= self.matches_wanted {
                    break SearchOutcome::Found;
                }
                continue;
            }

            if let Some(limit) = deadline {
                if self.elapsed() >= limit {
                    self.drain_into(&mut matches);
                    break if matches.is_empty() {
                        SearchOutcome::TimedOut
                    } else {
                        SearchOutcome::Found
                    };
                }
            }

            if self.is_stopped() {
                self.drain_into(&mut matches);
                break if matches.is_empty() {
                    SearchOutcome::Cancelled
                } else {
                    SearchOutcome::Found
                };
            }

            if self.workers_finished() {
                self.drain_into(&mut matches);
                break if matches.is_empty() {
                    SearchOutcome::Exhausted
                } else {
                    SearchOutcome::Found
                };
            }
        };

        self.shutdown();

        SearchReport {
            matches,
            outcome,
            attempts: self.total_attempts(),
            elapsed: self.elapsed(),
        }
    }

    fn drain_into(&self, matches: &mut Vec<VanityResult>) {
        while let Some(result) = self.try_recv() {
            matches.push(result);
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
