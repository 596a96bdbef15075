//! Work distribution across worker threads.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, RecvTimeoutError, Sender};
use tracing::{debug, error, info};

use crate::crypto::KeyDeriver;
use crate::matcher::MatchCriteria;
use crate::{Error, Result};

use super::generator::{panic_message, CandidateGenerator, WorkerStats};
use super::{ResultRecord, WorkReport, WorkUnit};

/// Default number of attempts each worker makes per dispatch round.
pub const DEFAULT_ROUND_SIZE: u64 = 10_000;

/// Splits `total` attempts across `workers` as evenly as possible.
///
/// The sizes sum to `total` and differ by at most one; the first
/// `total % workers` workers receive the extra attempt.
pub fn split_batches(total: u64, workers: usize) -> Vec<u64> {
    if workers == 0 {
        return Vec::new();
    }

    let n = workers as u64;
    let (base, extra) = (total / n, total % n);
    (0..n).map(|i| base + u64::from(i < extra)).collect()
}

/// A generation request.
#[derive(Debug, Clone)]
pub struct Job {
    /// Vanity constraints applied by every worker
    pub criteria: MatchCriteria,
    /// Number of parallel workers
    pub workers: usize,
    /// Total attempt budget; `None` searches until `target` is reached
    pub attempts: Option<u64>,
    /// Number of matches wanted; `None` runs the whole budget in one round
    pub target: Option<usize>,
    /// Attempts per worker per round when searching for a target
    pub round_size: u64,
    /// Passed through to every work unit
    pub fast_mode: bool,
}

impl Job {
    /// `count` plain wallets with no vanity filter.
    pub fn wallets(count: u64, workers: usize) -> Self {
        Self {
            criteria: MatchCriteria::any(),
            workers,
            attempts: Some(count),
            target: None,
            round_size: DEFAULT_ROUND_SIZE,
            fast_mode: false,
        }
    }

    /// Search for `target` matches of `criteria`, optionally within a budget.
    pub fn search(criteria: MatchCriteria, target: usize, attempts: Option<u64>, workers: usize) -> Self {
        Self {
            criteria,
            workers,
            attempts,
            target: Some(target),
            round_size: DEFAULT_ROUND_SIZE,
            fast_mode: false,
        }
    }

    /// Rejects jobs that cannot be dispatched.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::invalid_request("worker count must be positive"));
        }
        if self.round_size == 0 {
            return Err(Error::invalid_request("round size must be positive"));
        }
        if self.attempts == Some(0) {
            return Err(Error::invalid_request("attempt budget must be positive"));
        }
        if self.target == Some(0) {
            return Err(Error::invalid_request("target count must be positive"));
        }
        if self.attempts.is_none() && self.target.is_none() {
            return Err(Error::invalid_request(
                "either an attempt budget or a target count is required",
            ));
        }
        Ok(())
    }

    /// Upper bound on the number of results returned.
    pub fn requested_yield(&self) -> usize {
        match (self.target, self.attempts) {
            (Some(target), _) => target,
            (None, Some(attempts)) => usize::try_from(attempts).unwrap_or(usize::MAX),
            (None, None) => 0,
        }
    }
}

/// A snapshot of a running job.
#[derive(Debug, Clone, Copy)]
pub struct Progress {
    pub attempts: u64,
    pub matches: u64,
    pub elapsed: Duration,
    /// Expected attempts per match under the job's criteria
    pub expected_attempts: u64,
    /// Chance that at least one match has turned up by now
    pub probability_found: f64,
}

impl Progress {
    /// Returns the current generation rate.
    pub fn attempts_per_second(&self) -> f64 {
        let elapsed = self.elapsed.as_secs_f64();
        if elapsed > 0.0 {
            self.attempts as f64 / elapsed
        } else {
            0.0
        }
    }
}

/// The merged result of a job.
#[derive(Debug, Clone, Default)]
pub struct JobOutcome {
    /// Matches in worker-index order within each round, truncated to the requested yield
    pub results: Vec<ResultRecord>,
    pub attempts: u64,
    pub derivation_faults: u64,
    /// `(worker_id, fault)` for every worker that stopped early
    pub worker_faults: Vec<(usize, String)>,
    pub rounds: usize,
    pub elapsed: Duration,
    /// True if the job was stopped before its budget or target was met
    pub cancelled: bool,
}

impl JobOutcome {
    fn merge(&mut self, report: WorkReport) {
        self.attempts += report.attempts;
        self.derivation_faults += report.derivation_faults;
        if let Some(fault) = report.fault {
            self.worker_faults.push((report.worker_id, fault));
        }
        self.results.extend(report.results);
    }
}

/// Splits a [`Job`] across worker threads and merges their reports.
pub struct WorkerPool<D> {
    job: Job,
    deriver: D,
    stop_flag: Arc<AtomicBool>,
    /// One slot per worker index
    stats: Vec<Arc<WorkerStats>>,
    report_interval: Duration,
    start_time: Instant,
}

impl<D: KeyDeriver> WorkerPool<D> {
    /// Creates a pool for `job`. Nothing is dispatched until [`WorkerPool::run`].
    pub fn new(job: Job, deriver: D) -> Result<Self> {
        job.validate()?;

        let stats = (0..job.workers)
            .map(|_| Arc::new(WorkerStats::new()))
            .collect();

        Ok(Self {
            job,
            deriver,
            stop_flag: Arc::new(AtomicBool::new(false)),
            stats,
            report_interval: Duration::from_secs(5),
            start_time: Instant::now(),
        })
    }

    /// Sets how often the progress callback fires while waiting on workers.
    pub fn with_report_interval(mut self, interval: Duration) -> Self {
        self.report_interval = interval;
        self
    }

    /// Runs the job to completion.
    pub fn run(&self) -> JobOutcome {
        self.run_with_progress(|_| {})
    }

    /// Runs the job, calling `on_progress` every report interval.
    ///
    /// Without a target the whole budget is dispatched at once. With a target,
    /// work goes out in rounds and no new round starts once enough matches are
    /// in; a round that has started always runs to the end.
    pub fn run_with_progress<F: FnMut(&Progress)>(&self, mut on_progress: F) -> JobOutcome {
        let mut outcome = JobOutcome::default();
        let mut remaining = self.job.attempts;

        info!(
            criteria = %self.job.criteria,
            workers = self.job.workers,
            attempts = ?self.job.attempts,
            target = ?self.job.target,
            "starting generation job"
        );

        loop {
            if self.is_stopped() {
                outcome.cancelled = true;
                break;
            }

            let round_total = match self.job.target {
                None => remaining.unwrap_or(0),
                Some(_) => {
                    let per_round = self.job.round_size.saturating_mul(self.job.workers as u64);
                    remaining.map_or(per_round, |left| left.min(per_round))
                }
            };
            if round_total == 0 {
                break;
            }

            let reports = self.dispatch_round(round_total, &mut on_progress);
            outcome.rounds += 1;
            for report in reports {
                outcome.merge(report);
            }
            remaining = remaining.map(|left| left - round_total);

            debug!(
                round = outcome.rounds,
                matches = outcome.results.len(),
                attempts = outcome.attempts,
                "round merged"
            );

            let target_met = self
                .job
                .target
                .map_or(true, |target| outcome.results.len() >= target);
            if target_met || remaining == Some(0) {
                break;
            }
        }

        if self.is_stopped() {
            outcome.cancelled = true;
        }

        outcome.results.truncate(self.job.requested_yield());
        outcome.elapsed = self.elapsed();

        info!(
            matches = outcome.results.len(),
            attempts = outcome.attempts,
            derivation_faults = outcome.derivation_faults,
            worker_faults = outcome.worker_faults.len(),
            cancelled = outcome.cancelled,
            "generation job finished"
        );

        outcome
    }

    /// Runs one round and returns its reports in worker-index order.
    fn dispatch_round<F: FnMut(&Progress)>(&self, total: u64, on_progress: &mut F) -> Vec<WorkReport> {
        let batches = split_batches(total, self.job.workers);
        let (result_tx, result_rx) = unbounded();

        let mut slots: Vec<Option<WorkReport>> = vec![None; batches.len()];
        let mut handles = Vec::with_capacity(batches.len());

        for (id, &batch_size) in batches.iter().enumerate() {
            if batch_size == 0 {
                slots[id] = Some(WorkReport::new(id));
                continue;
            }

            let unit = WorkUnit::new(id, batch_size, &self.job.criteria, self.job.fast_mode);
            match self.spawn_worker(unit, result_tx.clone()) {
                Ok(handle) => handles.push((id, handle)),
                Err(e) => {
                    error!(worker = id, error = %e, "failed to spawn worker");
                    slots[id] = Some(WorkReport::failed(id, format!("spawn failed: {e}")));
                }
            }
        }

        // Drop our sender so the channel closes when all workers finish
        drop(result_tx);

        loop {
            match result_rx.recv_timeout(self.report_interval) {
                Ok(report) => {
                    debug!(
                        worker = report.worker_id,
                        matches = report.results.len(),
                        "worker reported"
                    );
                    let id = report.worker_id;
                    slots[id] = Some(report);
                }
                Err(RecvTimeoutError::Timeout) => on_progress(&self.progress()),
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        for (id, handle) in handles {
            if let Err(payload) = handle.join() {
                let fault = panic_message(payload.as_ref());
                error!(worker = id, %fault, "worker thread died");
                if slots[id].is_none() {
                    slots[id] = Some(WorkReport::failed(id, fault));
                }
            }
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(id, slot)| slot.unwrap_or_else(|| WorkReport::failed(id, "worker did not report")))
            .collect()
    }

    fn spawn_worker(
        &self,
        unit: WorkUnit,
        result_tx: Sender<WorkReport>,
    ) -> std::io::Result<JoinHandle<()>> {
        let id = unit.worker_id;
        let deriver = self.deriver.for_worker(id);
        let stop_flag = self.stop_flag.clone();
        let stats = self.stats[id].clone();

        thread::Builder::new()
            .name(format!("vanity-worker-{}", id))
            .spawn(move || {
                let report = match CandidateGenerator::new(unit, deriver) {
                    Ok(generator) => generator.with_stop_flag(stop_flag).with_stats(stats).run(),
                    Err(e) => WorkReport::failed(id, e.to_string()),
                };
                // Ignore if the pool is gone
                let _ = result_tx.send(report);
            })
    }

    /// Signals all workers to stop at their next attempt boundary and prevents
    /// further rounds.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Relaxed);
    }

    /// Returns a clone of the stop flag for external use (e.g., signal handlers).
    pub fn stop_flag_clone(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    /// Returns true if the pool has been signaled to stop.
    pub fn is_stopped(&self) -> bool {
        self.stop_flag.load(Ordering::Relaxed)
    }

    /// Returns the job being run.
    pub fn job(&self) -> &Job {
        &self.job
    }

    /// Returns the total attempts across all workers.
    pub fn total_attempts(&self) -> u64 {
        self.stats.iter().map(|s| s.total_attempts()).sum()
    }

    /// Returns the total matches found, before truncation.
    pub fn total_matches(&self) -> u64 {
        self.stats.iter().map(|s| s.total_matches()).sum()
    }

    /// Returns the elapsed time since the pool was created.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Returns a progress snapshot.
    pub fn progress(&self) -> Progress {
        let attempts = self.total_attempts();
        Progress {
            attempts,
            matches: self.total_matches(),
            elapsed: self.elapsed(),
            expected_attempts: self.job.criteria.expected_attempts(),
            probability_found: self.job.criteria.probability_within(attempts),
        }
    }
}
