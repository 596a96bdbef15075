//! Candidate generator: the per-worker search loop.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::crypto::{random_mnemonic, KeyDeriver};
use crate::matcher::MatchCriteria;
use crate::Result;

use super::{ResultRecord, WorkReport, WorkUnit};

/// Counters for a single worker slot.
///
/// Written only by the worker that owns the slot; the distributor reads them to
/// report progress.
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Candidates attempted
    pub attempts: AtomicU64,
    /// Matches found
    pub matches: AtomicU64,
}

impl WorkerStats {
    /// Creates new worker stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total attempts made.
    pub fn total_attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Returns the total matches found.
    pub fn total_matches(&self) -> u64 {
        self.matches.load(Ordering::Relaxed)
    }
}

/// Runs one [`WorkUnit`]: generate a mnemonic, derive its account, keep it if
/// the address matches.
pub struct CandidateGenerator<D> {
    unit: WorkUnit,
    criteria: MatchCriteria,
    deriver: D,
    stop_flag: Option<Arc<AtomicBool>>,
    stats: Arc<WorkerStats>,
}

impl<D: KeyDeriver> CandidateGenerator<D> {
    /// Creates a generator, rejecting invalid units before any work is done.
    pub fn new(unit: WorkUnit, deriver: D) -> Result<Self> {
        let criteria = unit.validate()?;

        Ok(Self {
            unit,
            criteria,
            deriver,
            stop_flag: None,
            stats: Arc::new(WorkerStats::new()),
        })
    }

    /// Ends the batch early once `stop_flag` is set. Checked between attempts.
    pub fn with_stop_flag(mut self, stop_flag: Arc<AtomicBool>) -> Self {
        self.stop_flag = Some(stop_flag);
        self
    }

    /// Records progress into `stats` instead of a private counter.
    pub fn with_stats(mut self, stats: Arc<WorkerStats>) -> Self {
        self.stats = stats;
        self
    }

    /// Returns the worker ID.
    pub fn id(&self) -> usize {
        self.unit.worker_id
    }

    /// Runs the batch to completion and returns its report.
    ///
    /// A panic inside the loop ends the batch; everything matched before it is
    /// still returned, with [`WorkReport::fault`] set.
    pub fn run(&self) -> WorkReport {
        let mut report = WorkReport::new(self.unit.worker_id);

        if self.unit.fast_mode {
            debug!(worker = self.id(), "fast mode requested; derivation is unchanged");
        }

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.generate_into(&mut report)));

        if let Err(payload) = outcome {
            let fault = panic_message(payload.as_ref());
            error!(
                worker = self.id(),
                attempts = report.attempts,
                kept = report.results.len(),
                %fault,
                "worker stopped on internal fault"
            );
            report.fault = Some(fault);
        }

        report
    }

    fn generate_into(&self, report: &mut WorkReport) {
        // Each worker owns its entropy source.
        let mut rng = rand::thread_rng();

        for attempt in 0..self.unit.batch_size {
            if self.is_stopped() {
                debug!(worker = self.id(), attempt, "stop requested, ending batch");
                break;
            }

            report.attempts += 1;
            self.stats.attempts.fetch_add(1, Ordering::Relaxed);

            let derived = random_mnemonic(&mut rng)
                .and_then(|mnemonic| Ok((self.deriver.derive(&mnemonic)?, mnemonic)));

            let (account, mnemonic) = match derived {
                Ok(pair) => pair,
                Err(e) => {
                    warn!(worker = self.id(), attempt, error = %e, "skipping candidate");
                    report.derivation_faults += 1;
                    continue;
                }
            };

            let address = account.address().to_checksum();
            if self.criteria.matches(&address) {
                self.stats.matches.fetch_add(1, Ordering::Relaxed);
                report
                    .results
                    .push(ResultRecord::new(&account, mnemonic.to_string()));
            }
        }
    }

    fn is_stopped(&self) -> bool {
        self.stop_flag
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}
