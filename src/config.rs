//! Runtime configuration for the vanity wallet generator.

use std::path::PathBuf;

use clap::Parser;

use crate::crypto::DEFAULT_PATH;
use crate::matcher::MatchCriteria;
use crate::worker::{Job, DEFAULT_ROUND_SIZE};

/// Ramestta HD Vanity Wallet Generator
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Address prefix to search for (hex characters only, 0x marker optional)
    #[arg(short, long)]
    pub prefix: Option<String>,

    /// Address suffix to search for (hex characters only)
    #[arg(short, long)]
    pub suffix: Option<String>,

    /// Number of wallets to return
    #[arg(short = 'n', long, default_value = "1")]
    pub count: usize,

    /// Total attempt budget (default: exactly --count without a pattern, unlimited with one)
    #[arg(short, long)]
    pub attempts: Option<u64>,

    /// Number of worker threads (default: number of CPU cores)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Attempts each worker makes per round while searching for a pattern
    #[arg(long, default_value_t = DEFAULT_ROUND_SIZE)]
    pub round_size: u64,

    /// Fast mode (accepted for compatibility, derivation cost is unchanged)
    #[arg(long, default_value = "false")]
    pub fast: bool,

    /// HD derivation path
    #[arg(long, default_value = DEFAULT_PATH)]
    pub path: String,

    /// Print results as JSON
    #[arg(long, default_value = "false")]
    pub json: bool,

    /// Progress report interval in seconds
    #[arg(short = 'r', long, default_value = "5")]
    pub report_interval: u64,

    /// Give up after this many seconds and return what was found
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Run a single JSON work-unit request from a file ("-" for stdin)
    #[arg(long, conflicts_with = "verify")]
    pub request: Option<PathBuf>,

    /// Re-derive the account of a mnemonic phrase and exit
    #[arg(long)]
    pub verify: Option<String>,
}

impl Config {
    /// Returns the number of workers, defaulting to CPU count
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get)
    }

    /// Returns the validated match criteria.
    pub fn criteria(&self) -> Result<MatchCriteria, ConfigError> {
        Ok(MatchCriteria::new(
            self.prefix.as_deref(),
            self.suffix.as_deref(),
        )?)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.criteria()?;

        if self.count == 0 {
            return Err(ConfigError::Invalid("--count must be at least 1".into()));
        }
        if self.worker_count() == 0 {
            return Err(ConfigError::Invalid("--workers must be at least 1".into()));
        }
        if self.attempts == Some(0) {
            return Err(ConfigError::Invalid("--attempts must be at least 1".into()));
        }
        if self.round_size == 0 {
            return Err(ConfigError::Invalid("--round-size must be at least 1".into()));
        }
        if self.report_interval == 0 {
            return Err(ConfigError::Invalid(
                "--report-interval must be at least 1 second".into(),
            ));
        }

        Ok(())
    }

    /// Builds the generation job described by this configuration.
    ///
    /// Without a pattern every attempt is a wallet, so `--count` attempts are
    /// made in a single round. With a pattern the pool searches in rounds until
    /// `--count` matches are found or the budget runs out.
    pub fn job(&self) -> Result<Job, ConfigError> {
        self.validate()?;
        let criteria = self.criteria()?;

        let (attempts, target) = if criteria.is_any() && self.attempts.is_none() {
            (Some(self.count as u64), None)
        } else {
            (self.attempts, Some(self.count))
        };

        let job = Job {
            criteria,
            workers: self.worker_count(),
            attempts,
            target,
            round_size: self.round_size,
            fast_mode: self.fast,
        };
        job.validate()?;
        Ok(job)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Request(#[from] crate::Error),
}
