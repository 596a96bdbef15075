//! Ramestta HD Vanity Wallet Generator CLI
//!
//! Usage:
//!   rama_vanity -n 10                 # Ten fresh wallets, no pattern
//!   rama_vanity -p dead               # One wallet whose address starts with "dead"
//!   rama_vanity -p dead -s beef -n 2  # Two wallets matching both ends
//!   rama_vanity --request unit.json   # Run one work unit and print its report
//!   rama_vanity --verify "word1 ... word12"

use std::io::Read;
use std::path::Path;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use rama_vanity::worker::{CandidateGenerator, Progress};
use rama_vanity::{Bip44Deriver, Config, JobOutcome, ResultRecord, WorkUnit, WorkerPool};

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() {
    let config = Config::parse();
    init_logging(&config.log_level);

    if let Err(e) = run(&config) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .init();
}

fn run(config: &Config) -> CliResult {
    let deriver = Bip44Deriver::with_path(&config.path)?;

    if let Some(phrase) = &config.verify {
        return verify(&deriver, phrase);
    }
    if let Some(path) = &config.request {
        return serve_request(&deriver, path);
    }

    generate(config, deriver)
}

fn generate(config: &Config, deriver: Bip44Deriver) -> CliResult {
    let job = config.job()?;
    let criteria = job.criteria.clone();

    if !config.json {
        println!("Ramestta HD Vanity Wallet Generator");
        println!("===================================");
        println!("Criteria:   {}", criteria);
        println!("Difficulty: {}", criteria.difficulty_description());
        println!(
            "Expected:   ~{} attempts per match",
            format_number(criteria.expected_attempts())
        );
        println!("Workers:    {}", job.workers);
        println!("Target:     {} wallet(s)", job.requested_yield());
        if let Some(budget) = job.attempts {
            println!("Budget:     {} attempts", format_number(budget));
        }
        println!();
        println!("Searching... (Press Ctrl+C to stop)\n");
    }

    let pool = WorkerPool::new(job, deriver)?
        .with_report_interval(Duration::from_secs(config.report_interval));

    let stop_flag = pool.stop_flag_clone();
    ctrlc_handler(stop_flag.clone())?;
    if let Some(secs) = config.timeout {
        timeout_watchdog(stop_flag, Duration::from_secs(secs));
    }

    let json = config.json;
    let outcome = pool.run_with_progress(|progress| {
        if !json {
            print_progress(progress);
        }
    });

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome.results)?);
        return Ok(());
    }

    for (i, result) in outcome.results.iter().enumerate() {
        print_result(result, i + 1);
    }
    print_summary(&outcome);

    Ok(())
}

fn serve_request(deriver: &Bip44Deriver, path: &Path) -> CliResult {
    let input = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)?
    };

    let unit: WorkUnit = serde_json::from_str(&input)?;

    // Ctrl-C ends the batch early; the partial report is still printed.
    let stop_flag = Arc::new(AtomicBool::new(false));
    ctrlc_handler(stop_flag.clone())?;

    let report = CandidateGenerator::new(unit, deriver.clone())?
        .with_stop_flag(stop_flag)
        .run();
    println!("{}", serde_json::to_string(&report)?);

    Ok(())
}

fn verify(deriver: &Bip44Deriver, phrase: &str) -> CliResult {
    let account = deriver.derive_phrase(phrase)?;

    println!("Path:        {}", deriver.path());
    println!("Address:     {}", account.address());
    println!("Private Key: {}", account.private_key_hex());

    Ok(())
}

fn print_result(result: &ResultRecord, index: usize) {
    println!("=== Wallet #{} ===", index);
    println!("Address:     {}", result.address);
    println!("Private Key: {}", result.private_key);
    println!("Mnemonic:    {}", result.mnemonic);
    println!();
}

fn print_progress(progress: &Progress) {
    println!(
        "[{:>4}s] {} attempts ({}/s), {} match(es), {:.1}% chance of a match so far",
        progress.elapsed.as_secs(),
        format_number(progress.attempts),
        format_number(progress.attempts_per_second() as u64),
        progress.matches,
        progress.probability_found * 100.0
    );
}

fn print_summary(outcome: &JobOutcome) {
    let rate = if outcome.elapsed.as_secs_f64() > 0.0 {
        outcome.attempts as f64 / outcome.elapsed.as_secs_f64()
    } else {
        0.0
    };

    println!("--- Final Statistics ---");
    println!("Wallets returned:     {}", outcome.results.len());
    println!("Total attempts:       {}", format_number(outcome.attempts));
    println!("Rounds dispatched:    {}", outcome.rounds);
    println!("Time elapsed:         {:.2}s", outcome.elapsed.as_secs_f64());
    println!("Average speed:        {}/s", format_number(rate as u64));
    if outcome.derivation_faults > 0 {
        println!("Skipped (faults):     {}", outcome.derivation_faults);
    }
    for (worker, fault) in &outcome.worker_faults {
        println!("Worker {} failed:     {}", worker, fault);
    }
    if outcome.cancelled {
        println!("Stopped before completion; results are partial.");
    }
}

fn format_number(n: u64) -> String {
    if n >= 1_000_000_000 {
        format!("{:.2}B", n as f64 / 1_000_000_000.0)
    } else if n >= 1_000_000 {
        format!("{:.2}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.2}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

fn ctrlc_handler(stop_flag: Arc<AtomicBool>) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        stop_flag.store(true, Ordering::Relaxed);
    })
}

fn timeout_watchdog(stop_flag: Arc<AtomicBool>, timeout: Duration) {
    let spawned = thread::Builder::new()
        .name("vanity-timeout".into())
        .spawn(move || {
            thread::sleep(timeout);
            stop_flag.store(true, Ordering::Relaxed);
        });

    if let Err(e) = spawned {
        tracing::warn!(error = %e, "could not start timeout watchdog");
    }
}
