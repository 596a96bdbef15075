//! # rama_vanity
//!
//! HD-wallet vanity address generator for the Ramestta chain.
//!
//! Every candidate is a fresh 12-word BIP-39 mnemonic whose first BIP-44
//! account is checked against an optional prefix and suffix. Only matches are
//! kept, together with the mnemonic that recreates them.
//!
//! ## Architecture
//!
//! - `crypto`: Mnemonic generation, HD derivation, and address encoding
//! - `matcher`: Prefix/suffix criteria and their cost model
//! - `worker`: Candidate generator and the worker pool that distributes jobs
//! - `config`: Command line configuration

pub mod config;
pub mod crypto;
mod error;
pub mod matcher;
pub mod worker;

pub use config::Config;
pub use crypto::{Account, Address, Bip44Deriver, KeyDeriver};
pub use error::{Error, Result};
pub use matcher::MatchCriteria;
pub use worker::{Job, JobOutcome, ResultRecord, WorkReport, WorkUnit, WorkerPool};
