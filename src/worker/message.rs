//! Messages exchanged between the distributor and its workers.
//!
//! These are also the JSON shapes accepted and produced by the CLI's
//! `--request` mode.

use serde::{Deserialize, Serialize};

use crate::crypto::{parse_mnemonic, Account, KeyDeriver};
use crate::matcher::MatchCriteria;
use crate::{Error, Result};

/// A batch of attempts assigned to one worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkUnit {
    /// Number of candidates to attempt (not a number of matches).
    pub batch_size: u64,
    /// Index of the worker this unit is assigned to.
    pub worker_id: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    /// Reserved for a cheaper derivation strategy; currently has no effect.
    #[serde(default)]
    pub fast_mode: bool,
}

impl WorkUnit {
    /// Builds a unit from already validated criteria.
    pub fn new(worker_id: usize, batch_size: u64, criteria: &MatchCriteria, fast_mode: bool) -> Self {
        Self {
            batch_size,
            worker_id,
            prefix: criteria.prefix().map(str::to_owned),
            suffix: criteria.suffix().map(str::to_owned),
            fast_mode,
        }
    }

    /// Checks the unit and returns its parsed criteria.
    pub fn validate(&self) -> Result<MatchCriteria> {
        if self.batch_size == 0 {
            return Err(Error::invalid_request("batch size must be positive"));
        }
        MatchCriteria::new(self.prefix.as_deref(), self.suffix.as_deref())
    }
}

/// A retained candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    /// EIP-55 checksummed address with `0x` marker.
    pub address: String,
    /// 0x-prefixed hex private key.
    pub private_key: String,
    /// Space separated BIP-39 phrase the account was derived from.
    pub mnemonic: String,
}

impl ResultRecord {
    pub(crate) fn new(account: &Account, mnemonic: String) -> Self {
        Self {
            address: account.address().to_checksum(),
            private_key: account.private_key_hex(),
            mnemonic,
        }
    }

    /// Re-derives the account from the recorded mnemonic and checks that it
    /// reproduces the recorded address and private key.
    pub fn verify<D: KeyDeriver>(&self, deriver: &D) -> Result<bool> {
        let account = deriver.derive(&parse_mnemonic(&self.mnemonic)?)?;
        Ok(account.address().to_checksum() == self.address
            && account.private_key_hex() == self.private_key)
    }
}

/// The outcome of one work unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkReport {
    pub worker_id: usize,
    /// Matches in generation order.
    pub results: Vec<ResultRecord>,
    /// Attempts actually made.
    #[serde(default)]
    pub attempts: u64,
    /// Attempts skipped because derivation failed.
    #[serde(default)]
    pub derivation_faults: u64,
    /// Set when the worker stopped early on an internal fault.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fault: Option<String>,
}

impl WorkReport {
    /// An empty report for `worker_id`.
    pub fn new(worker_id: usize) -> Self {
        Self {
            worker_id,
            ..Self::default()
        }
    }

    /// A report for a worker that produced nothing before failing.
    pub fn failed(worker_id: usize, fault: impl Into<String>) -> Self {
        Self {
            worker_id,
            fault: Some(fault.into()),
            ..Self::default()
        }
    }

    /// Returns true if the worker hit an internal fault.
    pub fn is_faulted(&self) -> bool {
        self.fault.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_json_shape() {
        let json = r#"{"batchSize":10,"workerId":2,"prefix":"dead","fastMode":true}"#;
        let unit: WorkUnit = serde_json::from_str(json).unwrap();

        assert_eq!(unit.batch_size, 10);
        assert_eq!(unit.worker_id, 2);
        assert_eq!(unit.prefix.as_deref(), Some("dead"));
        assert_eq!(unit.suffix, None);
        assert!(unit.fast_mode);
    }

    #[test]
    fn test_request_defaults() {
        let unit: WorkUnit = serde_json::from_str(r#"{"batchSize":1,"workerId":0}"#).unwrap();
        assert!(!unit.fast_mode);
        assert!(unit.validate().unwrap().is_any());
    }

    #[test]
    fn test_zero_batch_rejected() {
        let unit = WorkUnit::new(0, 0, &MatchCriteria::any(), false);
        assert!(matches!(unit.validate(), Err(Error::InvalidRequest(_))));
    }

    #[test]
    fn test_bad_pattern_rejected() {
        let mut unit = WorkUnit::new(0, 5, &MatchCriteria::any(), false);
        unit.suffix = Some("beeg".into());
        assert!(matches!(unit.validate(), Err(Error::InvalidRequest(_))));
    }

    #[test]
    fn test_response_json_shape() {
        let mut report = WorkReport::new(3);
        report.results.push(ResultRecord {
            address: "0x9858EfFD232B4033E47d90003D41EC34EcaEda94".into(),
            private_key: "0x1ab42cc412b618bdea3a599e3c9bae199ebf030895b039e9db1e30dafb12b727"
                .into(),
            mnemonic: "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about".into(),
        });

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["workerId"], 3);
        assert_eq!(
            value["results"][0]["privateKey"],
            "0x1ab42cc412b618bdea3a599e3c9bae199ebf030895b039e9db1e30dafb12b727"
        );
        assert!(value.get("fault").is_none());
    }

    #[test]
    fn test_verify_detects_tampering() {
        let deriver = crate::crypto::Bip44Deriver::new();
        let account = deriver
            .derive_phrase("abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about")
            .unwrap();
        let mut record = ResultRecord::new(
            &account,
            "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about".into(),
        );
        assert!(record.verify(&deriver).unwrap());

        record.address = "0x0000000000000000000000000000000000000000".into();
        assert!(!record.verify(&deriver).unwrap());
    }
}
