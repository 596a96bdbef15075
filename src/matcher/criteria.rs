//! Prefix/suffix match criteria.

use std::fmt;

use crate::{Error, Result};

/// Number of hex digits in an address, without the `0x` marker.
const ADDRESS_HEX_LEN: usize = 40;

/// Case-insensitive vanity constraints on an address.
///
/// The prefix is tested against the address with its `0x` marker stripped, the
/// suffix against the full address. Both absent means every address matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchCriteria {
    prefix: Option<String>,
    suffix: Option<String>,
}

impl MatchCriteria {
    /// Criteria that accept every address.
    pub fn any() -> Self {
        Self::default()
    }

    /// Validates and normalizes the given prefix and suffix.
    ///
    /// Empty strings are treated as absent and a leading `0x` on the prefix is
    /// dropped. Anything that is not a hex digit is rejected.
    pub fn new(prefix: Option<&str>, suffix: Option<&str>) -> Result<Self> {
        let prefix = prefix
            .map(|p| {
                p.strip_prefix("0x")
                    .or_else(|| p.strip_prefix("0X"))
                    .unwrap_or(p)
            })
            .map(|p| normalize("prefix", p))
            .transpose()?
            .flatten();
        let suffix = suffix.map(|s| normalize("suffix", s)).transpose()?.flatten();

        let criteria = Self { prefix, suffix };
        if criteria.constrained_len() > ADDRESS_HEX_LEN {
            return Err(Error::invalid_request(format!(
                "combined prefix + suffix cannot be longer than {ADDRESS_HEX_LEN} characters"
            )));
        }

        Ok(criteria)
    }

    /// Returns the normalized prefix, if any.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Returns the normalized suffix, if any.
    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }

    /// Returns true when no vanity filter is set.
    pub fn is_any(&self) -> bool {
        self.prefix.is_none() && self.suffix.is_none()
    }

    /// Number of constrained hex digits.
    pub fn constrained_len(&self) -> usize {
        let len = |s: &Option<String>| s.as_ref().map_or(0, String::len);
        len(&self.prefix) + len(&self.suffix)
    }

    /// Tests an address string (with or without `0x`, any case).
    #[inline]
    pub fn matches(&self, address: &str) -> bool {
        if self.is_any() {
            return true;
        }

        let address = address.to_ascii_lowercase();
        let body = address.strip_prefix("0x").unwrap_or(&address);

        let prefix_ok = self.prefix.as_deref().map_or(true, |p| body.starts_with(p));
        let suffix_ok = self.suffix.as_deref().map_or(true, |s| address.ends_with(s));

        prefix_ok && suffix_ok
    }

    /// Returns the expected number of attempts to find one match.
    ///
    /// Each constrained hex digit has 16 possible values, so this is 16^k.
    pub fn expected_attempts(&self) -> u64 {
        16u64.saturating_pow(self.constrained_len() as u32)
    }

    /// Probability that at least one of `attempts` candidates matches.
    ///
    /// Computed in log space so long patterns, where 16^-k is below f64
    /// epsilon, still produce a useful estimate.
    pub fn probability_within(&self, attempts: u64) -> f64 {
        if attempts == 0 {
            return 0.0;
        }
        if self.is_any() {
            return 1.0;
        }

        let p = 16f64.powi(-(self.constrained_len() as i32));
        -(attempts as f64 * (-p).ln_1p()).exp_m1()
    }

    /// Returns a human-readable difficulty estimate.
    pub fn difficulty_description(&self) -> String {
        match self.expected_attempts() {
            0..=1_000 => "Very Easy (< 1 second)".into(),
            1_001..=100_000 => "Easy (seconds)".into(),
            100_001..=10_000_000 => "Medium (minutes)".into(),
            10_000_001..=1_000_000_000 => "Hard (hours)".into(),
            _ => "Very Hard (days or more)".into(),
        }
    }
}

impl fmt::Display for MatchCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.prefix, &self.suffix) {
            (None, None) => write!(f, "any"),
            (Some(p), None) => write!(f, "prefix=0x{p}"),
            (None, Some(s)) => write!(f, "suffix={s}"),
            (Some(p), Some(s)) => write!(f, "prefix=0x{p} suffix={s}"),
        }
    }
}

fn normalize(what: &str, value: &str) -> Result<Option<String>> {
    if value.is_empty() {
        return Ok(None);
    }

    if !value.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::invalid_request(format!(
            "{what} must contain only hex characters (0-9, a-f): {value:?}"
        )));
    }

    if value.len() > ADDRESS_HEX_LEN {
        return Err(Error::invalid_request(format!(
            "{what} cannot be longer than {ADDRESS_HEX_LEN} characters"
        )));
    }

    Ok(Some(value.to_ascii_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_match() {
        let criteria = MatchCriteria::new(Some("dead"), None).unwrap();
        assert!(criteria.matches("0xdeadbeef00000000000000000000000000000000"));
        assert!(criteria.matches("0xDEaDbeef00000000000000000000000000000000"));
    }

    #[test]
    fn test_prefix_no_match() {
        let criteria = MatchCriteria::new(Some("dead"), None).unwrap();
        assert!(!criteria.matches("0xbeefdeadbeef0000000000000000000000000000"));
    }

    #[test]
    fn test_prefix_ignores_marker() {
        let criteria = MatchCriteria::new(Some("0xDEAD"), None).unwrap();
        assert_eq!(criteria.prefix(), Some("dead"));
        assert!(criteria.matches("0xdead000000000000000000000000000000000000"));
    }

    #[test]
    fn test_suffix_match() {
        let criteria = MatchCriteria::new(None, Some("BEEF")).unwrap();
        assert!(criteria.matches("0x0000000000000000000000000000000000debeef"));
        assert!(!criteria.matches("0xbeef000000000000000000000000000000000000"));
    }

    #[test]
    fn test_prefix_and_suffix_both_required() {
        let criteria = MatchCriteria::new(Some("dead"), Some("beef")).unwrap();
        assert!(criteria.matches("0xdead00000000000000000000000000000000beef"));
        assert!(!criteria.matches("0xdead000000000000000000000000000000000000"));
        assert!(!criteria.matches("0x000000000000000000000000000000000000beef"));
    }

    #[test]
    fn test_no_criteria_accepts_everything() {
        let criteria = MatchCriteria::new(Some(""), None).unwrap();
        assert!(criteria.is_any());
        assert!(criteria.matches("0x1234567890123456789012345678901234567890"));
    }

    #[test]
    fn test_rejects_non_hex() {
        assert!(matches!(
            MatchCriteria::new(Some("xyz"), None),
            Err(Error::InvalidRequest(_))
        ));
        assert!(matches!(
            MatchCriteria::new(None, Some("0xbeef")),
            Err(Error::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_rejects_too_long() {
        let prefix = "a".repeat(30);
        let suffix = "b".repeat(11);
        assert!(MatchCriteria::new(Some(&prefix), Some(&suffix)).is_err());
        assert!(MatchCriteria::new(Some(&"c".repeat(41)), None).is_err());
    }

    #[test]
    fn test_difficulty() {
        let criteria = MatchCriteria::new(Some("dead"), None).unwrap();
        assert_eq!(criteria.expected_attempts(), 65536); // 16^4

        let both = MatchCriteria::new(Some("dead"), Some("beef")).unwrap();
        assert_eq!(both.expected_attempts(), 65536 * 65536);
        assert_eq!(MatchCriteria::any().expected_attempts(), 1);
    }

    #[test]
    fn test_probability_within() {
        let criteria = MatchCriteria::new(Some("a"), None).unwrap();
        assert_eq!(criteria.probability_within(0), 0.0);
        let p = criteria.probability_within(16);
        assert!(p > 0.6 && p < 0.7, "{p}");
        assert_eq!(MatchCriteria::any().probability_within(1), 1.0);
    }

    #[test]
    fn test_probability_within_long_pattern() {
        let criteria = MatchCriteria::new(Some("deadbeefdeadbe"), None).unwrap();
        assert_eq!(criteria.constrained_len(), 14);

        let p = criteria.probability_within(criteria.expected_attempts());
        assert!((p - 0.632).abs() < 0.001, "{p}");

        let both = MatchCriteria::new(Some("deadbeefdead"), Some("beefdeadbeef")).unwrap();
        let p = both.probability_within(1_000_000);
        assert!(p > 0.0 && p < 1e-15, "{p}");
    }
}
