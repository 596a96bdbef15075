//! Vanity matching for generated addresses.
//!
//! Supports an optional prefix and an optional suffix, both case-insensitive.
//! When both are set an address must satisfy each of them.

mod criteria;

pub use criteria::MatchCriteria;
