//! EVM address representation and utilities.

use std::fmt;
use std::str::FromStr;

use tiny_keccak::{Hasher, Keccak};

use crate::Error;

/// An EVM address (20 bytes), as used on Ramestta.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; 20]);

impl Address {
    /// Creates an address from raw bytes.
    #[inline]
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Returns the address as a lowercase hex string (without 0x prefix).
    #[inline]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Returns the lowercase address with 0x prefix.
    pub fn to_hex_prefixed(&self) -> String {
        format!("0x{}", self.to_hex())
    }

    /// Returns the address with checksum encoding (EIP-55).
    pub fn to_checksum(&self) -> String {
        let hex_addr = self.to_hex();
        let mut hasher = Keccak::v256();
        hasher.update(hex_addr.as_bytes());
        let mut hash = [0u8; 32];
        hasher.finalize(&mut hash);

        let mut checksum = String::with_capacity(42);
        checksum.push_str("0x");

        for (i, c) in hex_addr.chars().enumerate() {
            let nibble = if i % 2 == 0 {
                hash[i / 2] >> 4
            } else {
                hash[i / 2] & 0x0f
            };

            if c.is_ascii_alphabetic() && nibble >= 8 {
                checksum.push(c.to_ascii_uppercase());
            } else {
                checksum.push(c);
            }
        }

        checksum
    }
}

impl FromStr for Address {
    type Err = Error;

    /// Parses a 40-digit hex address, with or without the `0x` marker, in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);

        let bytes: [u8; 20] = hex::decode(digits)
            .map_err(|e| Error::InvalidAddress(format!("{s}: {e}")))?
            .try_into()
            .map_err(|_| Error::InvalidAddress(format!("{s}: expected 20 bytes")))?;

        Ok(Self(bytes))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_checksum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_address() {
        // EIP-55 test vectors
        for expected in [
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
            "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
        ] {
            let addr: Address = expected.parse().unwrap();
            assert_eq!(addr.to_checksum(), expected);
        }
    }

    #[test]
    fn test_hex_output() {
        let addr = Address::from_bytes([0u8; 20]);
        assert_eq!(addr.to_hex(), "0000000000000000000000000000000000000000");
        assert_eq!(
            addr.to_hex_prefixed(),
            "0x0000000000000000000000000000000000000000"
        );
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        let lower: Address = "0xdeadbeef00000000000000000000000000000000".parse().unwrap();
        let upper: Address = "DEADBEEF00000000000000000000000000000000".parse().unwrap();
        assert_eq!(lower, upper);
    }

    #[test]
    fn test_parse_rejects_bad_length() {
        assert!("0xdead".parse::<Address>().is_err());
        assert!("0xzz00000000000000000000000000000000000000".parse::<Address>().is_err());
    }
}
