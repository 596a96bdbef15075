//! secp256k1 keypair handling.

use std::fmt;

use secp256k1::{All, PublicKey, Secp256k1, SecretKey};
use tiny_keccak::{Hasher, Keccak};
use zeroize::Zeroizing;

use super::Address;
use crate::{Error, Result};

/// An EVM keypair (private key + derived address).
#[derive(Clone)]
pub struct Keypair {
    /// The private key bytes (32 bytes), wiped on drop
    secret_key: Zeroizing<[u8; 32]>,
    /// The derived address
    address: Address,
}

impl Keypair {
    /// Builds a keypair from an existing secret key.
    ///
    /// Returns [`Error::InvalidPrivateKey`] if the bytes are zero or not below
    /// the curve order.
    pub fn from_secret_key(secp: &Secp256k1<All>, secret_bytes: [u8; 32]) -> Result<Self> {
        let secret_key =
            SecretKey::from_slice(&secret_bytes).map_err(|_| Error::InvalidPrivateKey)?;
        let public_key = PublicKey::from_secret_key(secp, &secret_key);

        Ok(Self {
            secret_key: Zeroizing::new(secret_bytes),
            address: Self::derive_address(&public_key),
        })
    }

    /// Derives an address from a secp256k1 public key.
    ///
    /// Process:
    /// 1. Serialize the public key in uncompressed form (65 bytes)
    /// 2. Remove the first byte (0x04 prefix)
    /// 3. Hash the remaining 64 bytes with Keccak-256
    /// 4. Take the last 20 bytes of the hash
    #[inline]
    fn derive_address(public_key: &PublicKey) -> Address {
        let public_key_bytes = public_key.serialize_uncompressed();

        let mut hasher = Keccak::v256();
        hasher.update(&public_key_bytes[1..]);

        let mut hash = [0u8; 32];
        hasher.finalize(&mut hash);

        let mut address_bytes = [0u8; 20];
        address_bytes.copy_from_slice(&hash[12..]);

        Address::from_bytes(address_bytes)
    }

    /// Returns the private key as a 0x-prefixed hex string.
    pub fn private_key_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.secret_key[..]))
    }

    /// Returns a reference to the derived address.
    #[inline]
    pub fn address(&self) -> &Address {
        &self.address
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("address", &self.address)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_one() -> [u8; 32] {
        let mut bytes = [0u8; 32];
        bytes[31] = 1;
        bytes
    }

    #[test]
    fn test_deterministic_address() {
        let secp = Secp256k1::new();
        let keypair = Keypair::from_secret_key(&secp, key_one()).unwrap();

        // Address for private key = 1 is well-known
        assert_eq!(
            keypair.address().to_hex(),
            "7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn test_private_key_hex_format() {
        let secp = Secp256k1::new();
        let keypair = Keypair::from_secret_key(&secp, key_one()).unwrap();
        let hex = keypair.private_key_hex();

        assert_eq!(hex.len(), 66);
        assert!(hex.starts_with("0x"));
        assert!(hex.ends_with("01"));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let secp = Secp256k1::new();
        let keypair = Keypair::from_secret_key(&secp, key_one()).unwrap();
        let debug = format!("{:?}", keypair);

        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains(&keypair.private_key_hex()[2..]));
        assert!(!debug.contains("[0, 0"));
    }

    #[test]
    fn test_zero_key_rejected() {
        let secp = Secp256k1::new();
        let err = Keypair::from_secret_key(&secp, [0u8; 32]).unwrap_err();
        assert!(matches!(err, Error::InvalidPrivateKey));
    }
}
