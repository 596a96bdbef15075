//! BIP-39 mnemonic generation and BIP-44 account derivation.

use std::fmt;

use bip32::{DerivationPath, XPrv};
use bip39::{Language, Mnemonic};
use rand::{CryptoRng, RngCore};
use secp256k1::{All, Secp256k1};
use zeroize::Zeroizing;

use super::{Address, Keypair};
use crate::{Error, Result};

/// Number of words in every generated mnemonic.
pub const MNEMONIC_WORDS: usize = 12;

/// Entropy length backing a 12-word mnemonic.
pub const ENTROPY_BYTES: usize = 16;

/// First account of the standard EVM path (MetaMask, ethers).
pub const DEFAULT_PATH: &str = "m/44'/60'/0'/0/0";

/// Generates a fresh English mnemonic from the given entropy source.
pub fn random_mnemonic<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Mnemonic> {
    let mut entropy = Zeroizing::new([0u8; ENTROPY_BYTES]);
    rng.fill_bytes(&mut entropy[..]);
    Ok(Mnemonic::from_entropy_in(Language::English, &entropy[..])?)
}

/// Parses an English mnemonic phrase (whitespace and case are normalized).
pub fn parse_mnemonic(phrase: &str) -> Result<Mnemonic> {
    let normalized = phrase
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ");
    Ok(Mnemonic::parse_in_normalized(Language::English, &normalized)?)
}

/// An account derived from a mnemonic.
///
/// There is no public constructor: accounts only come out of a [`KeyDeriver`].
#[derive(Clone)]
pub struct Account {
    keypair: Keypair,
}

impl Account {
    /// Returns the account address.
    #[inline]
    pub fn address(&self) -> &Address {
        self.keypair.address()
    }

    /// Returns the private key as a 0x-prefixed hex string.
    pub fn private_key_hex(&self) -> String {
        self.keypair.private_key_hex()
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("address", self.address())
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Derives an [`Account`] from a mnemonic.
///
/// Each worker receives its own instance through [`KeyDeriver::for_worker`], so
/// implementations never need to synchronize.
pub trait KeyDeriver: Clone + Send + 'static {
    /// Derives the account for `mnemonic`.
    fn derive(&self, mnemonic: &Mnemonic) -> Result<Account>;

    /// Returns the instance handed to worker `worker_id`.
    fn for_worker(&self, _worker_id: usize) -> Self {
        self.clone()
    }
}

/// Standard BIP-32/44 derivation with an empty BIP-39 passphrase.
#[derive(Debug, Clone)]
pub struct Bip44Deriver {
    path: DerivationPath,
    secp: Secp256k1<All>,
}

impl Bip44Deriver {
    /// Deriver for `m/44'/60'/0'/0/0`.
    pub fn new() -> Self {
        Self {
            path: DEFAULT_PATH
                .parse()
                .unwrap_or_else(|_| unreachable!("default path is valid")),
            secp: Secp256k1::new(),
        }
    }

    /// Deriver for a custom derivation path.
    pub fn with_path(path: &str) -> Result<Self> {
        let path = path
            .parse()
            .map_err(|e| Error::Derivation(format!("invalid derivation path {path}: {e}")))?;

        Ok(Self {
            path,
            secp: Secp256k1::new(),
        })
    }

    /// Returns the derivation path.
    pub fn path(&self) -> &DerivationPath {
        &self.path
    }

    /// Parses `phrase` and derives its account.
    pub fn derive_phrase(&self, phrase: &str) -> Result<Account> {
        self.derive(&parse_mnemonic(phrase)?)
    }
}

impl Default for Bip44Deriver {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyDeriver for Bip44Deriver {
    fn derive(&self, mnemonic: &Mnemonic) -> Result<Account> {
        let seed = Zeroizing::new(mnemonic.to_seed(""));

        let xprv = XPrv::derive_from_path(&seed[..], &self.path)
            .map_err(|e| Error::Derivation(format!("key derivation failed: {e}")))?;
        let secret = Zeroizing::new(xprv.to_bytes());

        Ok(Account {
            keypair: Keypair::from_secret_key(&self.secp, *secret)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_known_vector() {
        let account = Bip44Deriver::new().derive_phrase(TEST_MNEMONIC).unwrap();

        assert_eq!(
            account.address().to_checksum(),
            "0x9858EfFD232B4033E47d90003D41EC34EcaEda94"
        );
        assert_eq!(
            account.private_key_hex(),
            "0x1ab42cc412b618bdea3a599e3c9bae199ebf030895b039e9db1e30dafb12b727"
        );
    }

    #[test]
    fn test_account_debug_hides_private_key() {
        let account = Bip44Deriver::new().derive_phrase(TEST_MNEMONIC).unwrap();
        let debug = format!("{:?}", account);

        assert!(debug.contains("0x9858EfFD232B4033E47d90003D41EC34EcaEda94"));
        assert!(!debug.contains("1ab42cc412b618bd"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_random_mnemonic_has_twelve_words() {
        let mnemonic = random_mnemonic(&mut rand::thread_rng()).unwrap();
        assert_eq!(mnemonic.word_count(), MNEMONIC_WORDS);
    }

    #[test]
    fn test_rederivation_is_deterministic() {
        let deriver = Bip44Deriver::new();
        let mnemonic = random_mnemonic(&mut rand::thread_rng()).unwrap();

        let first = deriver.derive(&mnemonic).unwrap();
        let again = deriver.derive_phrase(&mnemonic.to_string()).unwrap();

        assert_eq!(first.address(), again.address());
        assert_eq!(first.private_key_hex(), again.private_key_hex());
    }

    #[test]
    fn test_parse_normalizes_case_and_spacing() {
        let messy = TEST_MNEMONIC.to_uppercase().replace(' ', "   ");
        let account = Bip44Deriver::new().derive_phrase(&messy).unwrap();
        assert_eq!(
            account.address().to_hex(),
            "9858effd232b4033e47d90003d41ec34ecaeda94"
        );
    }

    #[test]
    fn test_custom_path_changes_address() {
        let standard = Bip44Deriver::new().derive_phrase(TEST_MNEMONIC).unwrap();
        let second = Bip44Deriver::with_path("m/44'/60'/0'/0/1")
            .unwrap()
            .derive_phrase(TEST_MNEMONIC)
            .unwrap();

        assert_ne!(standard.address(), second.address());
    }

    #[test]
    fn test_invalid_path_rejected() {
        assert!(matches!(
            Bip44Deriver::with_path("m/not/a/path"),
            Err(Error::Derivation(_))
        ));
    }

    #[test]
    fn test_invalid_phrase_rejected() {
        let err = Bip44Deriver::new()
            .derive_phrase("abandon abandon abandon")
            .unwrap_err();
        assert!(matches!(err, Error::Mnemonic(_)));
    }
}
