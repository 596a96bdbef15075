//! Cryptographic operations for HD wallet generation.
//!
//! This module provides:
//! - BIP-39 mnemonic generation from a secure entropy source
//! - BIP-32/44 account derivation
//! - Address derivation using Keccak-256 and EIP-55 checksums

mod address;
mod hd;
mod keypair;

pub use address::Address;
pub use hd::{
    parse_mnemonic, random_mnemonic, Account, Bip44Deriver, KeyDeriver, DEFAULT_PATH,
    ENTROPY_BYTES, MNEMONIC_WORDS,
};
pub use keypair::Keypair;
