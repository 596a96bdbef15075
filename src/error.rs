//! Error types for wallet generation.

/// Errors that can occur while generating or deriving vanity wallets.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request was rejected before any work was dispatched.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The mnemonic could not be built or parsed.
    #[error("mnemonic error: {0}")]
    Mnemonic(#[from] bip39::Error),

    /// HD key derivation failed.
    #[error("key derivation error: {0}")]
    Derivation(String),

    /// The derived secret is not a valid secp256k1 scalar.
    #[error("invalid private key")]
    InvalidPrivateKey,

    /// The string is not a 20-byte hex address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

impl Error {
    pub(crate) fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }
}

/// A convenient Result type alias for crate operations.
pub type Result<T> = std::result::Result<T, Error>;
