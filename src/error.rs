//! Error types surfaced by the search and recovery operations.

/// Errors raised while decoding inputs or recovering a private key.
///
/// Workers themselves never fail; everything here is detected either
/// before the search starts or during offset recovery.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Prefix contains non-base64 characters or is too long.
    #[error("invalid prefix: {0}")]
    InvalidPrefix(String),

    /// Public key is not 44 base64 characters, decodes to u = -1, or
    /// does not correspond to a curve point.
    #[error("invalid public key")]
    InvalidPublicKey,

    /// Private key is not a base64 encoding of 32 bytes.
    #[error("invalid private key")]
    InvalidPrivateKey,

    /// Neither s + 8n nor s - 8n reproduces the expected public key.
    #[error("offset does not match private key")]
    OffsetMismatch,

    /// A search parameter is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
