//! Prefix matching for base64-encoded public keys.
//!
//! A WireGuard public key renders as 44 base64 characters; each prefix
//! character constrains six bits of the underlying u-coordinate, so
//! candidates are tested against raw key bytes without encoding them.

mod prefix;

pub use prefix::Base64Prefix;
