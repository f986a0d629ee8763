//! Key handling for the Curve25519 vanity search.
//!
//! This module provides:
//! - Clamped private key generation (RFC 7748)
//! - Base64 key parsing and rendering
//! - Recovery of the vanity private key from a search offset

mod keypair;
mod recover;

pub use keypair::{clamp, decode_public, Keypair};
pub use recover::add_offset;
