//! Offset-to-private-key recovery.
//!
//! A search reports how many increment steps separate the vanity public
//! key from the starting one. Because enumeration steps by Q = 8*B, the
//! private-side step is exactly 8 per offset unit, and the vanity private
//! key is s0 + 8n or s0 - 8n.

use num_bigint::BigUint;

use crate::curve::{constants, EdwardsPoint};
use crate::error::Error;

use super::keypair::clamp;

/// Recover the vanity private key from the starting private key and a
/// search offset.
///
/// `target` is the public key the search discovered; pass `None` to have
/// it recomputed from the secret and the offset.
///
/// Both s0 + 8n and s0 - 8n are tried: a search that started from a
/// decoded public key only knows its starting point up to sign, and an
/// enumeration from -P that found offset n corresponds to -n from P.
/// The winning candidate is verified by clamping it and re-deriving the
/// public key, which also rejects the rare seed where adding 8n
/// disturbed the clamped bits.
pub fn add_offset(
    secret: &[u8; 32],
    offset: &BigUint,
    target: Option<&[u8; 32]>,
) -> Result<[u8; 32], Error> {
    let mut s0 = *secret;
    clamp(&mut s0);

    let expected = match target {
        Some(bytes) => *bytes,
        None => derive_target(&s0, offset)?,
    };

    let two_pow_256 = BigUint::from(1u8) << 256;
    let step = (offset * 8u8) % &two_pow_256;
    let s0_int = BigUint::from_bytes_le(&s0);

    let s_plus = (&s0_int + &step) % &two_pow_256;
    let s_minus = (&s0_int + &two_pow_256 - &step) % &two_pow_256;

    for candidate in [s_plus, s_minus] {
        let bytes = scalar_to_bytes(&candidate);

        // Verify the way WireGuard will use the key: clamp, then derive.
        let mut clamped = bytes;
        clamp(&mut clamped);
        if EdwardsPoint::mul_base(&clamped).montgomery_bytes() == expected {
            return Ok(bytes);
        }
    }

    Err(Error::OffsetMismatch)
}

/// Recompute the public key a search starting from this secret would
/// have found at `offset`: derive the starting key, round-trip it
/// through the sign-losing Montgomery decode exactly as a blind search
/// does, and step by offset * Q.
fn derive_target(s0: &[u8; 32], offset: &BigUint) -> Result<[u8; 32], Error> {
    let start_u = EdwardsPoint::mul_base(s0).montgomery_bytes();
    let start = EdwardsPoint::from_montgomery(&start_u).ok_or(Error::InvalidPrivateKey)?;

    let q = constants::ED25519_BASEPOINT.mul_by_cofactor();
    Ok(start
        .add(&q.scalar_mul(&offset.to_bytes_le()))
        .montgomery_bytes())
}

fn scalar_to_bytes(value: &BigUint) -> [u8; 32] {
    let le = value.to_bytes_le();
    let mut bytes = [0u8; 32];
    bytes[..le.len()].copy_from_slice(&le);
    bytes
}
