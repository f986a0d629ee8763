//! Self-contained Curve25519 arithmetic.
//!
//! This module provides:
//! - Field arithmetic over GF(2^255 - 19) with 51-bit limbs
//! - Simultaneous (batched) field division
//! - Extended-coordinate twisted Edwards points and the Montgomery
//!   u-coordinate serialization used by WireGuard keys

pub mod constants;
mod edwards;
mod field;

pub use edwards::{batch_to_affine, AffinePoint, CompressedEdwardsY, EdwardsPoint};
pub use field::{vector_divide, FieldElement};
