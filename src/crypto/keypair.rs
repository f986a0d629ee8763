//! Curve25519 keypair generation.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rand::RngCore;

use crate::curve::EdwardsPoint;
use crate::error::Error;

/// Clamp a private scalar per RFC 7748 section 5: clear the low three
/// bits, clear bit 255, set bit 254.
#[inline]
pub fn clamp(secret: &mut [u8; 32]) {
    secret[0] &= 248;
    secret[31] &= 127;
    secret[31] |= 64;
}

/// A WireGuard keypair: a clamped private scalar and its public Edwards
/// point.
#[derive(Debug, Clone)]
pub struct Keypair {
    secret: [u8; 32],
    public: EdwardsPoint,
}

impl Keypair {
    /// Generate a fresh keypair from the system RNG.
    pub fn generate() -> Self {
        let mut secret = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut secret);
        Self::from_secret_bytes(secret)
    }

    /// Build a keypair from 32 private-key bytes, clamping them first.
    pub fn from_secret_bytes(mut secret: [u8; 32]) -> Self {
        clamp(&mut secret);
        let public = EdwardsPoint::mul_base(&secret);
        Self { secret, public }
    }

    /// Parse a 44-character base64 private key.
    pub fn from_base64(encoded: &str) -> Result<Self, Error> {
        let bytes: [u8; 32] = STANDARD
            .decode(encoded.trim())
            .map_err(|_| Error::InvalidPrivateKey)?
            .try_into()
            .map_err(|_| Error::InvalidPrivateKey)?;
        Ok(Self::from_secret_bytes(bytes))
    }

    /// The clamped private scalar.
    pub fn secret_bytes(&self) -> &[u8; 32] {
        &self.secret
    }

    /// The public key as an Edwards point, the starting point for
    /// enumeration.
    pub fn public_point(&self) -> &EdwardsPoint {
        &self.public
    }

    /// The WireGuard wire encoding of the public key: 32 bytes of
    /// Montgomery u-coordinate.
    pub fn public_bytes(&self) -> [u8; 32] {
        self.public.montgomery_bytes()
    }

    pub fn secret_base64(&self) -> String {
        STANDARD.encode(self.secret)
    }

    pub fn public_base64(&self) -> String {
        STANDARD.encode(self.public_bytes())
    }
}

/// Decode a base64 public key into its Edwards starting point for blind
/// searches.
pub fn decode_public(encoded: &str) -> Result<EdwardsPoint, Error> {
    let bytes: [u8; 32] = STANDARD
        .decode(encoded.trim())
        .map_err(|_| Error::InvalidPublicKey)?
        .try_into()
        .map_err(|_| Error::InvalidPublicKey)?;
    EdwardsPoint::from_montgomery(&bytes).ok_or(Error::InvalidPublicKey)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamping_is_idempotent_and_sets_rfc7748_bits() {
        let mut rng = rand::thread_rng();
        for _ in 0..1000 {
            let mut secret = [0u8; 32];
            rng.fill_bytes(&mut secret);
            clamp(&mut secret);

            assert_eq!(secret[0] & 7, 0);
            assert_eq!(secret[31] & 128, 0);
            assert_eq!(secret[31] & 64, 64);

            let mut again = secret;
            clamp(&mut again);
            assert_eq!(again, secret);
        }
    }

    #[test]
    fn generated_keys_roundtrip_through_base64() {
        let keypair = Keypair::generate();
        let reparsed = Keypair::from_base64(&keypair.secret_base64()).unwrap();
        assert_eq!(reparsed.secret_bytes(), keypair.secret_bytes());
        assert_eq!(reparsed.public_base64(), keypair.public_base64());
    }

    #[test]
    fn public_key_matches_decoded_point() {
        let keypair = Keypair::generate();
        let decoded = decode_public(&keypair.public_base64()).unwrap();
        assert_eq!(decoded.montgomery_bytes(), keypair.public_bytes());
    }

    #[test]
    fn rejects_malformed_keys() {
        assert!(matches!(
            Keypair::from_base64("dG9vIHNob3J0"),
            Err(Error::InvalidPrivateKey)
        ));
        assert!(matches!(
            decode_public("not base64 at all"),
            Err(Error::InvalidPublicKey)
        ));
    }
}
