//! Point arithmetic on the twisted Edwards form of Curve25519,
//! -x^2 + y^2 = 1 + d x^2 y^2.
//!
//! Points are kept in extended projective coordinates (X:Y:Z:T) with
//! x = X/Z, y = Y/Z, xy = T/Z. The search loop additionally uses affine
//! points (x, y, xy), which feed the inversion-free neighbor formulas.

use super::constants;
use super::field::{vector_divide, FieldElement};

/// A point in extended projective coordinates.
#[derive(Copy, Clone, Debug)]
pub struct EdwardsPoint {
    pub(crate) x: FieldElement,
    pub(crate) y: FieldElement,
    pub(crate) z: FieldElement,
    pub(crate) t: FieldElement,
}

/// An affine point carrying the product of its coordinates.
#[derive(Copy, Clone, Debug)]
pub struct AffinePoint {
    pub(crate) x: FieldElement,
    pub(crate) y: FieldElement,
    /// x * y, the affine mirror of the extended T coordinate.
    pub(crate) t: FieldElement,
}

/// A point in compressed Edwards y format: the y encoding with the sign
/// of x in the top bit.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CompressedEdwardsY(pub [u8; 32]);

impl EdwardsPoint {
    pub const IDENTITY: EdwardsPoint = EdwardsPoint {
        x: FieldElement::ZERO,
        y: FieldElement::ONE,
        z: FieldElement::ONE,
        t: FieldElement::ZERO,
    };

    /// Add two points with the strongly unified extended-coordinate
    /// formula; valid for doubling as well.
    pub fn add(&self, other: &EdwardsPoint) -> EdwardsPoint {
        let a = &(&self.y - &self.x) * &(&other.y - &other.x);
        let b = &(&self.y + &self.x) * &(&other.y + &other.x);
        let c = &(&self.t * &other.t) * &constants::EDWARDS_D2;
        let zz = &self.z * &other.z;
        let d = &zz + &zz;
        let e = &b - &a;
        let f = &d - &c;
        let g = &d + &c;
        let h = &b + &a;

        EdwardsPoint {
            x: &e * &f,
            y: &g * &h,
            z: &f * &g,
            t: &e * &h,
        }
    }

    pub fn double(&self) -> EdwardsPoint {
        self.add(self)
    }

    pub fn neg(&self) -> EdwardsPoint {
        EdwardsPoint {
            x: -&self.x,
            y: self.y,
            z: self.z,
            t: -&self.t,
        }
    }

    /// Multiply by a little-endian scalar of arbitrary width. Plain
    /// double-and-add; used off the hot path only (setup and recovery).
    pub fn scalar_mul(&self, scalar_le: &[u8]) -> EdwardsPoint {
        let mut result = EdwardsPoint::IDENTITY;
        let mut doubled = *self;

        for byte in scalar_le {
            for bit in 0..8 {
                if (byte >> bit) & 1 == 1 {
                    result = result.add(&doubled);
                }
                doubled = doubled.double();
            }
        }
        result
    }

    /// Multiply the basepoint by a 256-bit scalar.
    pub fn mul_base(scalar_le: &[u8; 32]) -> EdwardsPoint {
        constants::ED25519_BASEPOINT.scalar_mul(scalar_le)
    }

    /// Multiply by the cofactor 8.
    pub fn mul_by_cofactor(&self) -> EdwardsPoint {
        self.double().double().double()
    }

    /// Normalize to affine coordinates. One inversion.
    pub fn to_affine(&self) -> AffinePoint {
        self.to_affine_with_zinv(&self.z.invert())
    }

    /// Normalize to affine given a precomputed 1/Z. Three multiplications.
    pub fn to_affine_with_zinv(&self, zinv: &FieldElement) -> AffinePoint {
        AffinePoint {
            x: &self.x * zinv,
            y: &self.y * zinv,
            t: &self.t * zinv,
        }
    }

    /// The 32-byte Montgomery u-coordinate, u = (1+y)/(1-y) = (Z+Y)/(Z-Y).
    ///
    /// The identity maps to zero, matching the convention that 1/0 = 0.
    pub fn montgomery_bytes(&self) -> [u8; 32] {
        let u = &(&self.z + &self.y) * &(&self.z - &self.y).invert();
        u.to_bytes()
    }

    /// Compress to the Edwards y encoding.
    pub fn compress(&self) -> CompressedEdwardsY {
        let zinv = self.z.invert();
        let x = &self.x * &zinv;
        let y = &self.y * &zinv;

        let mut bytes = y.to_bytes();
        bytes[31] ^= (x.is_negative() as u8) << 7;
        CompressedEdwardsY(bytes)
    }

    /// Decode a point from a 32-byte Montgomery u-coordinate, taking the
    /// x-coordinate with sign bit zero.
    ///
    /// Returns `None` when u = -1 (the excluded denominator) or when the
    /// mapped y is not on the curve.
    pub fn from_montgomery(u_bytes: &[u8; 32]) -> Option<EdwardsPoint> {
        let u = FieldElement::from_bytes(u_bytes);

        // y = (u - 1) / (u + 1)
        let denom = &u + &FieldElement::ONE;
        if denom.is_zero() {
            return None;
        }
        let y = &(&u - &FieldElement::ONE) * &denom.invert();

        CompressedEdwardsY(y.to_bytes()).decompress()
    }
}

impl CompressedEdwardsY {
    /// Recover the full point, or `None` if the y-coordinate is not on
    /// the curve.
    pub fn decompress(&self) -> Option<EdwardsPoint> {
        let mut y_bytes = self.0;
        let sign = y_bytes[31] >> 7;
        y_bytes[31] &= 0x7f;

        let y = FieldElement::from_bytes(&y_bytes);
        let yy = y.square();

        // x^2 = (y^2 - 1) / (d y^2 + 1)
        let u = &yy - &FieldElement::ONE;
        let v = &(&yy * &constants::EDWARDS_D) + &FieldElement::ONE;

        let (is_square, mut x) = FieldElement::sqrt_ratio(&u, &v);
        if !is_square {
            return None;
        }
        if x.is_negative() as u8 != sign {
            x = -&x;
        }

        Some(EdwardsPoint {
            x,
            y,
            z: FieldElement::ONE,
            t: &x * &y,
        })
    }
}

/// Normalize a slice of extended points to affine form with a single
/// shared inversion.
pub fn batch_to_affine(points: &[EdwardsPoint]) -> Vec<AffinePoint> {
    let n = points.len();
    let mut zinvs = vec![FieldElement::ONE; n];
    let zs: Vec<FieldElement> = points.iter().map(|p| p.z).collect();
    let mut r = vec![FieldElement::ZERO; n];
    let mut s = vec![FieldElement::ZERO; n];

    vector_divide(&mut zinvs, &zs, &mut r, &mut s);

    points
        .iter()
        .zip(zinvs.iter())
        .map(|(p, zinv)| p.to_affine_with_zinv(zinv))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(n: u64) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&n.to_le_bytes());
        bytes
    }

    #[test]
    fn basepoint_montgomery_u_is_nine() {
        let mut nine = [0u8; 32];
        nine[0] = 9;
        assert_eq!(constants::ED25519_BASEPOINT.montgomery_bytes(), nine);
    }

    #[test]
    fn mul_base_one_is_basepoint() {
        let b = EdwardsPoint::mul_base(&scalar(1));
        assert_eq!(b.compress(), constants::ED25519_BASEPOINT.compress());
    }

    #[test]
    fn scalar_mul_matches_repeated_addition() {
        let b = constants::ED25519_BASEPOINT;
        let mut acc = b;
        for n in 2u64..=20 {
            acc = acc.add(&b);
            assert_eq!(
                EdwardsPoint::mul_base(&scalar(n)).compress(),
                acc.compress(),
                "n = {}",
                n
            );
        }
    }

    #[test]
    fn cofactor_mul_matches_scalar_eight() {
        let q = constants::ED25519_BASEPOINT.mul_by_cofactor();
        assert_eq!(q.compress(), EdwardsPoint::mul_base(&scalar(8)).compress());
    }

    #[test]
    fn compress_decompress_roundtrip() {
        for n in 1u64..=8 {
            let p = EdwardsPoint::mul_base(&scalar(n));
            let q = p.compress().decompress().unwrap();
            assert_eq!(p.compress(), q.compress());
            assert_eq!(p.montgomery_bytes(), q.montgomery_bytes());
        }
    }

    #[test]
    fn negation_preserves_montgomery_u() {
        for n in 1u64..=8 {
            let p = EdwardsPoint::mul_base(&scalar(n));
            assert_eq!(p.montgomery_bytes(), p.neg().montgomery_bytes());
        }
    }

    #[test]
    fn add_neg_is_identity() {
        let p = EdwardsPoint::mul_base(&scalar(77));
        let sum = p.add(&p.neg());
        assert_eq!(sum.compress(), EdwardsPoint::IDENTITY.compress());
    }

    #[test]
    fn from_montgomery_roundtrips_real_public_keys() {
        use base64::engine::general_purpose::STANDARD;
        use base64::Engine as _;

        // WireGuard public keys generated with the reference tooling.
        for pk in [
            "QiyOemIn17yhNQs+K7cnn3iXuHu2hUt4PGDoAxGuMHk=",
            "vQnB//PF0URzwwsH0b1ff7a0P3jLKbrOCdLiTkWkvQA=",
            "3nN+Tj4J/e99YWD6TFMvhfMNJCrORoSf8ommtXeXvBs=",
            "Fo8iOSvqtfDjtBALpwGALNiwaZNgMrQYXIEDB2oU6lQ=",
            "YR3nSufwy4r5FuCE7GujLSLssyVJ6iKy2utbUCQelh4=",
        ] {
            let bytes: [u8; 32] = STANDARD.decode(pk).unwrap().try_into().unwrap();
            let point = EdwardsPoint::from_montgomery(&bytes).unwrap();
            assert_eq!(STANDARD.encode(point.montgomery_bytes()), pk);
        }
    }

    #[test]
    fn from_montgomery_rejects_minus_one() {
        // u = -1 = p - 1
        let minus_one = (-&FieldElement::ONE).to_bytes();
        assert!(EdwardsPoint::from_montgomery(&minus_one).is_none());
    }

    #[test]
    fn batch_to_affine_matches_single() {
        let points: Vec<EdwardsPoint> =
            (1u64..=9).map(|n| EdwardsPoint::mul_base(&scalar(n))).collect();
        let affine = batch_to_affine(&points);
        for (p, a) in points.iter().zip(affine.iter()) {
            let single = p.to_affine();
            assert_eq!(a.x, single.x);
            assert_eq!(a.y, single.y);
            assert_eq!(a.t, single.t);
        }
    }
}
