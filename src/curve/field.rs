//! Field arithmetic modulo p = 2^255 - 19.
//!
//! Elements are held in radix 2^51 as five `u64` limbs with 128-bit
//! intermediate products. Limbs may grow up to 2^54 between reductions;
//! multiplication weakly reduces its output, subtraction adds a multiple
//! of p before subtracting to avoid underflow.
//!
//! None of this is constant time. The search operates on public data and
//! candidate keys are discarded by the millions; timing leaks reveal
//! nothing an observer could not compute themselves.

use core::fmt::Debug;
use core::ops::{Add, Mul, Neg, Sub};

const LOW_51_BIT_MASK: u64 = (1u64 << 51) - 1;

/// An element of GF(2^255 - 19).
#[derive(Copy, Clone)]
pub struct FieldElement(pub(crate) [u64; 5]);

impl Debug for FieldElement {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "FieldElement({:?})", &self.0[..])
    }
}

impl PartialEq for FieldElement {
    fn eq(&self, other: &FieldElement) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for FieldElement {}

impl FieldElement {
    pub const ZERO: FieldElement = FieldElement([0, 0, 0, 0, 0]);
    pub const ONE: FieldElement = FieldElement([1, 0, 0, 0, 0]);

    /// Carry excess bits off each limb, folding the top carry back in
    /// multiplied by 19. Output limbs fit in 52 bits.
    #[inline(always)]
    fn reduce(mut limbs: [u64; 5]) -> FieldElement {
        let c0 = limbs[0] >> 51;
        let c1 = limbs[1] >> 51;
        let c2 = limbs[2] >> 51;
        let c3 = limbs[3] >> 51;
        let c4 = limbs[4] >> 51;

        limbs[0] &= LOW_51_BIT_MASK;
        limbs[1] &= LOW_51_BIT_MASK;
        limbs[2] &= LOW_51_BIT_MASK;
        limbs[3] &= LOW_51_BIT_MASK;
        limbs[4] &= LOW_51_BIT_MASK;

        limbs[0] += c4 * 19;
        limbs[1] += c0;
        limbs[2] += c1;
        limbs[3] += c2;
        limbs[4] += c3;

        FieldElement(limbs)
    }

    /// Load an element from 32 little-endian bytes, masking the top bit.
    pub fn from_bytes(bytes: &[u8; 32]) -> FieldElement {
        #[inline]
        fn load8(b: &[u8]) -> u64 {
            u64::from_le_bytes(b[..8].try_into().unwrap())
        }

        FieldElement([
            load8(&bytes[0..]) & LOW_51_BIT_MASK,
            (load8(&bytes[6..]) >> 3) & LOW_51_BIT_MASK,
            (load8(&bytes[12..]) >> 6) & LOW_51_BIT_MASK,
            (load8(&bytes[19..]) >> 1) & LOW_51_BIT_MASK,
            (load8(&bytes[24..]) >> 12) & LOW_51_BIT_MASK,
        ])
    }

    /// Serialize to the canonical 32-byte little-endian encoding.
    #[rustfmt::skip]
    pub fn to_bytes(self) -> [u8; 32] {
        // First reduce below 2*p, then conditionally subtract p once.
        // h >= p  <=>  h + 19 >= 2^255, so the quotient bit is the carry
        // out of h + 19.
        let mut limbs = FieldElement::reduce(self.0).0;

        let mut q = (limbs[0] + 19) >> 51;
        q = (limbs[1] + q) >> 51;
        q = (limbs[2] + q) >> 51;
        q = (limbs[3] + q) >> 51;
        q = (limbs[4] + q) >> 51;

        limbs[0] += 19 * q;

        limbs[1] += limbs[0] >> 51; limbs[0] &= LOW_51_BIT_MASK;
        limbs[2] += limbs[1] >> 51; limbs[1] &= LOW_51_BIT_MASK;
        limbs[3] += limbs[2] >> 51; limbs[2] &= LOW_51_BIT_MASK;
        limbs[4] += limbs[3] >> 51; limbs[3] &= LOW_51_BIT_MASK;
        limbs[4] &= LOW_51_BIT_MASK;

        let mut s = [0u8; 32];
        s[ 0] =   limbs[0]        as u8;
        s[ 1] =  (limbs[0] >>  8) as u8;
        s[ 2] =  (limbs[0] >> 16) as u8;
        s[ 3] =  (limbs[0] >> 24) as u8;
        s[ 4] =  (limbs[0] >> 32) as u8;
        s[ 5] =  (limbs[0] >> 40) as u8;
        s[ 6] = ((limbs[0] >> 48) | (limbs[1] << 3)) as u8;
        s[ 7] =  (limbs[1] >>  5) as u8;
        s[ 8] =  (limbs[1] >> 13) as u8;
        s[ 9] =  (limbs[1] >> 21) as u8;
        s[10] =  (limbs[1] >> 29) as u8;
        s[11] =  (limbs[1] >> 37) as u8;
        s[12] = ((limbs[1] >> 45) | (limbs[2] << 6)) as u8;
        s[13] =  (limbs[2] >>  2) as u8;
        s[14] =  (limbs[2] >> 10) as u8;
        s[15] =  (limbs[2] >> 18) as u8;
        s[16] =  (limbs[2] >> 26) as u8;
        s[17] =  (limbs[2] >> 34) as u8;
        s[18] =  (limbs[2] >> 42) as u8;
        s[19] = ((limbs[2] >> 50) | (limbs[3] << 1)) as u8;
        s[20] =  (limbs[3] >>  7) as u8;
        s[21] =  (limbs[3] >> 15) as u8;
        s[22] =  (limbs[3] >> 23) as u8;
        s[23] =  (limbs[3] >> 31) as u8;
        s[24] =  (limbs[3] >> 39) as u8;
        s[25] = ((limbs[3] >> 47) | (limbs[4] << 4)) as u8;
        s[26] =  (limbs[4] >>  4) as u8;
        s[27] =  (limbs[4] >> 12) as u8;
        s[28] =  (limbs[4] >> 20) as u8;
        s[29] =  (limbs[4] >> 28) as u8;
        s[30] =  (limbs[4] >> 36) as u8;
        s[31] =  (limbs[4] >> 44) as u8;
        s
    }

    pub fn is_zero(&self) -> bool {
        self.to_bytes() == [0u8; 32]
    }

    /// True when the canonical encoding has its low bit set, the sign
    /// convention of the ed25519 paper.
    pub fn is_negative(&self) -> bool {
        self.to_bytes()[0] & 1 == 1
    }

    /// Compute `self^(2^k)` by `k` successive squarings, `k > 0`.
    #[rustfmt::skip]
    pub fn pow2k(&self, mut k: u32) -> FieldElement {
        debug_assert!(k > 0);

        #[inline(always)]
        fn m(x: u64, y: u64) -> u128 {
            (x as u128) * (y as u128)
        }

        let mut a = self.0;
        loop {
            let a3_19 = 19 * a[3];
            let a4_19 = 19 * a[4];

            let c0 = m(a[0], a[0]) + 2 * (m(a[1], a4_19) + m(a[2], a3_19));
            let c1 = m(a[3], a3_19) + 2 * (m(a[0], a[1]) + m(a[2], a4_19));
            let c2 = m(a[1], a[1]) + 2 * (m(a[0], a[2]) + m(a[4], a3_19));
            let c3 = m(a[4], a4_19) + 2 * (m(a[0], a[3]) + m(a[1], a[2]));
            let c4 = m(a[2], a[2]) + 2 * (m(a[0], a[4]) + m(a[1], a[3]));

            a = carry_chain(c0, c1, c2, c3, c4);

            k -= 1;
            if k == 0 {
                return FieldElement(a);
            }
        }
    }

    pub fn square(&self) -> FieldElement {
        self.pow2k(1)
    }

    /// Compute (self^(2^250 - 1), self^11), the shared prefix of the
    /// inversion and (p-5)/8 addition chains.
    fn pow22501(&self) -> (FieldElement, FieldElement) {
        let t0 = self.square();
        let t1 = t0.square().square();
        let t2 = self * &t1;
        let t3 = &t0 * &t2;
        let t4 = t3.square();
        let t5 = &t2 * &t4;
        let t6 = t5.pow2k(5);
        let t7 = &t6 * &t5;
        let t8 = t7.pow2k(10);
        let t9 = &t8 * &t7;
        let t10 = t9.pow2k(20);
        let t11 = &t10 * &t9;
        let t12 = t11.pow2k(10);
        let t13 = &t12 * &t7;
        let t14 = t13.pow2k(50);
        let t15 = &t14 * &t13;
        let t16 = t15.pow2k(100);
        let t17 = &t16 * &t15;
        let t18 = t17.pow2k(50);
        let t19 = &t18 * &t13;

        (t19, t3)
    }

    /// Multiplicative inverse via Fermat: self^(p-2). Returns zero on
    /// zero input.
    pub fn invert(&self) -> FieldElement {
        let (t19, t3) = self.pow22501();
        let t20 = t19.pow2k(5);
        &t20 * &t3
    }

    /// Raise to the power (p-5)/8 = 2^252 - 3.
    fn pow_p58(&self) -> FieldElement {
        let (t19, _) = self.pow22501();
        let t20 = t19.pow2k(2);
        self * &t20
    }

    /// Compute sqrt(u/v) when it exists.
    ///
    /// Returns `(true, sqrt(u/v))` if `u/v` is square (the nonnegative
    /// root), `(true, 0)` if `u` is zero, `(false, _)` otherwise.
    pub fn sqrt_ratio(u: &FieldElement, v: &FieldElement) -> (bool, FieldElement) {
        // r = (u v^3) (u v^7)^((p-5)/8); then v r^2 = ±u (or ±i·u when
        // u/v is nonsquare).
        let v3 = &v.square() * v;
        let v7 = &v3.square() * v;
        let mut r = &(u * &v3) * &(u * &v7).pow_p58();
        let check = v * &r.square();

        let neg_u = -u;
        let correct_sign = check == *u;
        let flipped_sign = check == neg_u;
        let flipped_sign_i = check == &neg_u * &super::constants::SQRT_M1;

        if flipped_sign || flipped_sign_i {
            r = &r * &super::constants::SQRT_M1;
        }
        if r.is_negative() {
            r = -&r;
        }

        (correct_sign || flipped_sign, r)
    }
}

#[inline(always)]
fn carry_chain(c0: u128, mut c1: u128, mut c2: u128, mut c3: u128, mut c4: u128) -> [u64; 5] {
    let mut out = [0u64; 5];

    c1 += (c0 >> 51) as u64 as u128;
    out[0] = (c0 as u64) & LOW_51_BIT_MASK;
    c2 += (c1 >> 51) as u64 as u128;
    out[1] = (c1 as u64) & LOW_51_BIT_MASK;
    c3 += (c2 >> 51) as u64 as u128;
    out[2] = (c2 as u64) & LOW_51_BIT_MASK;
    c4 += (c3 >> 51) as u64 as u128;
    out[3] = (c3 as u64) & LOW_51_BIT_MASK;
    let carry = (c4 >> 51) as u64;
    out[4] = (c4 as u64) & LOW_51_BIT_MASK;

    // The carry is at most 2^13 or so; one more pass leaves limb 1 with
    // comfortable headroom.
    out[0] += carry * 19;
    out[1] += out[0] >> 51;
    out[0] &= LOW_51_BIT_MASK;

    out
}

impl<'a, 'b> Add<&'b FieldElement> for &'a FieldElement {
    type Output = FieldElement;
    fn add(self, rhs: &'b FieldElement) -> FieldElement {
        let mut out = self.0;
        for i in 0..5 {
            out[i] += rhs.0[i];
        }
        FieldElement(out)
    }
}

impl<'a, 'b> Sub<&'b FieldElement> for &'a FieldElement {
    type Output = FieldElement;
    fn sub(self, rhs: &'b FieldElement) -> FieldElement {
        // Add 16*p before subtracting so limbs never underflow.
        FieldElement::reduce([
            (self.0[0] + 36028797018963664u64) - rhs.0[0],
            (self.0[1] + 36028797018963952u64) - rhs.0[1],
            (self.0[2] + 36028797018963952u64) - rhs.0[2],
            (self.0[3] + 36028797018963952u64) - rhs.0[3],
            (self.0[4] + 36028797018963952u64) - rhs.0[4],
        ])
    }
}

impl<'a> Neg for &'a FieldElement {
    type Output = FieldElement;
    fn neg(self) -> FieldElement {
        &FieldElement::ZERO - self
    }
}

impl<'a, 'b> Mul<&'b FieldElement> for &'a FieldElement {
    type Output = FieldElement;
    #[rustfmt::skip]
    fn mul(self, rhs: &'b FieldElement) -> FieldElement {
        #[inline(always)]
        fn m(x: u64, y: u64) -> u128 {
            (x as u128) * (y as u128)
        }

        let a = &self.0;
        let b = &rhs.0;

        // Schoolbook product with the high half folded down by 19,
        // since 2^255 = 19 mod p.
        let b1_19 = b[1] * 19;
        let b2_19 = b[2] * 19;
        let b3_19 = b[3] * 19;
        let b4_19 = b[4] * 19;

        let c0 = m(a[0], b[0]) + m(a[4], b1_19) + m(a[3], b2_19) + m(a[2], b3_19) + m(a[1], b4_19);
        let c1 = m(a[1], b[0]) + m(a[0], b[1])  + m(a[4], b2_19) + m(a[3], b3_19) + m(a[2], b4_19);
        let c2 = m(a[2], b[0]) + m(a[1], b[1])  + m(a[0], b[2])  + m(a[4], b3_19) + m(a[3], b4_19);
        let c3 = m(a[3], b[0]) + m(a[2], b[1])  + m(a[1], b[2])  + m(a[0], b[3])  + m(a[4], b4_19);
        let c4 = m(a[4], b[0]) + m(a[3], b[1])  + m(a[2], b[2])  + m(a[1], b[3])  + m(a[0], b[4]);

        FieldElement(carry_chain(c0, c1, c2, c3, c4))
    }
}

/// Simultaneous division: replace `x[i]` with `x[i] / y[i]` for all `i`,
/// spending one modular inversion and `4*(n-1) + 1` multiplications.
///
/// `r` and `s` are caller-owned scratch vectors of the same length; the
/// hot loop reuses them across calls so nothing is allocated here.
///
/// All `y[i]` must be nonzero; a zero denominator poisons the shared
/// inversion and every quotient in the batch.
pub fn vector_divide(
    x: &mut [FieldElement],
    y: &[FieldElement],
    r: &mut [FieldElement],
    s: &mut [FieldElement],
) {
    let n = x.len();
    debug_assert!(n > 0);
    debug_assert_eq!(n, y.len());
    debug_assert_eq!(n, r.len());
    debug_assert_eq!(n, s.len());

    // Forward pass: r[i] = y[0]*...*y[i], s[i] = y[0]*...*y[i-1] * x[i].
    r[0] = y[0];
    for i in 1..n {
        r[i] = &r[i - 1] * &y[i];
        s[i] = &r[i - 1] * &x[i];
    }

    let mut t = r[n - 1].invert();

    // Backward pass: peel one denominator off the running inverse per step.
    for i in (1..n).rev() {
        x[i] = &t * &s[i];
        t = &t * &y[i];
    }
    x[0] = &t * &x[0];
}
