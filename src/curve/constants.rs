//! Curve constants in 51-bit limb form.

use super::edwards::EdwardsPoint;
use super::field::FieldElement;

/// Edwards curve parameter `d = -121665/121666 mod p`.
pub const EDWARDS_D: FieldElement = FieldElement([
    929955233495203,
    466365720129213,
    1662059464998953,
    2033849074728123,
    1442794654840575,
]);

/// `2 * d`, used by the extended-coordinate addition formula.
pub const EDWARDS_D2: FieldElement = FieldElement([
    1859910466990425,
    932731440258426,
    1072319116312658,
    1815898335770999,
    633789495995903,
]);

/// `sqrt(-1) mod p`.
pub const SQRT_M1: FieldElement = FieldElement([
    1718705420411056,
    234908883556509,
    2233514472574048,
    2117202627021982,
    765476049583133,
]);

/// The Ed25519 basepoint B, with y = 4/5.
pub const ED25519_BASEPOINT: EdwardsPoint = EdwardsPoint {
    x: FieldElement([
        1738742601995546,
        1146398526822698,
        2070867633025821,
        562264141797630,
        587772402128613,
    ]),
    y: FieldElement([
        1801439850948184,
        1351079888211148,
        450359962737049,
        900719925474099,
        1801439850948198,
    ]),
    z: FieldElement([1, 0, 0, 0, 0]),
    t: FieldElement([
        1841354044333475,
        16398895984059,
        755974180946558,
        900171276175154,
        1821297809914039,
    ]),
};
