use std::fmt;

use num_bigint::BigUint;
use num_traits::Zero;

use crate::field;
use crate::scalar::Scalar;
use crate::{CurveError, SECP256K1_GENERATOR, SECP256K1_ORDER, SECP256K1_PRIME};

#[derive(Clone, Copy, PartialEq, Eq)]
struct Affine {
    x: BigUint,
    y: BigUint,
}

/// A point on secp256k1 in affine coordinates, plus a distinguished point
/// at infinity (`None`).
///
/// Arithmetic is plain double-and-add / the textbook affine addition
/// formulas — constant-time execution is not required for these public-value
/// paths (spec §4.1); only scalar material (see [`Scalar`]) needs to be
/// zeroized, not points.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Point(Option<Affine>);

impl Point {
    pub fn infinity() -> Self {
        Point(None)
    }

    pub fn is_infinity(&self) -> bool {
        self.0.is_none()
    }

    pub fn generator() -> &'static Point {
        &SECP256K1_GENERATOR
    }

    pub(crate) fn from_affine(x: BigUint, y: BigUint) -> Self {
        Point(Some(Affine { x, y }))
    }

    /// `scalar * G`.
    pub fn from_scalar(scalar: &Scalar) -> Self {
        Self::generator().mul(scalar)
    }

    pub fn add(&self, other: &Point) -> Point {
        match (&self.0, &other.0) {
            (None, _) => *other,
            (_, None) => *self,
            (Some(a), Some(b)) => {
                if a.x == b.x {
                    if field::sub_mod(&a.y, &b.y, &SECP256K1_PRIME).is_zero() {
                        return Self::double_affine(a);
                    }
                    // a.x == b.x but y differs: P + (-P) = infinity.
                    return Point::infinity();
                }
                let lambda = field::mul_mod(
                    &field::sub_mod(&b.y, &a.y, &SECP256K1_PRIME),
                    &field::invert_mod(&field::sub_mod(&b.x, &a.x, &SECP256K1_PRIME), &SECP256K1_PRIME)
                        .expect("x-coordinates differ, so the inverse exists"),
                    &SECP256K1_PRIME,
                );
                Self::from_lambda(a, b, &lambda)
            }
        }
    }

    fn double_affine(a: &Affine) -> Point {
        if a.y.is_zero() {
            return Point::infinity();
        }
        let three_x2 = field::mul_mod(&BigUint::from(3u32), &field::mul_mod(&a.x, &a.x, &SECP256K1_PRIME), &SECP256K1_PRIME);
        let two_y_inv = field::invert_mod(&field::mul_mod(&BigUint::from(2u32), &a.y, &SECP256K1_PRIME), &SECP256K1_PRIME)
            .expect("y is non-zero, so 2y is invertible mod p");
        let lambda = field::mul_mod(&three_x2, &two_y_inv, &SECP256K1_PRIME);
        Self::from_lambda(a, a, &lambda)
    }

    fn from_lambda(a: &Affine, b: &Affine, lambda: &BigUint) -> Point {
        let lambda2 = field::mul_mod(lambda, lambda, &SECP256K1_PRIME);
        let x3 = field::sub_mod(&field::sub_mod(&lambda2, &a.x, &SECP256K1_PRIME), &b.x, &SECP256K1_PRIME);
        let y3 = field::sub_mod(
            &field::mul_mod(lambda, &field::sub_mod(&a.x, &x3, &SECP256K1_PRIME), &SECP256K1_PRIME),
            &a.y,
            &SECP256K1_PRIME,
        );
        Point::from_affine(x3, y3)
    }

    pub fn negate(&self) -> Point {
        match &self.0 {
            None => Point::infinity(),
            Some(a) => Point::from_affine(a.x.clone(), field::sub_mod(&SECP256K1_PRIME, &a.y, &SECP256K1_PRIME)),
        }
    }

    pub fn sub(&self, other: &Point) -> Point {
        self.add(&other.negate())
    }

    /// `scalar * self`, double-and-add.
    pub fn mul(&self, scalar: &Scalar) -> Point {
        let mut result = Point::infinity();
        let mut addend = *self;
        let mut n = scalar.as_biguint().clone();
        let one = BigUint::from(1u32);
        while !n.is_zero() {
            if &n & &one == one {
                result = result.add(&addend);
            }
            addend = addend.add(&addend);
            n >>= 1u32;
        }
        result
    }

    pub fn x_bytes(&self) -> [u8; 32] {
        let a = self.0.as_ref().expect("point at infinity has no x-coordinate");
        let mut out = [0u8; 32];
        out.copy_from_slice(&field::to_be_bytes(&a.x, 32));
        out
    }

    /// `x mod n`, the `r` value of an ECDSA signature (spec §4.4).
    pub fn x_scalar(&self) -> Scalar {
        let a = self.0.as_ref().expect("point at infinity has no x-coordinate");
        Scalar::from_bytes_mod_order(&(&a.x % &*SECP256K1_ORDER).to_bytes_be())
    }

    pub fn is_even_y(&self) -> bool {
        match &self.0 {
            None => false,
            Some(a) => (&a.y % BigUint::from(2u32)).is_zero(),
        }
    }

    /// 33-byte compressed SEC1 encoding (`0x02`/`0x03` prefix by parity of
    /// `y`). The point at infinity has no standard encoding; callers that
    /// might hit it (aggregated `R`) must check [`Point::is_infinity`] first.
    pub fn to_compressed(&self) -> [u8; 33] {
        let a = self.0.as_ref().expect("cannot serialize the point at infinity");
        let mut out = [0u8; 33];
        out[0] = if (&a.y % BigUint::from(2u32)).is_zero() { 0x02 } else { 0x03 };
        out[1..].copy_from_slice(&field::to_be_bytes(&a.x, 32));
        out
    }

    pub fn to_uncompressed(&self) -> [u8; 65] {
        let a = self.0.as_ref().expect("cannot serialize the point at infinity");
        let mut out = [0u8; 65];
        out[0] = 0x04;
        out[1..33].copy_from_slice(&field::to_be_bytes(&a.x, 32));
        out[33..].copy_from_slice(&field::to_be_bytes(&a.y, 32));
        out
    }

    /// Decodes a compressed (33-byte) or uncompressed (65-byte) SEC1 point,
    /// rejecting anything off-curve.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CurveError> {
        match bytes.len() {
            33 => {
                let prefix = bytes[0];
                if prefix != 0x02 && prefix != 0x03 {
                    return Err(CurveError::InvalidPointEncoding);
                }
                let x = BigUint::from_bytes_be(&bytes[1..33]);
                if x >= *SECP256K1_PRIME {
                    return Err(CurveError::InvalidPointEncoding);
                }
                let y = Self::recover_y(&x, prefix == 0x02)?;
                let point = Point::from_affine(x, y);
                if !point.is_on_curve() {
                    return Err(CurveError::PointNotOnCurve);
                }
                Ok(point)
            }
            65 => {
                if bytes[0] != 0x04 {
                    return Err(CurveError::InvalidPointEncoding);
                }
                let x = BigUint::from_bytes_be(&bytes[1..33]);
                let y = BigUint::from_bytes_be(&bytes[33..65]);
                let point = Point::from_affine(x, y);
                if !point.is_on_curve() {
                    return Err(CurveError::PointNotOnCurve);
                }
                Ok(point)
            }
            _ => Err(CurveError::InvalidPointEncoding),
        }
    }

    /// Solves `y^2 = x^3 + 7 (mod p)` for the root with the requested
    /// parity, rejecting `x` values with no square root (off-curve).
    fn recover_y(x: &BigUint, want_even: bool) -> Result<BigUint, CurveError> {
        let rhs = field::add_mod(
            &field::mul_mod(&field::mul_mod(x, x, &SECP256K1_PRIME), x, &SECP256K1_PRIME),
            &BigUint::from(7u32),
            &SECP256K1_PRIME,
        );
        // p % 4 == 3 for secp256k1, so sqrt(rhs) = rhs^((p+1)/4) mod p when
        // a square root exists.
        let exponent = (&*SECP256K1_PRIME + BigUint::from(1u32)) / BigUint::from(4u32);
        let candidate = rhs.modpow(&exponent, &SECP256K1_PRIME);
        if field::mul_mod(&candidate, &candidate, &SECP256K1_PRIME) != rhs {
            return Err(CurveError::PointNotOnCurve);
        }
        let candidate_is_even = (&candidate % BigUint::from(2u32)).is_zero();
        if candidate_is_even == want_even {
            Ok(candidate)
        } else {
            Ok(field::sub_mod(&SECP256K1_PRIME, &candidate, &SECP256K1_PRIME))
        }
    }

    fn is_on_curve(&self) -> bool {
        match &self.0 {
            None => true,
            Some(a) => {
                let lhs = field::mul_mod(&a.y, &a.y, &SECP256K1_PRIME);
                let rhs = field::add_mod(
                    &field::mul_mod(&field::mul_mod(&a.x, &a.x, &SECP256K1_PRIME), &a.x, &SECP256K1_PRIME),
                    &BigUint::from(7u32),
                    &SECP256K1_PRIME,
                );
                lhs == rhs
            }
        }
    }
}

impl fmt::Debug for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            None => write!(f, "Point(infinity)"),
            Some(_) => write!(f, "Point({})", hex::encode(self.to_compressed())),
        }
    }
}

impl std::iter::Sum for Point {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Point::infinity(), |a, b| a.add(&b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn generator_is_on_curve() {
        assert!(Point::generator().is_on_curve());
    }

    #[test]
    fn compressed_round_trip() {
        let mut rng = StdRng::seed_from_u64(7);
        let s = Scalar::random(&mut rng);
        let p = Point::from_scalar(&s);
        let bytes = p.to_compressed();
        let decoded = Point::from_bytes(&bytes).unwrap();
        assert_eq!(p, decoded);
    }

    #[test]
    fn uncompressed_round_trip() {
        let mut rng = StdRng::seed_from_u64(8);
        let s = Scalar::random(&mut rng);
        let p = Point::from_scalar(&s);
        let decoded = Point::from_bytes(&p.to_uncompressed()).unwrap();
        assert_eq!(p, decoded);
    }

    #[test]
    fn rejects_off_curve_point() {
        let mut bytes = Point::from_scalar(&Scalar::from_u64(5)).to_compressed();
        bytes[1] ^= 0xff;
        assert!(Point::from_bytes(&bytes).is_err());
    }

    #[test]
    fn addition_matches_doubling() {
        let mut rng = StdRng::seed_from_u64(9);
        let s = Scalar::random(&mut rng);
        let p = Point::from_scalar(&s);
        let doubled_by_add = p.add(&p);
        let doubled_by_mul = Point::from_scalar(&s.add(&s));
        assert_eq!(doubled_by_add, doubled_by_mul);
    }

    #[test]
    fn scalar_mult_distributes_over_addition() {
        let mut rng = StdRng::seed_from_u64(10);
        let a = Scalar::random(&mut rng);
        let b = Scalar::random(&mut rng);
        let lhs = Point::from_scalar(&a.add(&b));
        let rhs = Point::from_scalar(&a).add(&Point::from_scalar(&b));
        assert_eq!(lhs, rhs);
    }
}
