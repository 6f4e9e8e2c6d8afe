use std::fmt;

use num_bigint::BigUint;
use num_traits::Zero;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::field;
use crate::{CurveError, SECP256K1_ORDER};

/// An integer in `[0, n)`, where `n` is the secp256k1 group order.
///
/// Every private scalar in this workspace — a share, a nonce, a tweak — is
/// one of these. It zeroizes its backing bytes on drop and never prints
/// its value via `Debug`/`Display`.
#[derive(Clone)]
pub struct Scalar(BigUint);

impl Scalar {
    pub fn zero() -> Self {
        Scalar(BigUint::zero())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Draws a uniform value in `[0, n)` by rejection sampling on 32
    /// uniformly random bytes reduced mod `n` (negligible bias, the same
    /// approach the teacher crate's `ECScalar::random` backends use via
    /// `rand`).
    pub fn random(rng: &mut impl RngCore) -> Self {
        loop {
            let mut bytes = [0u8; 32];
            rng.fill_bytes(&mut bytes);
            let candidate = BigUint::from_bytes_be(&bytes);
            if candidate < *SECP256K1_ORDER {
                return Scalar(candidate);
            }
        }
    }

    /// Reduces an arbitrary-length big-endian byte string mod `n`. Used for
    /// HMAC-SHA512 tweaks (BIP32) and for reducing a message digest `z`.
    pub fn from_bytes_mod_order(bytes: &[u8]) -> Self {
        Scalar(BigUint::from_bytes_be(bytes) % &*SECP256K1_ORDER)
    }

    /// Parses a big-endian 32-byte scalar, rejecting values `>= n`.
    pub fn from_be_bytes(bytes: &[u8; 32]) -> Result<Self, CurveError> {
        let v = BigUint::from_bytes_be(bytes);
        if v >= *SECP256K1_ORDER {
            return Err(CurveError::ScalarOutOfRange);
        }
        Ok(Scalar(v))
    }

    pub fn to_be_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        let bytes = field::to_be_bytes(&self.0, 32);
        out.copy_from_slice(&bytes);
        out
    }

    #[cfg(test)]
    pub fn from_hex(s: &str) -> Self {
        let bytes = hex::decode(s).expect("valid hex");
        Self::from_bytes_mod_order(&bytes)
    }

    pub fn add(&self, other: &Scalar) -> Scalar {
        Scalar(field::add_mod(&self.0, &other.0, &SECP256K1_ORDER))
    }

    pub fn sub(&self, other: &Scalar) -> Scalar {
        Scalar(field::sub_mod(&self.0, &other.0, &SECP256K1_ORDER))
    }

    pub fn mul(&self, other: &Scalar) -> Scalar {
        Scalar(field::mul_mod(&self.0, &other.0, &SECP256K1_ORDER))
    }

    /// `self^-1 mod n` via Fermat's little theorem (`self^(n-2) mod n`).
    /// `None` for the zero scalar.
    pub fn invert(&self) -> Option<Scalar> {
        field::invert_mod(&self.0, &SECP256K1_ORDER).map(Scalar)
    }

    pub fn from_u64(x: u64) -> Self {
        Scalar(BigUint::from(x))
    }

    /// Canonical decimal rendering, used wherever a round scalar (`k`, `r`,
    /// `s_i`, `s`) is persisted or put on the wire rather than hex-encoded
    /// (spec §4.5, §9: large integers must round-trip via decimal strings,
    /// never a binary type that could truncate).
    pub fn to_decimal_string(&self) -> String {
        self.0.to_str_radix(10)
    }

    /// Parses a canonical decimal string, rejecting anything `>= n` or not
    /// purely decimal digits (leading zeros are rejected by
    /// [`gv_primitives::DecimalUint`] upstream; this parser only enforces
    /// the range).
    pub fn from_decimal_str(s: &str) -> Result<Self, CurveError> {
        let v = BigUint::parse_bytes(s.as_bytes(), 10).ok_or(CurveError::ScalarOutOfRange)?;
        if v >= *SECP256K1_ORDER {
            return Err(CurveError::ScalarOutOfRange);
        }
        Ok(Scalar(v))
    }

    /// `true` if `self > n/2`, the low-S test (BIP62 / spec §4.3).
    pub fn is_high(&self) -> bool {
        self.0 > &*SECP256K1_ORDER / BigUint::from(2u32)
    }

    /// `n - self`, used for low-S normalization.
    pub fn negate(&self) -> Scalar {
        Scalar(field::sub_mod(&SECP256K1_ORDER, &self.0, &SECP256K1_ORDER))
    }

    pub(crate) fn as_biguint(&self) -> &BigUint {
        &self.0
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
impl Eq for Scalar {}

impl Default for Scalar {
    fn default() -> Self {
        Scalar::zero()
    }
}

impl fmt::Debug for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scalar(REDACTED)")
    }
}

impl Zeroize for Scalar {
    fn zeroize(&mut self) {
        self.0 = BigUint::zero();
    }
}
impl ZeroizeOnDrop for Scalar {}

impl std::iter::Sum for Scalar {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Scalar::zero(), |a, b| a.add(&b))
    }
}

impl Serialize for Scalar {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&hex::encode(self.to_be_bytes()))
    }
}

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("scalar must be 32 bytes"))?;
        Scalar::from_be_bytes(&arr).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn invert_round_trips() {
        let mut rng = StdRng::seed_from_u64(1);
        let s = Scalar::random(&mut rng);
        let inv = s.invert().unwrap();
        assert_eq!(s.mul(&inv), Scalar::from_u64(1));
    }

    #[test]
    fn zero_has_no_inverse() {
        assert!(Scalar::zero().invert().is_none());
    }

    #[test]
    fn negate_of_high_is_low() {
        let mut rng = StdRng::seed_from_u64(2);
        let s = Scalar::random(&mut rng);
        let negated = s.negate();
        assert_eq!(s.add(&negated), Scalar::zero());
    }

    #[test]
    fn decimal_round_trip() {
        let mut rng = StdRng::seed_from_u64(3);
        let s = Scalar::random(&mut rng);
        let decimal = s.to_decimal_string();
        assert_eq!(Scalar::from_decimal_str(&decimal).unwrap(), s);
    }

    #[test]
    fn decimal_out_of_range_is_rejected() {
        assert!(Scalar::from_decimal_str(&SECP256K1_ORDER.to_str_radix(10)).is_err());
    }

    #[test]
    fn serde_round_trips_via_hex() {
        let s = Scalar::from_hex("01");
        let json = serde_json::to_string(&s).unwrap();
        let back: Scalar = serde_json::from_str(&json).unwrap();
        assert_eq!(s, back);
    }
}
