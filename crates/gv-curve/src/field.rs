//! Modular-arithmetic helpers shared by [`crate::Scalar`] and [`crate::Point`].
//!
//! `pow(x, -1, n)` semantics (Fermat's little theorem: `x^(n-2) mod n`) are
//! used everywhere a modular inverse appears, both for the field (point
//! doubling/addition) and for the scalar field (ECDSA `k^-1`, BIP32's
//! `1/n`).

use num_bigint::BigUint;
use num_traits::{One, Zero};

/// `x^-1 mod m`, or `None` if `x` is `0`.
pub fn invert_mod(x: &BigUint, m: &BigUint) -> Option<BigUint> {
    if x.is_zero() {
        return None;
    }
    let exponent = m - BigUint::from(2u32);
    Some(x.modpow(&exponent, m))
}

pub fn add_mod(a: &BigUint, b: &BigUint, m: &BigUint) -> BigUint {
    (a + b) % m
}

pub fn sub_mod(a: &BigUint, b: &BigUint, m: &BigUint) -> BigUint {
    if a >= b {
        (a - b) % m
    } else {
        m - ((b - a) % m)
    }
}

pub fn mul_mod(a: &BigUint, b: &BigUint, m: &BigUint) -> BigUint {
    (a * b) % m
}

/// Big-endian, zero-padded to `len` bytes. Panics if `x` does not fit —
/// callers only ever invoke this with values already reduced mod a
/// 256-bit modulus.
pub fn to_be_bytes(x: &BigUint, len: usize) -> Vec<u8> {
    let raw = x.to_bytes_be();
    assert!(raw.len() <= len, "value does not fit in {len} bytes");
    let mut out = vec![0u8; len - raw.len()];
    out.extend_from_slice(&raw);
    out
}

pub fn one() -> BigUint {
    BigUint::one()
}
