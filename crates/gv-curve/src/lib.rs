//! secp256k1 scalar/point arithmetic, HMAC-SHA512 and the on-curve point
//! codec — the "EC Primitives" layer every other GuardianVault crate
//! builds on (spec §4.1).
//!
//! Nothing here knows about shares, ceremonies, or chains; it only knows
//! about the group.

mod field;
mod point;
mod scalar;

pub use point::Point;
pub use scalar::Scalar;

use hmac::{Hmac, Mac};
use num_bigint::BigUint;
use sha2::{Digest, Sha256, Sha512};
use thiserror::Error;

pub(crate) const SECP256K1_P_HEX: &str =
    "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEFFFFFC2F";
pub(crate) const SECP256K1_N_HEX: &str =
    "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141";
pub(crate) const SECP256K1_GX_HEX: &str =
    "79BE667EF9DCBBAC55A06295CE870B07029BFCDB2DCE28D959F2815B16F81798";
pub(crate) const SECP256K1_GY_HEX: &str =
    "483ADA7726A3C4655DA4FBFC0E1108A8FD17B448A68554199C47D08FFB10D4B8";

lazy_static::lazy_static! {
    pub(crate) static ref SECP256K1_PRIME: BigUint =
        BigUint::parse_bytes(SECP256K1_P_HEX.as_bytes(), 16).unwrap();
    pub(crate) static ref SECP256K1_ORDER: BigUint =
        BigUint::parse_bytes(SECP256K1_N_HEX.as_bytes(), 16).unwrap();
    pub(crate) static ref SECP256K1_GENERATOR: Point = {
        let gx = BigUint::parse_bytes(SECP256K1_GX_HEX.as_bytes(), 16).unwrap();
        let gy = BigUint::parse_bytes(SECP256K1_GY_HEX.as_bytes(), 16).unwrap();
        Point::from_affine(gx, gy)
    };
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CurveError {
    #[error("scalar is not in [0, n)")]
    ScalarOutOfRange,
    #[error("point encoding is malformed")]
    InvalidPointEncoding,
    #[error("point does not satisfy the curve equation")]
    PointNotOnCurve,
}

/// `HMAC-SHA512(key, data)`, returning the raw 64-byte output. Used by
/// BIP32 master-key derivation and hardened/non-hardened child tweaks
/// (spec §4.2).
pub fn hmac_sha512(key: &[u8], data: &[u8]) -> [u8; 64] {
    let mut mac = Hmac::<Sha512>::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data);
    let result = mac.finalize().into_bytes();
    let mut out = [0u8; 64];
    out.copy_from_slice(&result);
    out
}

/// Double-SHA256, the Bitcoin hash function used throughout legacy and
/// BIP143 sighash computation (spec §4.3).
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    second.into()
}

/// SHA256 then RIPEMD160 ("hash160"), used to derive a P2PKH/P2WPKH
/// pubkey hash from a compressed public key.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    use ripemd::Ripemd160;
    let sha = Sha256::digest(data);
    let ripemd = Ripemd160::digest(sha);
    ripemd.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hmac_sha512_matches_known_vector() {
        // RFC 4231 test case 1, truncated key/data, SHA-512 variant.
        let key = [0x0bu8; 20];
        let data = b"Hi There";
        let mac = hmac_sha512(&key, data);
        assert_eq!(
            hex::encode(mac),
            "87aa7cdea5ef619d4ff0b4241a1d6cb02379f4e2ce4ec2787ad0b30545e17cdedaa833b7d6b8a702038b274eaea3f4e4be9d914eeb61f1702e696c203a126854"
        );
    }

    #[test]
    fn double_sha256_is_sha256_twice() {
        let once = Sha256::digest(b"abc");
        let twice = Sha256::digest(once);
        assert_eq!(double_sha256(b"abc"), <[u8; 32]>::from(twice));
    }
}
