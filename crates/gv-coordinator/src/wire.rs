//! Total-function serde for the values that cross the coordinator's
//! persistence and signing-plane boundaries (spec §9, "re-architecting
//! dynamic typing"): a curve point as a hex string, and a round scalar
//! (`k`, `r`, `s_i`, `s`) as a canonical decimal string, never a binary
//! integer type that could silently truncate.

use gv_curve::{CurveError, Point, Scalar};
use gv_primitives::DecimalUint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A curve point, wire-encoded as the hex of its 33-byte compressed SEC1
/// form. Decoding rejects off-curve points and the point at infinity has
/// no encoding — callers must not try to wire-encode an aggregated `R`
/// before checking [`gv_curve::Point::is_infinity`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PointHex(pub Point);

impl Serialize for PointHex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0.to_compressed()))
    }
}

impl<'de> Deserialize<'de> for PointHex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        Point::from_bytes(&bytes)
            .map(PointHex)
            .map_err(serde::de::Error::custom)
    }
}

/// A round scalar (`k`, `r`, `s_i`, `s`), wire-encoded as a canonical
/// decimal string via [`gv_primitives::DecimalUint`] (spec §4.5, §9).
/// Distinct from [`gv_curve::Scalar`]'s own `Serialize` impl, which uses
/// hex — that encoding is for 32-byte scalars generally (shares, tweaks);
/// this one is specifically for the large-integer round artifacts spec.md
/// requires to round-trip through decimal, never through a binary int.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecimalScalar(pub Scalar);

impl DecimalScalar {
    pub fn from_scalar(scalar: Scalar) -> Self {
        DecimalScalar(scalar)
    }

    pub fn into_scalar(self) -> Scalar {
        self.0
    }

    pub fn parse(s: &str) -> Result<Self, CurveError> {
        Scalar::from_decimal_str(s).map(DecimalScalar)
    }
}

impl Serialize for DecimalScalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_decimal_string())
    }
}

impl<'de> Deserialize<'de> for DecimalScalar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let canonical = DecimalUint::try_from(raw).map_err(serde::de::Error::custom)?;
        DecimalScalar::parse(canonical.as_str()).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gv_curve::Scalar;

    #[test]
    fn decimal_scalar_round_trips_through_json() {
        let original = DecimalScalar::from_scalar(Scalar::from_u64(123_456_789));
        let json = serde_json::to_string(&original).unwrap();
        assert_eq!(json, "\"123456789\"");
        let back: DecimalScalar = serde_json::from_str(&json).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn decimal_scalar_rejects_leading_zero() {
        let err = serde_json::from_str::<DecimalScalar>("\"0123\"");
        assert!(err.is_err());
    }

    #[test]
    fn point_hex_round_trips() {
        let point = Point::from_scalar(&Scalar::from_u64(5));
        let wrapped = PointHex(point);
        let json = serde_json::to_string(&wrapped).unwrap();
        let back: PointHex = serde_json::from_str(&json).unwrap();
        assert_eq!(back, wrapped);
    }
}
