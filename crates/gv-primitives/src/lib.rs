//! Identifiers, coin tags and canonical-encoding contracts shared by every
//! GuardianVault crate.
//!
//! Nothing in here touches curve arithmetic or transaction bytes; it exists
//! so that `gv-curve`, `gv-shares`, `gv-chains`, `gv-multisig` and
//! `gv-coordinator` can agree on "what a vault is", "what a guardian is" and
//! "what coin this is for" without depending on each other.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// The coin a vault is custodying. Threshold ECDSA is the only scheme this
/// workspace implements, so both variants share the signing engine; only
/// the transaction codec and derivation-path coin type differ.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoinType {
    Bitcoin,
    Ethereum,
}

impl CoinType {
    /// BIP44 coin type index used in `m/44'/coin'/...`.
    pub const fn bip44_index(self) -> u32 {
        match self {
            CoinType::Bitcoin => 0,
            CoinType::Ethereum => 60,
        }
    }
}

impl fmt::Display for CoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoinType::Bitcoin => write!(f, "Bitcoin"),
            CoinType::Ethereum => write!(f, "Ethereum"),
        }
    }
}

macro_rules! uuid_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

uuid_id!(VaultId, "Identifies one vault (one `n`-of-`n` wallet).");
uuid_id!(GuardianId, "Identifies one guardian, unique within a vault.");
uuid_id!(TransactionId, "Identifies one signing transaction.");

/// Round index in the four-round ceremony, also used as a persistence tag
/// so that a document for the wrong round fails to deserialize instead of
/// silently coercing (see `RoundArtifact` in `gv-coordinator`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum SigningRound {
    Round1 = 1,
    Round2 = 2,
    Round3 = 3,
    Round4 = 4,
}

/// The commonly agreed-upon byte encoding for a value that identifies a
/// key (a compressed point, an address, ...). Mirrors the teacher crate's
/// `CanonicalEncoding` trait so downstream key-id types can stay generic.
pub trait CanonicalEncoding {
    fn encode_key(&self) -> Vec<u8>;
}

impl<const N: usize> CanonicalEncoding for [u8; N] {
    fn encode_key(&self) -> Vec<u8> {
        self.to_vec()
    }
}

/// A non-negative integer transported as a canonical decimal string.
///
/// `k`, `r`, `s_i` and `s` all exceed 64 bits in general and must never be
/// persisted as a binary integer type that could silently truncate (see
/// spec §4.5 / §9). `DecimalUint` is the transport-level guard: it only
/// accepts strings with no leading zeros (other than the literal `"0"`)
/// and no sign, and round-trips through `Display`/`FromStr` byte-for-byte.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DecimalUint(String);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecimalUintError {
    #[error("empty decimal string")]
    Empty,
    #[error("non-canonical decimal string {0:?} (leading zero or non-digit)")]
    NonCanonical(String),
}

impl DecimalUint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(s: &str) -> Result<(), DecimalUintError> {
        if s.is_empty() {
            return Err(DecimalUintError::Empty);
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DecimalUintError::NonCanonical(s.to_string()));
        }
        if s.len() > 1 && s.as_bytes()[0] == b'0' {
            return Err(DecimalUintError::NonCanonical(s.to_string()));
        }
        Ok(())
    }
}

impl TryFrom<String> for DecimalUint {
    type Error = DecimalUintError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::validate(&s)?;
        Ok(Self(s))
    }
}

impl From<DecimalUint> for String {
    fn from(value: DecimalUint) -> Self {
        value.0
    }
}

impl fmt::Display for DecimalUint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DecimalUint {
    type Err = DecimalUintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::validate(s)?;
        Ok(Self(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_uint_rejects_leading_zero() {
        assert_eq!(
            "0123".parse::<DecimalUint>(),
            Err(DecimalUintError::NonCanonical("0123".to_string()))
        );
        assert_eq!("0".parse::<DecimalUint>().unwrap().as_str(), "0");
        assert_eq!("123".parse::<DecimalUint>().unwrap().as_str(), "123");
    }

    #[test]
    fn decimal_uint_rejects_non_digits() {
        assert!("-5".parse::<DecimalUint>().is_err());
        assert!("12a".parse::<DecimalUint>().is_err());
        assert!("".parse::<DecimalUint>().is_err());
    }

    #[test]
    fn vault_id_round_trips_through_display_and_fromstr() {
        let id = VaultId::new();
        let parsed: VaultId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }
}
