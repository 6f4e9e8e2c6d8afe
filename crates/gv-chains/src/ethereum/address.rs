//! Ethereum's 20-byte account address, hex-encoded with an EIP-55 checksum.

use sha3::{Digest, Keccak256};

use crate::ChainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// From an uncompressed (65-byte, `0x04` prefix stripped) or raw
    /// 64-byte public key: the low 20 bytes of `keccak256(pubkey_xy)`.
    pub fn from_uncompressed_pubkey_xy(xy: &[u8; 64]) -> Address {
        let hash = Keccak256::digest(xy);
        let mut out = [0u8; 20];
        out.copy_from_slice(&hash[12..]);
        Address(out)
    }

    pub fn parse(s: &str) -> Result<Address, ChainError> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped).map_err(|_| ChainError::BadAddress)?;
        let arr: [u8; 20] = bytes.try_into().map_err(|_| ChainError::BadAddress)?;
        Ok(Address(arr))
    }

    /// Renders with EIP-55 mixed-case checksum: hex digit `i` is
    /// uppercased if the corresponding nibble of `keccak256(lowercase_hex)`
    /// is `>= 8`.
    pub fn to_checksummed_string(&self) -> String {
        let lower = hex::encode(self.0);
        let hash = Keccak256::digest(lower.as_bytes());
        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            if c.is_ascii_digit() {
                out.push(c);
                continue;
            }
            let nibble = if i % 2 == 0 { hash[i / 2] >> 4 } else { hash[i / 2] & 0x0f };
            if nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_through_lowercase() {
        let addr = Address::parse("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BEAed").unwrap();
        assert_eq!(addr.0.len(), 20);
        let reparsed = Address::parse(&addr.to_checksummed_string()).unwrap();
        assert_eq!(addr, reparsed);
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(Address::parse("0x1234").is_err());
    }
}
