//! Bitcoin address decoding: legacy Base58Check and Bech32/Bech32m witness
//! addresses (spec §4.3, testable property 7).

use bech32::{self, FromBase32, Variant};

use crate::ChainError;

/// Which network an address's version byte / HRP identifies it with.
/// `Testnet` and `Regtest` share version bytes and HRPs in real Bitcoin
/// (`tb`/`bcrt` differ only for Bech32); we keep them distinct here because
/// the source system always knows which network a vault targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Testnet,
    Regtest,
}

impl Network {
    fn bech32_hrp(self) -> &'static str {
        match self {
            Network::Mainnet => "bc",
            Network::Testnet => "tb",
            Network::Regtest => "bcrt",
        }
    }

    fn from_bech32_hrp(hrp: &str) -> Option<Network> {
        match hrp {
            "bc" => Some(Network::Mainnet),
            "tb" => Some(Network::Testnet),
            "bcrt" => Some(Network::Regtest),
            _ => None,
        }
    }
}

/// The decoded shape of a Bitcoin address, independent of network. This is
/// what the sighash and scriptPubKey builders (`script.rs`) actually
/// consume — `Address` itself is just the wire encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AddressPayload {
    /// Base58Check, version byte `0x00`/`0x6f`.
    P2pkh { pubkey_hash: [u8; 20] },
    /// Base58Check, version byte `0x05`/`0xc4`.
    P2sh { script_hash: [u8; 20] },
    /// Bech32, witness version 0, 20-byte program.
    P2wpkh { pubkey_hash: [u8; 20] },
    /// Bech32, witness version 0, 32-byte program.
    P2wsh { script_hash: [u8; 32] },
    /// Bech32m, witness version 1, 32-byte program.
    P2tr { output_key: [u8; 32] },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Address {
    pub network: Network,
    pub payload: AddressPayload,
}

impl Address {
    /// Decodes a legacy or witness address, rejecting anything whose
    /// checksum is invalid or whose witness version doesn't match its
    /// Bech32 variant (v0 must be plain Bech32, v1 must be Bech32m).
    pub fn decode(s: &str) -> Result<Address, ChainError> {
        if let Ok(addr) = Self::decode_base58check(s) {
            return Ok(addr);
        }
        Self::decode_bech32(s)
    }

    fn decode_base58check(s: &str) -> Result<Address, ChainError> {
        let data = bs58::decode(s)
            .with_check(None)
            .into_vec()
            .map_err(|_| ChainError::BadAddress)?;
        if data.len() != 21 {
            return Err(ChainError::BadAddress);
        }
        let version = data[0];
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&data[1..]);
        match version {
            0x00 => Ok(Address {
                network: Network::Mainnet,
                payload: AddressPayload::P2pkh { pubkey_hash: hash },
            }),
            0x6f => Ok(Address {
                network: Network::Testnet,
                payload: AddressPayload::P2pkh { pubkey_hash: hash },
            }),
            0x05 => Ok(Address {
                network: Network::Mainnet,
                payload: AddressPayload::P2sh { script_hash: hash },
            }),
            0xc4 => Ok(Address {
                network: Network::Testnet,
                payload: AddressPayload::P2sh { script_hash: hash },
            }),
            _ => Err(ChainError::BadAddress),
        }
    }

    fn decode_bech32(s: &str) -> Result<Address, ChainError> {
        let (hrp, data, variant) = bech32::decode(s).map_err(|_| ChainError::BadAddress)?;
        let network = Network::from_bech32_hrp(&hrp).ok_or(ChainError::BadAddress)?;
        let (witness_version, program_words) =
            data.split_first().ok_or(ChainError::BadAddress)?;
        let witness_version = witness_version.to_u8();
        let program = Vec::<u8>::from_base32(program_words).map_err(|_| ChainError::BadAddress)?;

        match (witness_version, variant, program.len()) {
            (0, Variant::Bech32, 20) => {
                let mut hash = [0u8; 20];
                hash.copy_from_slice(&program);
                Ok(Address {
                    network,
                    payload: AddressPayload::P2wpkh { pubkey_hash: hash },
                })
            }
            (0, Variant::Bech32, 32) => {
                let mut hash = [0u8; 32];
                hash.copy_from_slice(&program);
                Ok(Address {
                    network,
                    payload: AddressPayload::P2wsh { script_hash: hash },
                })
            }
            (1, Variant::Bech32m, 32) => {
                let mut key = [0u8; 32];
                key.copy_from_slice(&program);
                Ok(Address {
                    network,
                    payload: AddressPayload::P2tr { output_key: key },
                })
            }
            // Correct version/length but wrong checksum variant (or vice
            // versa): explicitly rejected rather than silently accepted.
            _ => Err(ChainError::BadAddress),
        }
    }

    pub fn encode_bech32(&self) -> Option<String> {
        use bech32::{ToBase32, Variant as V};
        let (version, program, variant): (u8, &[u8], V) = match &self.payload {
            AddressPayload::P2wpkh { pubkey_hash } => (0, pubkey_hash, V::Bech32),
            AddressPayload::P2wsh { script_hash } => (0, script_hash, V::Bech32),
            AddressPayload::P2tr { output_key } => (1, output_key, V::Bech32m),
            AddressPayload::P2pkh { .. } | AddressPayload::P2sh { .. } => return None,
        };
        let mut words = vec![bech32::u5::try_from_u8(version).ok()?];
        words.extend(program.to_base32());
        bech32::encode(self.network.bech32_hrp(), words, variant).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_mainnet_p2pkh() {
        // Well-known all-zero-hash P2PKH address on mainnet.
        let addr = Address::decode("1111111111111111111114oLvT2").unwrap();
        assert_eq!(addr.network, Network::Mainnet);
        assert_eq!(
            addr.payload,
            AddressPayload::P2pkh {
                pubkey_hash: [0u8; 20]
            }
        );
    }

    #[test]
    fn p2wpkh_round_trips_through_bech32() {
        let addr = Address {
            network: Network::Regtest,
            payload: AddressPayload::P2wpkh {
                pubkey_hash: [0x11; 20],
            },
        };
        let encoded = addr.encode_bech32().unwrap();
        let decoded = Address::decode(&encoded).unwrap();
        assert_eq!(addr, decoded);
    }

    #[test]
    fn p2tr_round_trips_through_bech32m() {
        let addr = Address {
            network: Network::Mainnet,
            payload: AddressPayload::P2tr {
                output_key: [0x22; 32],
            },
        };
        let encoded = addr.encode_bech32().unwrap();
        let decoded = Address::decode(&encoded).unwrap();
        assert_eq!(addr, decoded);
    }

    #[test]
    fn v0_program_with_bech32m_checksum_is_rejected() {
        use bech32::{ToBase32, Variant};
        let mut words = vec![bech32::u5::try_from_u8(0).unwrap()];
        words.extend([0x33u8; 20].to_base32());
        let wrong_checksum = bech32::encode("bc", words, Variant::Bech32m).unwrap();
        assert!(Address::decode(&wrong_checksum).is_err());
    }

    #[test]
    fn v1_program_with_bech32_checksum_is_rejected() {
        use bech32::{ToBase32, Variant};
        let mut words = vec![bech32::u5::try_from_u8(1).unwrap()];
        words.extend([0x44u8; 32].to_base32());
        let wrong_checksum = bech32::encode("bc", words, Variant::Bech32).unwrap();
        assert!(Address::decode(&wrong_checksum).is_err());
    }
}
