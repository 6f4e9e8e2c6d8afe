pub mod address;
pub mod script;
pub mod sighash;
pub mod tx;

pub use address::{Address, AddressPayload, Network};
pub use sighash::SIGHASH_ALL;
pub use tx::{Transaction, TxIn, TxOut, DUST_THRESHOLD_SATS};

use gv_curve::Point;

use crate::ChainError;

/// A request to build and sign a single-input, at-most-two-output Bitcoin
/// transaction: spend one UTXO at `sender` to `recipient`, with `fee_sats`
/// subtracted and the remainder returned to `sender` unless it would fall
/// below [`DUST_THRESHOLD_SATS`] (spec §6, §8 scenarios S1-S3).
#[derive(Clone, Debug)]
pub struct SpendRequest {
    pub prevout_txid: [u8; 32],
    pub prevout_vout: u32,
    pub input_amount_sats: u64,
    pub sender: Address,
    pub sender_pubkey: Point,
    pub recipient: Address,
    pub amount_sats: u64,
    pub fee_sats: u64,
}

/// The sighash to sign plus the unsigned skeleton needed to later splice
/// in the signature (scriptCode and the in-progress `Transaction`).
pub struct UnsignedSpend {
    pub message_hash: [u8; 32],
    pub transaction: Transaction,
    pub script_code: Vec<u8>,
    pub input_amount_sats: u64,
    pub is_witness: bool,
}

fn recipient_script_pubkey(addr: &Address) -> Vec<u8> {
    match &addr.payload {
        AddressPayload::P2pkh { pubkey_hash } => script::p2pkh_script_pubkey(pubkey_hash),
        AddressPayload::P2sh { script_hash } => script::p2sh_script_pubkey(script_hash),
        AddressPayload::P2wpkh { pubkey_hash } => script::p2wpkh_script_pubkey(pubkey_hash),
        AddressPayload::P2wsh { script_hash } => script::p2wsh_script_pubkey(script_hash),
        AddressPayload::P2tr { output_key } => script::p2tr_script_pubkey(output_key),
    }
}

/// Builds the unsigned transaction and computes its sighash. Spending from
/// a P2TR sender is rejected: Taproot key-path spends require a Schnorr
/// signature, which this engine cannot produce (spec §4.3, §8 scenario S3).
pub fn build_unsigned_spend(req: &SpendRequest) -> Result<UnsignedSpend, ChainError> {
    let (script_code, is_witness) = match &req.sender.payload {
        AddressPayload::P2pkh { pubkey_hash } => (script::p2pkh_script_pubkey(pubkey_hash), false),
        AddressPayload::P2wpkh { pubkey_hash } => {
            (script::script_code_for_p2wpkh(pubkey_hash), true)
        }
        AddressPayload::P2tr { .. }
        | AddressPayload::P2sh { .. }
        | AddressPayload::P2wsh { .. } => return Err(ChainError::UnsupportedSenderType),
    };

    let change_sats = req
        .input_amount_sats
        .checked_sub(req.amount_sats)
        .and_then(|v| v.checked_sub(req.fee_sats))
        .ok_or(ChainError::BadAddress)?;

    let mut outputs = vec![TxOut {
        amount_sats: req.amount_sats,
        script_pubkey: recipient_script_pubkey(&req.recipient),
    }];
    if change_sats >= DUST_THRESHOLD_SATS {
        outputs.push(TxOut {
            amount_sats: change_sats,
            script_pubkey: match &req.sender.payload {
                AddressPayload::P2pkh { pubkey_hash } => script::p2pkh_script_pubkey(pubkey_hash),
                AddressPayload::P2wpkh { pubkey_hash } => script::p2wpkh_script_pubkey(pubkey_hash),
                _ => unreachable!("sender kind already validated above"),
            },
        });
    }

    let inputs = vec![TxIn {
        prevout_txid: req.prevout_txid,
        prevout_vout: req.prevout_vout,
        script_sig: Vec::new(),
        sequence: 0xffff_ffff,
        witness: Vec::new(),
    }];

    let transaction = Transaction {
        version: 2,
        inputs,
        outputs,
        locktime: 0,
    };

    let message_hash = if is_witness {
        sighash::bip143_sighash(
            transaction.version,
            &transaction.inputs,
            &transaction.outputs,
            transaction.locktime,
            0,
            &script_code,
            req.input_amount_sats,
            SIGHASH_ALL,
        )
    } else {
        sighash::legacy_sighash(
            transaction.version,
            &transaction.inputs,
            &transaction.outputs,
            transaction.locktime,
            0,
            &script_code,
            SIGHASH_ALL,
        )
    };

    Ok(UnsignedSpend {
        message_hash,
        transaction,
        script_code,
        input_amount_sats: req.input_amount_sats,
        is_witness,
    })
}

/// Splices a produced `(r, s)` signature and the signer's compressed
/// pubkey into `unsigned`, returning the final consensus-serialized
/// transaction (spec §6: legacy scriptSig, or empty scriptSig + 2-item
/// witness stack for P2WPKH).
pub fn finalize_spend(
    mut unsigned: Transaction,
    is_witness: bool,
    r: &gv_curve::Scalar,
    s: &gv_curve::Scalar,
    pubkey: &Point,
) -> Transaction {
    let der = sighash::encode_der(r, s);
    let compressed = pubkey.to_compressed();

    if is_witness {
        unsigned.inputs[0].script_sig = Vec::new();
        let mut sig_with_type = der;
        sig_with_type.push(SIGHASH_ALL);
        unsigned.inputs[0].witness = vec![sig_with_type, compressed.to_vec()];
    } else {
        unsigned.inputs[0].script_sig =
            script::p2pkh_script_sig(&der, SIGHASH_ALL, &compressed);
    }
    unsigned
}

#[cfg(test)]
mod tests {
    use super::*;
    use gv_curve::Scalar;

    fn zero_address_p2pkh() -> Address {
        Address {
            network: Network::Regtest,
            payload: AddressPayload::P2pkh {
                pubkey_hash: [0u8; 20],
            },
        }
    }

    #[test]
    fn p2tr_sender_is_rejected() {
        let req = SpendRequest {
            prevout_txid: [0x0a; 32],
            prevout_vout: 0,
            input_amount_sats: 100_000_000,
            sender: Address {
                network: Network::Regtest,
                payload: AddressPayload::P2tr {
                    output_key: [0x01; 32],
                },
            },
            sender_pubkey: Point::from_scalar(&Scalar::from_u64(1)),
            recipient: zero_address_p2pkh(),
            amount_sats: 50_000_000,
            fee_sats: 10_000,
        };
        assert_eq!(
            build_unsigned_spend(&req).unwrap_err(),
            ChainError::UnsupportedSenderType
        );
    }

    #[test]
    fn dust_change_is_omitted() {
        let req = SpendRequest {
            prevout_txid: [0x0a; 32],
            prevout_vout: 0,
            input_amount_sats: 100_000_000,
            sender: Address {
                network: Network::Regtest,
                payload: AddressPayload::P2pkh {
                    pubkey_hash: [0x01; 20],
                },
            },
            sender_pubkey: Point::from_scalar(&Scalar::from_u64(1)),
            recipient: zero_address_p2pkh(),
            amount_sats: 99_999_500,
            fee_sats: 400,
        };
        let unsigned = build_unsigned_spend(&req).unwrap();
        assert_eq!(unsigned.transaction.outputs.len(), 1);
    }

    #[test]
    fn sighash_is_reproducible_byte_exact() {
        let req = SpendRequest {
            prevout_txid: [0x0a; 32],
            prevout_vout: 0,
            input_amount_sats: 100_000_000,
            sender: zero_address_p2pkh(),
            sender_pubkey: Point::from_scalar(&Scalar::from_u64(1)),
            recipient: zero_address_p2pkh(),
            amount_sats: 50_000_000,
            fee_sats: 10_000,
        };
        let first = build_unsigned_spend(&req).unwrap();
        let bytes = first.transaction.serialize();
        let decoded = Transaction::deserialize(&bytes).unwrap();

        let replayed_hash = sighash::legacy_sighash(
            decoded.version,
            &decoded.inputs,
            &decoded.outputs,
            decoded.locktime,
            0,
            &first.script_code,
            SIGHASH_ALL,
        );
        assert_eq!(first.message_hash, replayed_hash);
    }
}
