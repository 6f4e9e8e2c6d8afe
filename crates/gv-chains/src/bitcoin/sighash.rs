//! Legacy and BIP143 sighash computation, and DER signature encoding
//! (spec §4.3, testable properties 3 and 5).

use gv_curve::{double_sha256, Scalar};

use super::script::write_varint;
use super::tx::{TxIn, TxOut};

pub const SIGHASH_ALL: u8 = 0x01;

/// Legacy (pre-SegWit) sighash: double-SHA256 of the transaction with the
/// scriptCode spliced into the signed input and every other input's
/// scriptSig blanked.
pub fn legacy_sighash(
    version: u32,
    inputs: &[TxIn],
    outputs: &[TxOut],
    locktime: u32,
    signing_input_index: usize,
    script_code: &[u8],
    sighash_type: u8,
) -> [u8; 32] {
    let mut preimage = Vec::new();
    preimage.extend_from_slice(&version.to_le_bytes());

    write_varint(&mut preimage, inputs.len() as u64);
    for (i, input) in inputs.iter().enumerate() {
        preimage.extend_from_slice(&input.prevout_txid);
        preimage.extend_from_slice(&input.prevout_vout.to_le_bytes());
        let script = if i == signing_input_index { script_code } else { &[] };
        write_varint(&mut preimage, script.len() as u64);
        preimage.extend_from_slice(script);
        preimage.extend_from_slice(&input.sequence.to_le_bytes());
    }

    write_varint(&mut preimage, outputs.len() as u64);
    for output in outputs {
        preimage.extend_from_slice(&output.amount_sats.to_le_bytes());
        write_varint(&mut preimage, output.script_pubkey.len() as u64);
        preimage.extend_from_slice(&output.script_pubkey);
    }

    preimage.extend_from_slice(&locktime.to_le_bytes());
    preimage.extend_from_slice(&(sighash_type as u32).to_le_bytes());

    double_sha256(&preimage)
}

/// BIP143 sighash for a P2WPKH input: `version || hashPrevouts ||
/// hashSequence || outpoint || scriptCode || amount || sequence ||
/// hashOutputs || locktime || sighash_type`.
pub fn bip143_sighash(
    version: u32,
    inputs: &[TxIn],
    outputs: &[TxOut],
    locktime: u32,
    signing_input_index: usize,
    script_code: &[u8],
    input_amount_sats: u64,
    sighash_type: u8,
) -> [u8; 32] {
    let hash_prevouts = {
        let mut buf = Vec::new();
        for input in inputs {
            buf.extend_from_slice(&input.prevout_txid);
            buf.extend_from_slice(&input.prevout_vout.to_le_bytes());
        }
        double_sha256(&buf)
    };
    let hash_sequence = {
        let mut buf = Vec::new();
        for input in inputs {
            buf.extend_from_slice(&input.sequence.to_le_bytes());
        }
        double_sha256(&buf)
    };
    let hash_outputs = {
        let mut buf = Vec::new();
        for output in outputs {
            buf.extend_from_slice(&output.amount_sats.to_le_bytes());
            write_varint(&mut buf, output.script_pubkey.len() as u64);
            buf.extend_from_slice(&output.script_pubkey);
        }
        double_sha256(&buf)
    };

    let signing_input = &inputs[signing_input_index];
    let mut preimage = Vec::new();
    preimage.extend_from_slice(&version.to_le_bytes());
    preimage.extend_from_slice(&hash_prevouts);
    preimage.extend_from_slice(&hash_sequence);
    preimage.extend_from_slice(&signing_input.prevout_txid);
    preimage.extend_from_slice(&signing_input.prevout_vout.to_le_bytes());
    write_varint(&mut preimage, script_code.len() as u64);
    preimage.extend_from_slice(script_code);
    preimage.extend_from_slice(&input_amount_sats.to_le_bytes());
    preimage.extend_from_slice(&signing_input.sequence.to_le_bytes());
    preimage.extend_from_slice(&hash_outputs);
    preimage.extend_from_slice(&locktime.to_le_bytes());
    preimage.extend_from_slice(&(sighash_type as u32).to_le_bytes());

    double_sha256(&preimage)
}

/// Encodes `(r, s)` as a DER signature, stripping leading zero bytes and
/// re-prefixing with `0x00` when the high bit is set (so DER integers are
/// never mistaken for negative). Callers must already have normalized `s`
/// to the low-S form (spec §4.3) — this function does not re-check it.
pub fn encode_der(r: &Scalar, s: &Scalar) -> Vec<u8> {
    let r_bytes = der_integer_bytes(&r.to_be_bytes());
    let s_bytes = der_integer_bytes(&s.to_be_bytes());

    let mut body = Vec::new();
    body.push(0x02);
    body.push(r_bytes.len() as u8);
    body.extend_from_slice(&r_bytes);
    body.push(0x02);
    body.push(s_bytes.len() as u8);
    body.extend_from_slice(&s_bytes);

    let mut out = Vec::with_capacity(body.len() + 2);
    out.push(0x30);
    out.push(body.len() as u8);
    out.extend_from_slice(&body);
    out
}

fn der_integer_bytes(be: &[u8; 32]) -> Vec<u8> {
    let mut trimmed: &[u8] = be;
    while trimmed.len() > 1 && trimmed[0] == 0 {
        trimmed = &trimmed[1..];
    }
    if trimmed[0] & 0x80 != 0 {
        let mut out = Vec::with_capacity(trimmed.len() + 1);
        out.push(0x00);
        out.extend_from_slice(trimmed);
        out
    } else {
        trimmed.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn der_strips_leading_zeros() {
        let r = Scalar::from_u64(5);
        let s = Scalar::from_u64(7);
        let der = encode_der(&r, &s);
        assert_eq!(der[0], 0x30);
        // integers 5 and 7 each encode to a single byte.
        assert_eq!(der[2], 0x02);
        assert_eq!(der[3], 1);
        assert_eq!(der[4], 5);
    }

    #[test]
    fn der_high_bit_gets_zero_prefix() {
        let mut bytes = [0u8; 32];
        bytes[31] = 0x80;
        let r = Scalar::from_be_bytes(&bytes).unwrap();
        let s = Scalar::from_u64(1);
        let der = encode_der(&r, &s);
        // r's encoded length should be 2 (0x00 prefix + 0x80 byte).
        assert_eq!(der[2], 0x02);
        assert_eq!(der[3], 2);
        assert_eq!(der[4], 0x00);
        assert_eq!(der[5], 0x80);
    }
}
