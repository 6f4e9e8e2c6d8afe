//! scriptPubKey / scriptSig synthesis and the varint encoder shared by
//! `tx.rs` and `sighash.rs`.

const OP_DUP: u8 = 0x76;
const OP_HASH160: u8 = 0xa9;
const OP_EQUALVERIFY: u8 = 0x88;
const OP_CHECKSIG: u8 = 0xac;
const OP_0: u8 = 0x00;
const OP_1: u8 = 0x51;

/// Bitcoin's variable-length integer ("compact size") encoding, used ahead
/// of every scriptSig/scriptPubKey and before tx input/output counts.
pub fn write_varint(out: &mut Vec<u8>, n: u64) {
    if n < 0xfd {
        out.push(n as u8);
    } else if n <= 0xffff {
        out.push(0xfd);
        out.extend_from_slice(&(n as u16).to_le_bytes());
    } else if n <= 0xffff_ffff {
        out.push(0xfe);
        out.extend_from_slice(&(n as u32).to_le_bytes());
    } else {
        out.push(0xff);
        out.extend_from_slice(&n.to_le_bytes());
    }
}

fn push_data(out: &mut Vec<u8>, data: &[u8]) {
    // Only direct-push opcodes (<= 75 bytes) are needed: signatures and
    // compressed pubkeys both fit comfortably under that limit.
    assert!(data.len() <= 75, "push_data only supports direct pushes");
    out.push(data.len() as u8);
    out.extend_from_slice(data);
}

/// `OP_DUP OP_HASH160 <hash> OP_EQUALVERIFY OP_CHECKSIG`.
pub fn p2pkh_script_pubkey(pubkey_hash: &[u8; 20]) -> Vec<u8> {
    let mut out = Vec::with_capacity(25);
    out.push(OP_DUP);
    out.push(OP_HASH160);
    push_data(&mut out, pubkey_hash);
    out.push(OP_EQUALVERIFY);
    out.push(OP_CHECKSIG);
    out
}

/// `OP_0 <20-byte-program>`, both for scriptPubKey and for BIP143's
/// `scriptCode` (which is the P2PKH-equivalent script of the program, per
/// spec §4.3 — callers needing the scriptCode use [`p2pkh_script_pubkey`]
/// on the same hash instead).
pub fn p2wpkh_script_pubkey(pubkey_hash: &[u8; 20]) -> Vec<u8> {
    let mut out = Vec::with_capacity(22);
    out.push(OP_0);
    push_data(&mut out, pubkey_hash);
    out
}

pub fn p2wsh_script_pubkey(script_hash: &[u8; 32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(34);
    out.push(OP_0);
    push_data(&mut out, script_hash);
    out
}

/// `OP_1 <32-byte-output-key>`.
pub fn p2tr_script_pubkey(output_key: &[u8; 32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(34);
    out.push(OP_1);
    push_data(&mut out, output_key);
    out
}

pub fn p2sh_script_pubkey(script_hash: &[u8; 20]) -> Vec<u8> {
    let mut out = Vec::with_capacity(23);
    out.push(OP_HASH160);
    push_data(&mut out, script_hash);
    out.push(0x87); // OP_EQUAL
    out
}

/// BIP143's `scriptCode` for a P2WPKH input is the ordinary P2PKH script of
/// the same pubkey hash, not the witness-program scriptPubKey itself.
pub fn script_code_for_p2wpkh(pubkey_hash: &[u8; 20]) -> Vec<u8> {
    p2pkh_script_pubkey(pubkey_hash)
}

/// `push(sig||sighash_type) || push(pubkey)`, the legacy/P2WPKH scriptSig
/// and witness-stack item layout (spec §4.3).
pub fn p2pkh_script_sig(der_sig: &[u8], sighash_type: u8, compressed_pubkey: &[u8; 33]) -> Vec<u8> {
    let mut sig_with_type = der_sig.to_vec();
    sig_with_type.push(sighash_type);
    let mut out = Vec::new();
    push_data(&mut out, &sig_with_type);
    push_data(&mut out, compressed_pubkey);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varint_boundaries() {
        let mut out = Vec::new();
        write_varint(&mut out, 0xfc);
        assert_eq!(out, vec![0xfc]);

        let mut out = Vec::new();
        write_varint(&mut out, 0xfd);
        assert_eq!(out, vec![0xfd, 0xfd, 0x00]);

        let mut out = Vec::new();
        write_varint(&mut out, 0x1_0000);
        assert_eq!(out, vec![0xfe, 0x00, 0x00, 0x01, 0x00]);
    }

    #[test]
    fn p2pkh_script_is_25_bytes() {
        assert_eq!(p2pkh_script_pubkey(&[0u8; 20]).len(), 25);
    }

    #[test]
    fn p2wpkh_script_code_matches_p2pkh() {
        let hash = [0x42u8; 20];
        assert_eq!(script_code_for_p2wpkh(&hash), p2pkh_script_pubkey(&hash));
    }
}
