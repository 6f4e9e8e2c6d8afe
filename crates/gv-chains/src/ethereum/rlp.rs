//! Thin helpers over the `rlp` crate for the specific field encodings
//! Ethereum transactions need (spec §4.3, testable property 6).

use rlp::{Rlp, RlpStream};

/// Minimal big-endian encoding of a `u64`, with zero encoding to an empty
/// byte string (RLP's canonical rule for integers).
pub fn append_u64(stream: &mut RlpStream, value: u64) {
    append_uint_be(stream, &value.to_be_bytes());
}

/// Appends an arbitrary-precision unsigned integer (e.g. `value` in wei)
/// given as big-endian bytes, stripping leading zeros per RLP's minimal
/// integer rule.
pub fn append_uint_be(stream: &mut RlpStream, be_bytes: &[u8]) {
    let mut trimmed = be_bytes;
    while trimmed.first() == Some(&0) {
        trimmed = &trimmed[1..];
    }
    if trimmed.is_empty() {
        stream.append_empty_data();
    } else {
        stream.append(&trimmed);
    }
}

pub fn decode_list(data: &[u8]) -> Result<Vec<Vec<u8>>, rlp::DecoderError> {
    let rlp = Rlp::new(data);
    rlp.iter().map(|item| item.data().map(|d| d.to_vec())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_of_uints_round_trips() {
        let mut stream = RlpStream::new_list(3);
        append_u64(&mut stream, 0);
        append_u64(&mut stream, 1);
        append_uint_be(&mut stream, &300u32.to_be_bytes());
        let encoded = stream.out();

        let decoded = decode_list(&encoded).unwrap();
        assert_eq!(decoded[0], Vec::<u8>::new());
        assert_eq!(decoded[1], vec![1u8]);
        assert_eq!(decoded[2], vec![0x01, 0x2c]);
    }

    #[test]
    fn empty_string_encodes_to_0x80() {
        let mut stream = RlpStream::new_list(1);
        append_uint_be(&mut stream, &[]);
        let encoded = stream.out();
        assert_eq!(encoded[0], 0xc0 + 1); // one-item list header
        assert_eq!(encoded[1], 0x80); // the empty string itself
        let decoded = decode_list(&encoded).unwrap();
        assert_eq!(decoded[0], Vec::<u8>::new());
    }
}
