//! Transaction codecs for Bitcoin and Ethereum (spec §4.3).
//!
//! Correct sighash computation lives here because it is what every
//! guardian and the coordinator actually sign over; everything else
//! (address decoding, script synthesis, RLP, recovery-id inference) exists
//! in support of computing and later re-deriving that one 32-byte digest.

pub mod bitcoin;
pub mod ethereum;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("address is malformed or uses an unrecognized encoding")]
    BadAddress,
    #[error("spending from a Taproot (P2TR) input requires Schnorr signatures, which this system does not support")]
    UnsupportedSenderType,
    #[error("RLP payload is malformed: {0}")]
    BadRlp(String),
    #[error("integer does not fit in the requested encoding")]
    IntegerOverflow,
}
