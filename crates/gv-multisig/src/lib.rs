//! The four-round threshold ECDSA signing ceremony (spec §4.4).
//!
//! This crate is split the way the teacher splits its multisig crate
//! between "pure ceremony math" and "client-side runtime", but scoped to
//! the one scheme this system actually needs: `n`-of-`n` additive-share
//! ECDSA over secp256k1. The teacher's FROST (Schnorr) ceremony and its
//! multi-curve backends (ed25519, ristretto, Polkadot) are a parallel,
//! non-production path (spec §1) and have no counterpart here.

pub mod ceremony;
pub mod guardian;
pub mod rounds;

pub use ceremony::{InvalidContributionReason, SigningStageName};
pub use rounds::{
    round1_generate_nonce, round2_combine_commitments, round3_compute_signature_share,
    round4_combine_signature_shares, verify_signature, Round1Output, Round2Output, Round4Output,
};
