//! Distributed BIP32 derivation over additive shares (spec §4.2).
//!
//! Hardened derivation needs every guardian (it tweaks the *private*
//! share); non-hardened derivation needs only the account xpub and each
//! guardian's own share, so address enumeration after the one-time
//! hardened setup requires no guardian interaction at all.
//!
//! **Chain-code scheme.** The source this spec was distilled from derives
//! a hardened child's chain code from "the first party's HMAC output" —
//! not a well-defined distributed computation, since it depends on a
//! private input no other party can recompute identically without seeing
//! it (see spec §9). This module instead uses
//! [`HardenedDerivationScheme::ChainCodeFromParentXpub`]: the child chain
//! code is `HMAC-SHA512(parent_chain_code, 0x01 || parent_pubkey ||
//! index_be)[32..]`, a function of already-public values that every party
//! (and the coordinator) computes identically without any private input.

use gv_curve::{hmac_sha512, hash160, Point, Scalar};
use serde::{Deserialize, Serialize};

use crate::share::{Share, ShareTag};

pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// BIP32 extended public key: a public key plus a chain code, enabling
/// deterministic derivation of descendant public keys without any secret
/// material (spec §3).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedPublicKey {
    pub pubkey: [u8; 33],
    pub chain_code: [u8; 32],
    pub depth: u8,
    pub parent_fingerprint: [u8; 4],
    pub child_number: u32,
}

impl ExtendedPublicKey {
    pub fn root(pubkey: Point, chain_code: [u8; 32]) -> Self {
        ExtendedPublicKey {
            pubkey: pubkey.to_compressed(),
            chain_code,
            depth: 0,
            parent_fingerprint: [0; 4],
            child_number: 0,
        }
    }

    pub fn pubkey_point(&self) -> Point {
        Point::from_bytes(&self.pubkey).expect("xpub was constructed from a valid point")
    }

    pub fn fingerprint(&self) -> [u8; 4] {
        let hash = hash160(&self.pubkey);
        [hash[0], hash[1], hash[2], hash[3]]
    }

    /// Derives the child xpub at a non-hardened `index` (spec §4.2). Pure
    /// function of public data; any party (or the coordinator) can call
    /// this to enumerate receive/change addresses.
    pub fn derive_non_hardened(&self, index: u32) -> (ExtendedPublicKey, Scalar) {
        assert!(index < HARDENED_OFFSET, "index must be non-hardened");
        let (tweak, child_chain_code) =
            non_hardened_tweak(&self.pubkey, &self.chain_code, index);
        let child_pubkey = self.pubkey_point().add(&Point::from_scalar(&tweak));
        (
            ExtendedPublicKey {
                pubkey: child_pubkey.to_compressed(),
                chain_code: child_chain_code,
                depth: self.depth + 1,
                parent_fingerprint: self.fingerprint(),
                child_number: index,
            },
            tweak,
        )
    }
}

/// BIP32/44 derivation path, e.g. `m/44'/0'/0'/0/0`. Apostrophe marks a
/// hardened index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DerivationPath(pub Vec<u32>);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PathError {
    #[error("derivation path must start with 'm'")]
    MissingRoot,
    #[error("invalid path component: {0:?}")]
    InvalidComponent(String),
}

impl std::str::FromStr for DerivationPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('/');
        if parts.next() != Some("m") {
            return Err(PathError::MissingRoot);
        }
        let mut indices = Vec::new();
        for part in parts {
            let (number, hardened) = match part.strip_suffix('\'').or_else(|| part.strip_suffix('h')) {
                Some(stripped) => (stripped, true),
                None => (part, false),
            };
            let value: u32 = number
                .parse()
                .map_err(|_| PathError::InvalidComponent(part.to_string()))?;
            if hardened {
                indices.push(value | HARDENED_OFFSET);
            } else {
                indices.push(value);
            }
        }
        Ok(DerivationPath(indices))
    }
}

impl std::fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "m")?;
        for index in &self.0 {
            if index & HARDENED_OFFSET != 0 {
                write!(f, "/{}'", index & !HARDENED_OFFSET)?;
            } else {
                write!(f, "/{index}")?;
            }
        }
        Ok(())
    }
}

/// Local, same-at-every-party computation of `k_master_tweak` and the
/// master chain code from the shared seed (`HMAC-SHA512("Bitcoin seed",
/// seed)`, spec §4.2).
pub fn master_tweak_and_chain_code(seed: &[u8]) -> (Scalar, [u8; 32]) {
    let output = hmac_sha512(b"Bitcoin seed", seed);
    let tweak = Scalar::from_bytes_mod_order(&output[..32]);
    let mut chain_code = [0u8; 32];
    chain_code.copy_from_slice(&output[32..]);
    (tweak, chain_code)
}

/// Adds the master tweak to every party's existing share — identical at
/// every party, preserving the additive invariant (spec §4.2).
pub fn derive_master_shares(shares: &[Share], seed: &[u8]) -> (Vec<Share>, [u8; 32]) {
    let (tweak, chain_code) = master_tweak_and_chain_code(seed);
    let master_shares = shares
        .iter()
        .map(|s| s.with_added_tweak(&tweak, ShareTag::Master))
        .collect();
    (master_shares, chain_code)
}

/// This guardian's hardened-child tweak, computed from its own share only
/// (spec §4.2): `HMAC-SHA512(parent_chain_code, 0x00 || secret_i ||
/// index_be)`, keeping the first half as the tweak. The second half is
/// deliberately discarded here — see [`hardened_child_chain_code`] for why.
pub fn hardened_tweak_for_party(parent_chain_code: &[u8; 32], secret: &Scalar, index: u32) -> Scalar {
    let index = index | HARDENED_OFFSET;
    let mut data = Vec::with_capacity(1 + 32 + 4);
    data.push(0x00);
    data.extend_from_slice(&secret.to_be_bytes());
    data.extend_from_slice(&index.to_be_bytes());
    let output = hmac_sha512(parent_chain_code, &data);
    Scalar::from_bytes_mod_order(&output[..32])
}

/// The canonical hardened-child chain code: a function of the parent's
/// already-public xpub and the child index, so every guardian (and the
/// coordinator) computes the identical value without needing any party's
/// private share (spec §4.2, §9 — this is the documented resolution of
/// the source's "first party's share" shortcut).
pub fn hardened_child_chain_code(parent_chain_code: &[u8; 32], parent_pubkey: &[u8; 33], index: u32) -> [u8; 32] {
    let index = index | HARDENED_OFFSET;
    let mut data = Vec::with_capacity(1 + 33 + 4);
    data.push(0x01);
    data.extend_from_slice(parent_pubkey);
    data.extend_from_slice(&index.to_be_bytes());
    let output = hmac_sha512(parent_chain_code, &data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&output[32..]);
    out
}

/// Full distributed hardened-child derivation given every guardian's
/// share in one process (used by setup tooling / tests that simulate all
/// `n` guardians cooperating; a real guardian calls
/// [`hardened_tweak_for_party`] locally and never sees another party's
/// share).
pub fn derive_hardened_child_distributed(
    shares: &[Share],
    parent_pubkey: &ExtendedPublicKey,
    index: u32,
) -> (Vec<Share>, ExtendedPublicKey) {
    let mut aggregate_tweak_point = Point::infinity();
    let mut child_shares = Vec::with_capacity(shares.len());

    for share in shares {
        let tweak = hardened_tweak_for_party(&parent_pubkey.chain_code, &share.secret, index);
        aggregate_tweak_point = aggregate_tweak_point.add(&Point::from_scalar(&tweak));
        child_shares.push(share.with_added_tweak(&tweak, ShareTag::Account));
    }

    let child_pubkey = parent_pubkey.pubkey_point().add(&aggregate_tweak_point);
    let child_chain_code =
        hardened_child_chain_code(&parent_pubkey.chain_code, &parent_pubkey.pubkey, index);

    (
        child_shares,
        ExtendedPublicKey {
            pubkey: child_pubkey.to_compressed(),
            chain_code: child_chain_code,
            depth: parent_pubkey.depth + 1,
            parent_fingerprint: parent_pubkey.fingerprint(),
            child_number: index | HARDENED_OFFSET,
        },
    )
}

/// The BIP32 tweak `T` for a non-hardened child, a function of public
/// inputs only (spec §4.2): `HMAC-SHA512(parent_chain_code, parent_pubkey
/// || index_be)`.
pub fn non_hardened_tweak(parent_pubkey: &[u8; 33], parent_chain_code: &[u8; 32], index: u32) -> (Scalar, [u8; 32]) {
    assert!(index < HARDENED_OFFSET, "index must be non-hardened");
    let mut data = Vec::with_capacity(33 + 4);
    data.extend_from_slice(parent_pubkey);
    data.extend_from_slice(&index.to_be_bytes());
    let output = hmac_sha512(parent_chain_code, &data);
    let tweak = Scalar::from_bytes_mod_order(&output[..32]);
    let mut chain_code = [0u8; 32];
    chain_code.copy_from_slice(&output[32..]);
    (tweak, chain_code)
}

/// This guardian's address-level share for non-hardened index `i`: its
/// hardened-account share plus `T/n` (spec §4.2), where `n` is the total
/// number of guardians and `1/n` is its modular inverse mod the curve
/// order. Purely local — no guardian interaction needed.
pub fn derive_non_hardened_child_share(share: &Share, tweak: &Scalar) -> Share {
    let parties_inv = Scalar::from_u64(share.total_parties as u64)
        .invert()
        .expect("total_parties is a small positive integer, coprime to the curve order");
    let per_party_tweak = tweak.mul(&parties_inv);
    share.with_added_tweak(&per_party_tweak, ShareTag::Derived)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::share::generate_shares;
    use rand::{rngs::StdRng, SeedableRng};

    fn root_xpub_and_shares(n: u32, seed: &[u8]) -> (Vec<Share>, ExtendedPublicKey) {
        let mut rng = StdRng::seed_from_u64(99);
        let (shares, _) = generate_shares(n, &mut rng);
        let (master_shares, chain_code) = derive_master_shares(&shares, seed);
        let master_pubkey = crate::share::aggregate_public_key(&master_shares);
        (master_shares, ExtendedPublicKey::root(master_pubkey, chain_code))
    }

    #[test]
    fn hardened_derivation_preserves_share_sum_invariant() {
        let (shares, root_xpub) = root_xpub_and_shares(4, &[0u8; 32]);
        let (child_shares, child_xpub) = derive_hardened_child_distributed(&shares, &root_xpub, 44);
        assert_eq!(
            crate::share::aggregate_public_key(&child_shares),
            child_xpub.pubkey_point()
        );
    }

    #[test]
    fn non_hardened_derivation_is_consistent_with_xpub() {
        let (shares, root_xpub) = root_xpub_and_shares(3, &[1u8; 32]);
        let (account_shares, account_xpub) = derive_hardened_child_distributed(&shares, &root_xpub, 0);

        let (child_xpub, tweak) = account_xpub.derive_non_hardened(5);
        let derived_shares: Vec<Share> = account_shares
            .iter()
            .map(|s| derive_non_hardened_child_share(s, &tweak))
            .collect();

        assert_eq!(
            crate::share::aggregate_public_key(&derived_shares),
            child_xpub.pubkey_point()
        );
    }

    #[test]
    fn derivation_path_parses_and_renders() {
        let path: DerivationPath = "m/44'/0'/0'/0/5".parse().unwrap();
        assert_eq!(path.0, vec![44 | HARDENED_OFFSET, 0 | HARDENED_OFFSET, 0 | HARDENED_OFFSET, 0, 5]);
        assert_eq!(path.to_string(), "m/44'/0'/0'/0/5");
    }

    #[test]
    fn chain_code_scheme_does_not_depend_on_any_single_share() {
        let (shares, root_xpub) = root_xpub_and_shares(3, &[2u8; 32]);
        let mut reordered = shares.clone();
        reordered.reverse();
        let (_, child_a) = derive_hardened_child_distributed(&shares, &root_xpub, 7);
        let (_, child_b) = derive_hardened_child_distributed(&reordered, &root_xpub, 7);
        assert_eq!(child_a.chain_code, child_b.chain_code);
    }
}
