//! The guardian-side half of a signing ceremony: the one process that
//! actually holds a `Share` and the only place `k_i` ever lives (spec §9,
//! design note on the round-1 trust boundary).
//!
//! `gv-coordinator` drives the ceremony from the *other* side — it never
//! imports this module, and nothing in `rounds.rs` requires it either.
//! This is purely the client shape a guardian process wraps around those
//! pure functions, mirroring how the teacher's `client/key_store_api.rs`
//! separates "where are my keys" from the ceremony math itself.

use gv_curve::Scalar;
use gv_primitives::TransactionId;
use gv_shares::Share;
use rand::RngCore;

use crate::rounds::{self, Round1Output};

/// Where a guardian process keeps its address-level shares between
/// restarts. Mirrors the teacher's `KeyStoreAPI` trait shape
/// (`get_key`/`set_key`), specialized to this workspace's single
/// `Share` type instead of a `KeygenResultInfo` keyed by `KeyId`.
pub trait KeyStore: Send + Sync {
    /// Looks up the share a guardian must use to sign for `vault_share_id`
    /// (the address-level share derived once per signing request).
    fn get_share(&self, vault_share_id: &str) -> Option<Share>;

    /// Persists a newly-derived address-level share.
    fn put_share(&mut self, vault_share_id: String, share: Share);
}

/// An in-memory `KeyStore`, used by tests and by single-process
/// demonstrations; a real guardian process backs this with disk-resident,
/// encrypted storage instead.
#[derive(Default)]
pub struct InMemoryKeyStore(std::collections::HashMap<String, Share>);

impl KeyStore for InMemoryKeyStore {
    fn get_share(&self, vault_share_id: &str) -> Option<Share> {
        self.0.get(vault_share_id).cloned()
    }

    fn put_share(&mut self, vault_share_id: String, share: Share) {
        self.0.insert(vault_share_id, share);
    }
}

/// One guardian's in-flight participation in a single transaction's
/// ceremony: the nonce drawn in round 1, kept only in this process, never
/// sent to the coordinator (only `commitment` is).
pub struct ActiveRound1 {
    pub transaction_id: TransactionId,
    pub nonce: Scalar,
}

/// Runs round 1 for one guardian: draw `k_i`, commit to `R_i = k_i * G`.
/// The caller publishes `commitment` to the coordinator and keeps
/// `ActiveRound1` (specifically `nonce`) local until round 3.
pub fn generate_round1(
    transaction_id: TransactionId,
    rng: &mut impl RngCore,
) -> (ActiveRound1, Round1Output) {
    let output = rounds::round1_generate_nonce(rng);
    let active = ActiveRound1 { transaction_id, nonce: output.nonce.clone() };
    (active, output)
}

/// Combines this guardian's own round-1 nonce with every other guardian's,
/// exchanged directly peer-to-peer and never routed through the
/// coordinator, into the joint nonce `k = Sum(k_i)` that round 3 needs
/// (spec §4.4). This is the guardian-side mirror of
/// `rounds::round2_combine_commitments`: the coordinator aggregates the
/// public `R_i` into `R`/`r`; guardians separately aggregate the private
/// `k_i` into `k` among themselves, so the coordinator never observes any
/// nonce, individual or joint (spec §9 — the documented fix to the
/// source's "coordinator sees every `k_i`" design).
pub fn join_nonce(own_nonce: &Scalar, peer_nonces: &[Scalar]) -> Scalar {
    peer_nonces.iter().fold(own_nonce.clone(), |acc, k| acc.add(k))
}

/// Runs round 3 for one guardian, given the coordinator's round-2
/// broadcast (`r`, `message_hash`) and the joint nonce `k` this guardian
/// has already assembled via [`join_nonce`], plus its address-level share.
/// This is the only function that ever touches `Share::secret` outside of
/// `gv-shares`'s derivation helpers.
pub fn compute_round3(
    joint_nonce: &Scalar,
    r: &Scalar,
    message_hash: &Scalar,
    share: &Share,
) -> Result<Scalar, crate::ceremony::InvalidContributionReason> {
    rounds::round3_compute_signature_share(
        joint_nonce,
        r,
        message_hash,
        &share.secret,
        share.total_parties,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use gv_curve::Point;
    use gv_shares::ShareTag;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn key_store_round_trips_a_share() {
        let mut store = InMemoryKeyStore::default();
        let share = Share {
            party_id: 1,
            secret: Scalar::from_u64(7),
            total_parties: 3,
            threshold: 3,
            tag: ShareTag::Derived,
        };
        store.put_share("addr-0".to_string(), share.clone());
        let fetched = store.get_share("addr-0").unwrap();
        assert_eq!(fetched.secret, share.secret);
        assert!(store.get_share("addr-1").is_none());
    }

    #[test]
    fn guardian_round1_then_round3_matches_pure_rounds() {
        let mut rng = StdRng::seed_from_u64(21);
        let tx_id = TransactionId::new();
        let (active, r1) = generate_round1(tx_id, &mut rng);

        let share = Share {
            party_id: 1,
            secret: Scalar::from_u64(9),
            total_parties: 1,
            threshold: 1,
            tag: ShareTag::Derived,
        };
        let r = Point::from_scalar(&active.nonce).x_scalar();
        let z = Scalar::from_bytes_mod_order(b"a message digest for this test!");

        // Single-guardian vault: the joint nonce is just this guardian's own.
        let joint_nonce = join_nonce(&active.nonce, &[]);
        let s_i = compute_round3(&joint_nonce, &r, &z, &share).unwrap();
        let expected = rounds::round3_compute_signature_share(
            &active.nonce,
            &r,
            &z,
            &share.secret,
            1,
        )
        .unwrap();
        assert_eq!(s_i, expected);
        assert_eq!(r1.commitment, Point::from_scalar(&active.nonce));
    }

    #[test]
    fn join_nonce_is_order_independent_and_matches_manual_sum() {
        let mut rng = StdRng::seed_from_u64(22);
        let tx_id = TransactionId::new();
        let (a1, _) = generate_round1(tx_id, &mut rng);
        let (a2, _) = generate_round1(tx_id, &mut rng);
        let (a3, _) = generate_round1(tx_id, &mut rng);

        let expected = a1.nonce.add(&a2.nonce).add(&a3.nonce);

        // Every guardian computes the same joint k regardless of which
        // nonce it calls "its own" and which two it received from peers.
        let from_party_1 = join_nonce(&a1.nonce, &[a2.nonce.clone(), a3.nonce.clone()]);
        let from_party_2 = join_nonce(&a2.nonce, &[a3.nonce.clone(), a1.nonce.clone()]);
        assert_eq!(from_party_1, expected);
        assert_eq!(from_party_2, expected);
    }
}
