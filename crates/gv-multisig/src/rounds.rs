//! The four pure round functions of the ECDSA signing ceremony (spec
//! §4.4). Each is a total function of its inputs and never touches I/O —
//! the surrounding ceremony state machine (in `gv-coordinator`) is what
//! decides when each round is ready to run and persists the result inside
//! a compare-and-swap.
//!
//! Round 1 and round 3 run once per guardian, locally, against that
//! guardian's own share; round 2 and round 4 run once per ceremony,
//! against every guardian's published contribution.

use gv_curve::{Point, Scalar};
use rand::RngCore;

use crate::ceremony::InvalidContributionReason;

/// A guardian's round-1 output: `k_i`, kept local forever (except for
/// direct guardian-to-guardian gossip, see [`crate::guardian::join_nonce`]),
/// and `R_i = k_i * G`, the only thing published to the coordinator. The
/// original design also sent `k_i` to the coordinator; this workspace's fix
/// keeps it off the coordinator's wire entirely so it can never reconstruct
/// the joint nonce (spec §9, design note on round-1 trust).
pub struct Round1Output {
    pub nonce: Scalar,
    pub commitment: Point,
}

/// Draws a fresh nonce `k_i` and commits to it as `R_i`. Rejects the
/// vanishing nonce, which would make `R_i` the point at infinity.
pub fn round1_generate_nonce(rng: &mut impl RngCore) -> Round1Output {
    loop {
        let nonce = Scalar::random(rng);
        if nonce.is_zero() {
            continue;
        }
        let commitment = Point::from_scalar(&nonce);
        return Round1Output { nonce, commitment };
    }
}

pub struct Round2Output {
    pub r: Scalar,
    pub aggregate_point: Point,
}

/// Aggregates every guardian's `R_i` into `R = Sum(R_i)` and derives `r =
/// R.x mod n`. The coordinator runs this once, after collecting exactly
/// `signatures_required` commitments (spec §4.5, `execute_round2`).
pub fn round2_combine_commitments(
    commitments: &[Point],
) -> Result<Round2Output, InvalidContributionReason> {
    let aggregate_point = commitments
        .iter()
        .copied()
        .fold(Point::infinity(), |acc, p| acc.add(&p));
    if aggregate_point.is_infinity() {
        return Err(InvalidContributionReason::ZeroNonce);
    }
    let r = aggregate_point.x_scalar();
    if r.is_zero() {
        return Err(InvalidContributionReason::ZeroNonce);
    }
    Ok(Round2Output { r, aggregate_point })
}

/// Each guardian's local signature-share computation:
/// `s_i = k^-1 * (z * n^-1 + r * x_i) mod n`, where `z` is the message
/// digest, `x_i` the guardian's share of the private key at the signing
/// level, and `k` the *joint* nonce `Sum(k_i)` — every guardian must feed
/// in the same `k` here, not its own `k_i` alone, or the `s_i` values
/// don't sum to a signature that verifies (spec §4.4's derivation:
/// `Sum(s_i) = k^-1 * (z + r*x)` only holds for one shared `k`). Guardians
/// obtain that shared `k` via [`crate::guardian::join_nonce`], gossiped
/// directly between guardians rather than routed through the coordinator.
/// `n^-1` here is the modular inverse of the *party count*, not the curve
/// order — it is how the additively-shared digest term is spread evenly
/// across every guardian's share of an n-of-n key (spec §4.4, mirroring
/// the source's `sign_round3_compute_signature_share`).
pub fn round3_compute_signature_share(
    joint_nonce: &Scalar,
    r: &Scalar,
    message_hash: &Scalar,
    party_share: &Scalar,
    total_parties: u32,
) -> Result<Scalar, InvalidContributionReason> {
    let nonce_inv = joint_nonce
        .invert()
        .ok_or(InvalidContributionReason::ZeroNonce)?;
    let parties_inv = Scalar::from_u64(total_parties as u64)
        .invert()
        .expect("total_parties is a small positive integer, never 0 mod n");
    let z_share = message_hash.mul(&parties_inv);
    let s_i = nonce_inv.mul(&z_share.add(&r.mul(party_share)));
    Ok(s_i)
}

pub struct Round4Output {
    pub s: Scalar,
    pub was_normalized: bool,
}

/// Sums every guardian's `s_i`, applies low-S normalization (`s := n - s`
/// if `s > n/2`), and rejects the vanishing signature (spec §4.4,
/// testable property 5).
pub fn round4_combine_signature_shares(
    shares: &[Scalar],
) -> Result<Round4Output, InvalidContributionReason> {
    let mut s = Scalar::zero();
    for share in shares {
        s = s.add(share);
    }
    if s.is_zero() {
        return Err(InvalidContributionReason::ZeroSignature);
    }
    let (s, was_normalized) = if s.is_high() { (s.negate(), true) } else { (s, false) };
    Ok(Round4Output { s, was_normalized })
}

/// Standard ECDSA verification: `u1 = z * s^-1`, `u2 = r * s^-1`,
/// accept iff `(u1*G + u2*Q).x mod n == r` (spec §8, testable property 4).
pub fn verify_signature(q: &Point, message_hash: &Scalar, r: &Scalar, s: &Scalar) -> bool {
    let Some(s_inv) = s.invert() else { return false };
    let u1 = message_hash.mul(&s_inv);
    let u2 = r.mul(&s_inv);
    let point = Point::from_scalar(&u1).add(&q.mul(&u2));
    if point.is_infinity() {
        return false;
    }
    &point.x_scalar() == r
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    /// Runs the full four-round protocol for a small set of additive
    /// shares and returns `(r, s)` plus the joint public key, so each test
    /// can assert whatever property it's checking without repeating the
    /// ceremony plumbing.
    fn run_ceremony(
        shares: &[Scalar],
        message_hash: &Scalar,
        rng: &mut impl RngCore,
    ) -> (Point, Scalar, Scalar) {
        let total_parties = shares.len() as u32;
        let joint_key = shares.iter().fold(Scalar::zero(), |acc, s| acc.add(s));
        let q = Point::from_scalar(&joint_key);

        let round1: Vec<Round1Output> =
            (0..shares.len()).map(|_| round1_generate_nonce(rng)).collect();
        let commitments: Vec<Point> = round1.iter().map(|r| r.commitment).collect();
        let round2 = round2_combine_commitments(&commitments).unwrap();

        // Every guardian gossips k_i directly with its peers (never through
        // the coordinator) and sums them into the same joint k (spec §4.4,
        // §9) before computing its signature share.
        let joint_nonce = round1
            .iter()
            .map(|r1| r1.nonce.clone())
            .reduce(|acc, k| acc.add(&k))
            .unwrap();

        let shares_s3: Vec<Scalar> = shares
            .iter()
            .map(|x_i| {
                round3_compute_signature_share(
                    &joint_nonce,
                    &round2.r,
                    message_hash,
                    x_i,
                    total_parties,
                )
                .unwrap()
            })
            .collect();

        let round4 = round4_combine_signature_shares(&shares_s3).unwrap();
        (q, round2.r, round4.s)
    }

    #[test]
    fn ceremony_produces_a_verifying_low_s_signature() {
        let mut rng = StdRng::seed_from_u64(11);
        let shares = vec![Scalar::from_u64(3), Scalar::from_u64(5), Scalar::from_u64(7)];
        let z = Scalar::from_bytes_mod_order(b"some 32-byte-ish message digest");

        let (q, r, s) = run_ceremony(&shares, &z, &mut rng);
        assert!(verify_signature(&q, &z, &r, &s));
        assert!(!s.is_high());
    }

    #[test]
    fn single_party_ceremony_also_verifies() {
        let mut rng = StdRng::seed_from_u64(12);
        let mut raw_bytes = [0u8; 32];
        rng.fill_bytes(&mut raw_bytes);
        let shares = vec![Scalar::from_bytes_mod_order(&raw_bytes)];
        let z = Scalar::from_bytes_mod_order(b"another message digest value...");

        let (q, r, s) = run_ceremony(&shares, &z, &mut rng);
        assert!(verify_signature(&q, &z, &r, &s));
    }

    #[test]
    fn empty_commitments_are_rejected_as_zero_nonce() {
        let err = round2_combine_commitments(&[]).unwrap_err();
        assert_eq!(err, InvalidContributionReason::ZeroNonce);
    }
}
