use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use gv_curve::{Point, Scalar};

/// What level of the derivation tree a share belongs to. Stored alongside
/// the share so a guardian's key store can tell master, account and
/// address-level shares apart (spec §3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShareTag {
    Master,
    Account,
    Derived,
}

/// One guardian's additive secret share for one derivation level.
///
/// Invariant: the set of all `total_parties` shares at the same derivation
/// level sums to the level's private key mod the curve order (spec §3).
/// `secret` is zeroized on drop; `Debug`/`Serialize` never reveal it in the
/// clear — only `ShareExport` (hex, used solely for guardian-local
/// persistence) does.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Share {
    #[zeroize(skip)]
    pub party_id: u32,
    pub secret: Scalar,
    #[zeroize(skip)]
    pub total_parties: u32,
    #[zeroize(skip)]
    pub threshold: u32,
    #[zeroize(skip)]
    pub tag: ShareTag,
}

impl std::fmt::Debug for Share {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Share")
            .field("party_id", &self.party_id)
            .field("secret", &"REDACTED")
            .field("total_parties", &self.total_parties)
            .field("threshold", &self.threshold)
            .field("tag", &self.tag)
            .finish()
    }
}

impl Share {
    /// `self.secret * G`, this party's public contribution. Safe to
    /// publish; does not reveal `secret`.
    pub fn public_contribution(&self) -> Point {
        Point::from_scalar(&self.secret)
    }

    /// Returns a new share with `tweak` added to the secret (mod n), used
    /// by every derivation step in `bip32`. `tag` is updated to reflect
    /// the new level.
    pub fn with_added_tweak(&self, tweak: &Scalar, tag: ShareTag) -> Share {
        Share {
            party_id: self.party_id,
            secret: self.secret.add(tweak),
            total_parties: self.total_parties,
            threshold: self.threshold,
            tag,
        }
    }
}

/// Generates `n` additive shares of a fresh random master key: `n-1`
/// uniform shares plus a final share chosen so the sum equals the master
/// scalar (spec §4.2). Returns the shares and the master public key
/// `k*G`, which equals `Sum(secret_i)*G`.
pub fn generate_shares(total_parties: u32, rng: &mut impl RngCore) -> (Vec<Share>, Point) {
    assert!(total_parties >= 1, "need at least one guardian");

    let master_key = Scalar::random(rng);
    let mut shares = Vec::with_capacity(total_parties as usize);
    let mut running_sum = Scalar::zero();

    for party_id in 1..total_parties {
        let s = Scalar::random(rng);
        running_sum = running_sum.add(&s);
        shares.push(Share {
            party_id,
            secret: s,
            total_parties,
            threshold: total_parties,
            tag: ShareTag::Master,
        });
    }

    let last_share = master_key.sub(&running_sum);
    shares.push(Share {
        party_id: total_parties,
        secret: last_share,
        total_parties,
        threshold: total_parties,
        tag: ShareTag::Master,
    });

    let master_pubkey = Point::from_scalar(&master_key);
    (shares, master_pubkey)
}

/// Reconstructs the aggregate public key from a full set of shares'
/// public contributions, `Sum(secret_i)*G`. Used by tests and by setup
/// tooling to check property 1 (share-sum correctness) — never by
/// production code, which must not bring every share into one process.
pub fn aggregate_public_key(shares: &[Share]) -> Point {
    shares
        .iter()
        .map(Share::public_contribution)
        .fold(Point::infinity(), |acc, p| acc.add(&p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn shares_sum_to_master_pubkey() {
        let mut rng = StdRng::seed_from_u64(42);
        let (shares, master_pubkey) = generate_shares(5, &mut rng);
        assert_eq!(shares.len(), 5);
        assert_eq!(aggregate_public_key(&shares), master_pubkey);
    }

    #[test]
    fn single_party_share_equals_master_key() {
        let mut rng = StdRng::seed_from_u64(1);
        let (shares, master_pubkey) = generate_shares(1, &mut rng);
        assert_eq!(shares.len(), 1);
        assert_eq!(Point::from_scalar(&shares[0].secret), master_pubkey);
    }
}
