//! Additive secret sharing and distributed BIP32 derivation (spec §4.2).

pub mod bip32;
mod share;

pub use bip32::{
    derive_hardened_child_distributed, derive_master_shares, derive_non_hardened_child_share,
    hardened_child_chain_code, hardened_tweak_for_party, master_tweak_and_chain_code,
    non_hardened_tweak, DerivationPath, ExtendedPublicKey, PathError, HARDENED_OFFSET,
};
pub use share::{aggregate_public_key, generate_shares, Share, ShareTag};

use gv_curve::Point;

/// One guardian's view of the BIP44 account-setup ceremony: the three
/// hardened levels `m -> m/44' -> m/44'/coin' -> m/44'/coin'/account'`
/// (spec §4.2), run as a distributed computation across every guardian.
///
/// The last two levels (`/change/index`) are non-hardened and are derived
/// locally per-address via [`ExtendedPublicKey::derive_non_hardened`] and
/// [`derive_non_hardened_child_share`] — no guardian interaction needed
/// once `account_xpub` is known.
pub fn setup_account(
    shares: &[Share],
    seed: &[u8],
    coin_type: u32,
    account: u32,
) -> (Vec<Share>, ExtendedPublicKey) {
    let (master_shares, master_chain_code) = derive_master_shares(shares, seed);
    let master_pubkey = aggregate_public_key(&master_shares);
    let master_xpub = ExtendedPublicKey::root(master_pubkey, master_chain_code);

    let (purpose_shares, purpose_xpub) =
        derive_hardened_child_distributed(&master_shares, &master_xpub, 44);
    let (coin_shares, coin_xpub) =
        derive_hardened_child_distributed(&purpose_shares, &purpose_xpub, coin_type);
    derive_hardened_child_distributed(&coin_shares, &coin_xpub, account)
}

/// Enumerates the receive (`change = 0`) or change (`change = 1`) address
/// at `index`, returning the address-level public key and each guardian's
/// corresponding address-level share. Purely local given `account_shares`
/// and `account_xpub` — the defining property of non-hardened derivation
/// (spec §4.2, testable property 2).
pub fn derive_address(
    account_shares: &[Share],
    account_xpub: &ExtendedPublicKey,
    change: u32,
    index: u32,
) -> (Point, Vec<Share>) {
    let (change_xpub, change_tweak) = account_xpub.derive_non_hardened(change);
    let change_shares: Vec<Share> = account_shares
        .iter()
        .map(|s| derive_non_hardened_child_share(s, &change_tweak))
        .collect();

    let (address_xpub, address_tweak) = change_xpub.derive_non_hardened(index);
    let address_shares: Vec<Share> = change_shares
        .iter()
        .map(|s| derive_non_hardened_child_share(s, &address_tweak))
        .collect();

    (address_xpub.pubkey_point(), address_shares)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn account_setup_then_address_enumeration_matches_xpub() {
        let mut rng = StdRng::seed_from_u64(7);
        let (shares, _) = generate_shares(3, &mut rng);
        let (account_shares, account_xpub) = setup_account(&shares, &[0u8; 32], 0, 0);

        let (receive_pubkey, receive_shares) =
            derive_address(&account_shares, &account_xpub, 0, 0);

        assert_eq!(aggregate_public_key(&receive_shares), receive_pubkey);
    }
}
