//! The coordinator's data model (spec §3): vaults, guardians, and the
//! per-transaction signing state machine.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use gv_primitives::{CoinType, GuardianId, TransactionId, VaultId};
use gv_shares::ExtendedPublicKey;
use serde::{Deserialize, Serialize};

use crate::wire::{DecimalScalar, PointHex};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultStatus {
    Setup,
    Active,
    Suspended,
    Archived,
}

/// A vault: one `n`-of-`n` wallet for one coin (spec §3). `threshold`
/// always equals `total_guardians` — this system has no true `t`-of-`n`
/// scheme (spec §1 non-goals).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VaultRecord {
    pub vault_id: VaultId,
    pub name: String,
    pub coin_type: CoinType,
    pub threshold: u32,
    pub total_guardians: u32,
    pub account_index: u32,
    pub status: VaultStatus,
    pub account_xpub: Option<ExtendedPublicKey>,
    pub guardians_joined: u32,
    pub guardian_ids: Vec<GuardianId>,
}

impl VaultRecord {
    pub fn new(
        vault_id: VaultId,
        name: String,
        coin_type: CoinType,
        total_guardians: u32,
        account_index: u32,
    ) -> Self {
        VaultRecord {
            vault_id,
            name,
            coin_type,
            threshold: total_guardians,
            total_guardians,
            account_index,
            status: VaultStatus::Setup,
            account_xpub: None,
            guardians_joined: 0,
            guardian_ids: Vec::new(),
        }
    }

    /// `Setup -> Active` only once every guardian has joined (spec §3
    /// invariant). Idempotent: calling it again once already `Active` is
    /// a no-op, not an error.
    pub fn activate_if_complete(&mut self) {
        if self.status == VaultStatus::Setup && self.guardians_joined == self.total_guardians {
            self.status = VaultStatus::Active;
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuardianStatus {
    Invited,
    Active,
    Inactive,
    Removed,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GuardianRecord {
    pub guardian_id: GuardianId,
    pub vault_id: VaultId,
    pub name: String,
    pub email: String,
    pub status: GuardianStatus,
    pub share_id: u32,
    pub invitation_code: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionType {
    Send,
    Consolidate,
    Sweep,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BitcoinAddressType {
    P2pkh,
    P2wpkh,
    P2tr,
}

/// The signing state machine (spec §4.4 diagram). Transitions out of a
/// terminal state (`Completed`, `Failed`, `Cancelled`) are always refused
/// (spec §8 testable property 8).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    Pending,
    Round1,
    Round2,
    Round3,
    Completed,
    Failed,
    Cancelled,
}

impl TransactionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TransactionStatus::Completed | TransactionStatus::Failed | TransactionStatus::Cancelled
        )
    }
}

/// Chain-specific intent fields, discriminated the way `CoinType`
/// discriminates the rest of the record (spec §3).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "coin")]
pub enum ChainIntent {
    Bitcoin {
        utxo_txid: [u8; 32],
        utxo_vout: u32,
        utxo_amount_sats: u64,
        sender_address: String,
        address_index: u32,
        address_type: BitcoinAddressType,
    },
    Ethereum {
        nonce: u64,
        chain_id: u64,
        gas_limit: u64,
        max_priority_fee: Option<u64>,
        max_fee: Option<u64>,
        gas_price: Option<u64>,
        tx_data: Vec<u8>,
        address_index: u32,
    },
}

/// A 32-byte message digest, wire-encoded as hex: the canonical Bitcoin
/// sighash or Ethereum signing hash every guardian signs over (spec §3).
pub type MessageHash = [u8; 32];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageHashHex(#[serde(with = "hex_bytes_32")] pub MessageHash);

mod hex_bytes_32 {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 32], D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("message hash must be 32 bytes"))
    }
}

/// One guardian's round-1 contribution: only the commitment `R_i`. There
/// is no `k_i` field — the redesign in spec.md §9 (carried into
/// SPEC_FULL.md §4.4) keeps the nonce on the guardian forever, so the
/// coordinator can never reconstruct the joint nonce `k` and, from it,
/// the joint private key.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Round1Contribution {
    pub commitment: PointHex,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Round2Data {
    pub r: DecimalScalar,
    pub aggregate_point: PointHex,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Round3Contribution {
    pub s_i: DecimalScalar,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FinalSignature {
    pub r: DecimalScalar,
    pub s: DecimalScalar,
    /// Ethereum only (spec §4.3); absent for Bitcoin signatures.
    pub recovery_id: Option<u8>,
}

/// The central state machine record (spec §3 "Transaction record").
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub tx_id: TransactionId,
    pub vault_id: VaultId,
    pub coin_type: CoinType,
    pub tx_type: TransactionType,
    pub amount: u64,
    pub recipient: String,
    pub fee: u64,
    pub memo: Option<String>,
    pub intent: ChainIntent,
    pub message_hash: MessageHashHex,
    pub status: TransactionStatus,
    pub signatures_required: u32,
    pub round1_data: BTreeMap<GuardianId, Round1Contribution>,
    pub round2_data: Option<Round2Data>,
    pub round3_data: BTreeMap<GuardianId, Round3Contribution>,
    pub final_signature: Option<FinalSignature>,
    pub timeout_at: DateTime<Utc>,
    pub error_message: Option<String>,
}

impl TransactionRecord {
    pub fn scalar_message_hash(&self) -> gv_curve::Scalar {
        gv_curve::Scalar::from_bytes_mod_order(&self.message_hash.0)
    }
}
