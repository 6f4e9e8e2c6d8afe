//! Signing-plane wire types (spec §6): server-published events and the
//! client requests that drive the four-round ceremony. All carry JSON
//! bodies over whatever bidirectional transport the deployment wires up
//! (`gv-coordinator-server` uses a `warp` WebSocket).

use gv_primitives::{GuardianId, TransactionId, VaultId};
use serde::{Deserialize, Serialize};

use crate::model::{MessageHashHex, TransactionType};
use crate::wire::{DecimalScalar, PointHex};

/// Server -> client events (spec §6).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SigningEvent {
    SigningNewTransaction {
        tx_id: TransactionId,
        tx_type: TransactionType,
        amount: u64,
        recipient: String,
        message_hash: MessageHashHex,
    },
    SigningRound2Ready {
        tx_id: TransactionId,
        r: DecimalScalar,
    },
    SigningComplete {
        tx_id: TransactionId,
    },
    GuardianConnected {
        vault_id: VaultId,
        guardian_id: GuardianId,
    },
    GuardianDisconnected {
        vault_id: VaultId,
        guardian_id: GuardianId,
    },
}

impl SigningEvent {
    pub fn new_transaction(tx_id: TransactionId, intent: &crate::model::TransactionRecord) -> Self {
        SigningEvent::SigningNewTransaction {
            tx_id,
            tx_type: intent.tx_type,
            amount: intent.amount,
            recipient: intent.recipient.clone(),
            message_hash: intent.message_hash,
        }
    }
}

/// Client -> server requests, each acknowledged with the matching `*Ack`
/// (spec §6). `SubmitRound1` carries only `r_i_hex_compressed` — no
/// `k_i_hex` field — per the round-1 trust-boundary redesign (spec §9,
/// SPEC_FULL.md §4.4).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SigningRequest {
    SubmitRound1 {
        tx_id: TransactionId,
        guardian_id: GuardianId,
        r_i_hex_compressed: PointHex,
    },
    GetRound2Data {
        tx_id: TransactionId,
        guardian_id: GuardianId,
    },
    SubmitRound3 {
        tx_id: TransactionId,
        guardian_id: GuardianId,
        s_i_decimal: DecimalScalar,
    },
    GetFinalSignature {
        tx_id: TransactionId,
        guardian_id: GuardianId,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Round1Ack {
    pub tx_id: TransactionId,
    pub accepted: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Round2DataResponse {
    pub tx_id: TransactionId,
    pub r: DecimalScalar,
    pub message_hash: MessageHashHex,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Round3Ack {
    pub tx_id: TransactionId,
    pub accepted: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FinalSignatureResponse {
    pub tx_id: TransactionId,
    pub r: DecimalScalar,
    pub s: DecimalScalar,
    pub recovery_id: Option<u8>,
}

/// Request/response envelope the server exchanges with `gv_coordinator`'s
/// handlers; the transport layer (`gv-coordinator-server`) only needs to
/// deserialize a [`SigningRequest`], dispatch, and serialize whichever
/// `*Ack`/`*Response` comes back.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SigningResponse {
    Round1Ack(Round1Ack),
    Round2Data(Round2DataResponse),
    Round3Ack(Round3Ack),
    FinalSignature(FinalSignatureResponse),
    Error { message: String },
}
