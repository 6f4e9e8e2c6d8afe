//! The `Store` trait contract (spec §1, §4.5, §9 "re-architecting global
//! state"): the coordinator's only view of persistence. Any document
//! store with atomic single-document updates and a handful of indexes
//! satisfies it (spec §1 names the choice of engine out of scope); this
//! crate ships one in-memory implementation for tests and the reference
//! server, built the way the teacher's `CeremonyManager` keeps ceremonies
//! in an in-memory map keyed by id (spec §5, §9).

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use gv_primitives::{GuardianId, TransactionId, VaultId};

use crate::error::CoordinatorError;
use crate::model::{
    GuardianRecord, Round1Contribution, Round3Contribution, TransactionRecord, TransactionStatus,
    VaultRecord,
};

/// What happened when a guardian's round-1 contribution was appended.
/// `contributions_so_far` lets the caller tell, without a second read,
/// whether it is the one contribution that closed out the round — exactly
/// one caller ever observes `contributions_so_far.len() == required`,
/// because the append itself is atomic (spec §8 testable property: at most
/// one `execute_round2` per transaction).
#[derive(Debug)]
pub enum Round1SubmitOutcome {
    Accepted { contributions_so_far: BTreeMap<GuardianId, Round1Contribution> },
    AlreadyContributed,
    WrongStage { actual: TransactionStatus },
}

#[derive(Debug)]
pub enum Round3SubmitOutcome {
    Accepted { contributions_so_far: BTreeMap<GuardianId, Round3Contribution> },
    AlreadyContributed,
    WrongStage { actual: TransactionStatus },
}

/// A document-like store with atomic single-document updates (spec §5).
/// `update_transaction_if_status` is the compare-and-swap primitive every
/// round transition is built on: it only commits `new_record` if the
/// document currently on file still has `expected_status`, mirroring a
/// MongoDB `findOneAndUpdate` with a status-matched filter.
#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_vault(&self, vault: VaultRecord) -> Result<(), CoordinatorError>;
    async fn find_vault(&self, vault_id: VaultId) -> Result<Option<VaultRecord>, CoordinatorError>;
    async fn update_vault(&self, vault: VaultRecord) -> Result<(), CoordinatorError>;

    async fn insert_guardian(&self, guardian: GuardianRecord) -> Result<(), CoordinatorError>;
    async fn find_guardian(
        &self,
        guardian_id: GuardianId,
    ) -> Result<Option<GuardianRecord>, CoordinatorError>;
    async fn find_guardian_by_invitation(
        &self,
        invitation_code: &str,
    ) -> Result<Option<GuardianRecord>, CoordinatorError>;
    async fn update_guardian(&self, guardian: GuardianRecord) -> Result<(), CoordinatorError>;

    async fn insert_transaction(&self, tx: TransactionRecord) -> Result<(), CoordinatorError>;
    async fn find_transaction(
        &self,
        tx_id: TransactionId,
    ) -> Result<Option<TransactionRecord>, CoordinatorError>;

    /// Commits `new_record` iff the stored transaction's status still
    /// equals `expected_status`. Returns `false` on a lost race (spec §5,
    /// §8 scenario S6) rather than erroring — the caller that lost the
    /// race treats that as "someone else already made this transition".
    async fn update_transaction_if_status(
        &self,
        tx_id: TransactionId,
        expected_status: TransactionStatus,
        new_record: TransactionRecord,
    ) -> Result<bool, CoordinatorError>;

    /// Every non-terminal transaction whose `timeout_at` is at or before
    /// `now` (spec §5, periodic sweeper).
    async fn find_expired_transactions(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<TransactionId>, CoordinatorError>;

    /// Atomically records one guardian's round-1 contribution, the way a
    /// real document store would via a single `findAndModify` with a
    /// positional array/map update: the read-merge-write happens under one
    /// lock, so two guardians submitting at once can never clobber each
    /// other the way two independent `update_transaction_if_status` calls
    /// built from stale reads would (spec §8 scenario S6).
    ///
    /// The very first contribution also carries the `Pending -> Round1`
    /// transition, since nothing else triggers it (spec §3: "Round1 on
    /// first submission"). Any other status is rejected as `WrongStage`.
    async fn append_round1_contribution(
        &self,
        tx_id: TransactionId,
        guardian_id: GuardianId,
        contribution: Round1Contribution,
    ) -> Result<Round1SubmitOutcome, CoordinatorError>;

    /// Round-3 counterpart of [`Store::append_round1_contribution`].
    async fn append_round3_contribution(
        &self,
        tx_id: TransactionId,
        guardian_id: GuardianId,
        contribution: Round3Contribution,
    ) -> Result<Round3SubmitOutcome, CoordinatorError>;
}

/// In-memory reference `Store`, backed by `DashMap` for per-entity
/// concurrent access (the same reach-for-a-concurrent-map instinct the
/// teacher's ceremony/ID-keyed state uses, here applied to documents
/// instead of in-flight ceremony stages).
#[derive(Default)]
pub struct InMemoryStore {
    vaults: DashMap<VaultId, VaultRecord>,
    guardians: DashMap<GuardianId, GuardianRecord>,
    invitation_index: DashMap<String, GuardianId>,
    transactions: DashMap<TransactionId, TransactionRecord>,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn insert_vault(&self, vault: VaultRecord) -> Result<(), CoordinatorError> {
        self.vaults.insert(vault.vault_id, vault);
        Ok(())
    }

    async fn find_vault(&self, vault_id: VaultId) -> Result<Option<VaultRecord>, CoordinatorError> {
        Ok(self.vaults.get(&vault_id).map(|v| v.clone()))
    }

    async fn update_vault(&self, vault: VaultRecord) -> Result<(), CoordinatorError> {
        self.vaults.insert(vault.vault_id, vault);
        Ok(())
    }

    async fn insert_guardian(&self, guardian: GuardianRecord) -> Result<(), CoordinatorError> {
        self.invitation_index
            .insert(guardian.invitation_code.clone(), guardian.guardian_id);
        self.guardians.insert(guardian.guardian_id, guardian);
        Ok(())
    }

    async fn find_guardian(
        &self,
        guardian_id: GuardianId,
    ) -> Result<Option<GuardianRecord>, CoordinatorError> {
        Ok(self.guardians.get(&guardian_id).map(|g| g.clone()))
    }

    async fn find_guardian_by_invitation(
        &self,
        invitation_code: &str,
    ) -> Result<Option<GuardianRecord>, CoordinatorError> {
        let Some(id) = self.invitation_index.get(invitation_code).map(|id| *id) else {
            return Ok(None);
        };
        self.find_guardian(id).await
    }

    async fn update_guardian(&self, guardian: GuardianRecord) -> Result<(), CoordinatorError> {
        self.guardians.insert(guardian.guardian_id, guardian);
        Ok(())
    }

    async fn insert_transaction(&self, tx: TransactionRecord) -> Result<(), CoordinatorError> {
        if self.transactions.contains_key(&tx.tx_id) {
            return Err(CoordinatorError::StateConflict(
                "transaction already exists".to_string(),
            ));
        }
        self.transactions.insert(tx.tx_id, tx);
        Ok(())
    }

    async fn find_transaction(
        &self,
        tx_id: TransactionId,
    ) -> Result<Option<TransactionRecord>, CoordinatorError> {
        Ok(self.transactions.get(&tx_id).map(|t| t.clone()))
    }

    async fn update_transaction_if_status(
        &self,
        tx_id: TransactionId,
        expected_status: TransactionStatus,
        new_record: TransactionRecord,
    ) -> Result<bool, CoordinatorError> {
        let mut entry = self
            .transactions
            .get_mut(&tx_id)
            .ok_or_else(|| CoordinatorError::NotFound(format!("transaction {tx_id}")))?;
        if entry.status != expected_status {
            return Ok(false);
        }
        *entry = new_record;
        Ok(true)
    }

    async fn find_expired_transactions(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<TransactionId>, CoordinatorError> {
        Ok(self
            .transactions
            .iter()
            .filter(|entry| !entry.status.is_terminal() && entry.timeout_at <= now)
            .map(|entry| *entry.key())
            .collect())
    }

    async fn append_round1_contribution(
        &self,
        tx_id: TransactionId,
        guardian_id: GuardianId,
        contribution: Round1Contribution,
    ) -> Result<Round1SubmitOutcome, CoordinatorError> {
        let mut entry = self
            .transactions
            .get_mut(&tx_id)
            .ok_or_else(|| CoordinatorError::NotFound(format!("transaction {tx_id}")))?;
        match entry.status {
            TransactionStatus::Pending => entry.status = TransactionStatus::Round1,
            TransactionStatus::Round1 => {}
            other => return Ok(Round1SubmitOutcome::WrongStage { actual: other }),
        }
        if entry.round1_data.contains_key(&guardian_id) {
            return Ok(Round1SubmitOutcome::AlreadyContributed);
        }
        entry.round1_data.insert(guardian_id, contribution);
        Ok(Round1SubmitOutcome::Accepted { contributions_so_far: entry.round1_data.clone() })
    }

    async fn append_round3_contribution(
        &self,
        tx_id: TransactionId,
        guardian_id: GuardianId,
        contribution: Round3Contribution,
    ) -> Result<Round3SubmitOutcome, CoordinatorError> {
        let mut entry = self
            .transactions
            .get_mut(&tx_id)
            .ok_or_else(|| CoordinatorError::NotFound(format!("transaction {tx_id}")))?;
        if entry.status != TransactionStatus::Round3 {
            return Ok(Round3SubmitOutcome::WrongStage { actual: entry.status });
        }
        if entry.round3_data.contains_key(&guardian_id) {
            return Ok(Round3SubmitOutcome::AlreadyContributed);
        }
        entry.round3_data.insert(guardian_id, contribution);
        Ok(Round3SubmitOutcome::Accepted { contributions_so_far: entry.round3_data.clone() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_transaction(tx_id: TransactionId, vault_id: VaultId, signatures_required: u32) -> TransactionRecord {
        TransactionRecord {
            tx_id,
            vault_id,
            coin_type: gv_primitives::CoinType::Bitcoin,
            tx_type: crate::model::TransactionType::Send,
            amount: 1,
            recipient: "addr".to_string(),
            fee: 0,
            memo: None,
            intent: crate::model::ChainIntent::Ethereum {
                nonce: 0,
                chain_id: 1,
                gas_limit: 21_000,
                max_priority_fee: None,
                max_fee: None,
                gas_price: Some(1),
                tx_data: Vec::new(),
                address_index: 0,
            },
            message_hash: crate::model::MessageHashHex([0u8; 32]),
            status: TransactionStatus::Pending,
            signatures_required,
            round1_data: Default::default(),
            round2_data: None,
            round3_data: Default::default(),
            final_signature: None,
            timeout_at: Utc::now(),
            error_message: None,
        }
    }

    #[tokio::test]
    async fn cas_loses_race_once_status_moved_on() {
        let store = InMemoryStore::new();
        let tx_id = TransactionId::new();
        let tx = fixture_transaction(tx_id, VaultId::new(), 1);
        store.insert_transaction(tx.clone()).await.unwrap();

        let mut advanced = tx.clone();
        advanced.status = TransactionStatus::Round1;
        assert!(store
            .update_transaction_if_status(tx_id, TransactionStatus::Pending, advanced)
            .await
            .unwrap());

        let mut stale_attempt = tx.clone();
        stale_attempt.status = TransactionStatus::Round1;
        assert!(!store
            .update_transaction_if_status(tx_id, TransactionStatus::Pending, stale_attempt)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn first_round1_contribution_advances_pending_to_round1() {
        let store = InMemoryStore::new();
        let tx_id = TransactionId::new();
        let tx = fixture_transaction(tx_id, VaultId::new(), 2);
        assert_eq!(tx.status, TransactionStatus::Pending);
        store.insert_transaction(tx).await.unwrap();

        let point = gv_curve::Point::from_scalar(&gv_curve::Scalar::from_u64(3));
        let outcome = store
            .append_round1_contribution(
                tx_id,
                GuardianId::new(),
                Round1Contribution { commitment: crate::wire::PointHex(point) },
            )
            .await
            .unwrap();
        assert!(matches!(outcome, Round1SubmitOutcome::Accepted { .. }));

        let stored = store.find_transaction(tx_id).await.unwrap().unwrap();
        assert_eq!(stored.status, TransactionStatus::Round1);
    }

    #[tokio::test]
    async fn round1_contribution_after_round1_has_closed_is_rejected() {
        let store = InMemoryStore::new();
        let tx_id = TransactionId::new();
        let mut tx = fixture_transaction(tx_id, VaultId::new(), 1);
        tx.status = TransactionStatus::Round2;
        store.insert_transaction(tx).await.unwrap();

        let point = gv_curve::Point::from_scalar(&gv_curve::Scalar::from_u64(4));
        let outcome = store
            .append_round1_contribution(
                tx_id,
                GuardianId::new(),
                Round1Contribution { commitment: crate::wire::PointHex(point) },
            )
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            Round1SubmitOutcome::WrongStage { actual: TransactionStatus::Round2 }
        ));
    }

    #[tokio::test]
    async fn concurrent_round1_contributions_all_land() {
        let store = InMemoryStore::new();
        let tx_id = TransactionId::new();
        let mut tx = fixture_transaction(tx_id, VaultId::new(), 3);
        tx.status = TransactionStatus::Round1;
        store.insert_transaction(tx).await.unwrap();

        let guardians: Vec<GuardianId> = (0..3).map(|_| GuardianId::new()).collect();
        let point = gv_curve::Point::from_scalar(&gv_curve::Scalar::from_u64(9));

        let mut handles = Vec::new();
        for guardian_id in guardians.clone() {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .append_round1_contribution(
                        tx_id,
                        guardian_id,
                        Round1Contribution { commitment: crate::wire::PointHex(point) },
                    )
                    .await
                    .unwrap()
            }));
        }
        let mut outcomes = Vec::with_capacity(handles.len());
        for handle in handles {
            outcomes.push(handle.await.unwrap());
        }

        let mut last_full_count = 0;
        let mut closing_outcomes = 0;
        for outcome in outcomes {
            if let Round1SubmitOutcome::Accepted { contributions_so_far } = outcome {
                last_full_count = last_full_count.max(contributions_so_far.len());
                if contributions_so_far.len() == 3 {
                    closing_outcomes += 1;
                }
            }
        }
        assert_eq!(last_full_count, 3);
        assert_eq!(closing_outcomes, 1, "exactly one append must observe the completed round");
    }
}
