//! `MongoStore` (feature `mongodb`): the `Store` contract backed by the
//! real `mongodb` driver crate, for deployments that want a document
//! store heavier than [`crate::store::InMemoryStore`] (spec §1's "choice
//! of persistence engine is out of scope, any conforming store
//! suffices"; this is the one concrete choice this workspace ships).
//!
//! Filters are built with `bson::to_bson` on the typed id/status values
//! rather than hand-written BSON literals, so a filter always matches
//! however `serde` happens to encode that type — the same discipline
//! `InMemoryStore`'s CAS relies on `PartialEq`/`Eq` for.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use gv_primitives::{GuardianId, TransactionId, VaultId};
use mongodb::bson::{doc, to_bson};
use mongodb::options::{FindOneAndReplaceOptions, ReturnDocument};
use mongodb::{Client, Collection};

use crate::error::CoordinatorError;
use crate::model::{
    GuardianRecord, Round1Contribution, Round3Contribution, TransactionRecord, TransactionStatus,
    VaultRecord,
};
use crate::store::{Round1SubmitOutcome, Round3SubmitOutcome, Store};

fn mongo_err(err: mongodb::error::Error) -> CoordinatorError {
    CoordinatorError::PersistenceError(err.to_string())
}

fn bson_err(err: mongodb::bson::ser::Error) -> CoordinatorError {
    CoordinatorError::PersistenceError(err.to_string())
}

pub struct MongoStore {
    vaults: Collection<VaultRecord>,
    guardians: Collection<GuardianRecord>,
    transactions: Collection<TransactionRecord>,
}

impl MongoStore {
    /// Connects to `url` and binds to `db_name`'s `vaults`/`guardians`/
    /// `transactions` collections. Indexes (on `vault_id`, `invitation_code`,
    /// `tx_id`) are a deployment/migration concern, not this constructor's.
    pub async fn connect(url: &str, db_name: &str) -> Result<Arc<Self>, CoordinatorError> {
        let client = Client::with_uri_str(url).await.map_err(mongo_err)?;
        let db = client.database(db_name);
        Ok(Arc::new(MongoStore {
            vaults: db.collection("vaults"),
            guardians: db.collection("guardians"),
            transactions: db.collection("transactions"),
        }))
    }
}

#[async_trait]
impl Store for MongoStore {
    async fn insert_vault(&self, vault: VaultRecord) -> Result<(), CoordinatorError> {
        self.vaults.insert_one(vault, None).await.map_err(mongo_err)?;
        Ok(())
    }

    async fn find_vault(&self, vault_id: VaultId) -> Result<Option<VaultRecord>, CoordinatorError> {
        let filter = doc! { "vault_id": to_bson(&vault_id).map_err(bson_err)? };
        self.vaults.find_one(filter, None).await.map_err(mongo_err)
    }

    async fn update_vault(&self, vault: VaultRecord) -> Result<(), CoordinatorError> {
        let filter = doc! { "vault_id": to_bson(&vault.vault_id).map_err(bson_err)? };
        self.vaults
            .replace_one(filter, vault, None)
            .await
            .map_err(mongo_err)?;
        Ok(())
    }

    async fn insert_guardian(&self, guardian: GuardianRecord) -> Result<(), CoordinatorError> {
        self.guardians.insert_one(guardian, None).await.map_err(mongo_err)?;
        Ok(())
    }

    async fn find_guardian(
        &self,
        guardian_id: GuardianId,
    ) -> Result<Option<GuardianRecord>, CoordinatorError> {
        let filter = doc! { "guardian_id": to_bson(&guardian_id).map_err(bson_err)? };
        self.guardians.find_one(filter, None).await.map_err(mongo_err)
    }

    async fn find_guardian_by_invitation(
        &self,
        invitation_code: &str,
    ) -> Result<Option<GuardianRecord>, CoordinatorError> {
        let filter = doc! { "invitation_code": invitation_code };
        self.guardians.find_one(filter, None).await.map_err(mongo_err)
    }

    async fn update_guardian(&self, guardian: GuardianRecord) -> Result<(), CoordinatorError> {
        let filter = doc! { "guardian_id": to_bson(&guardian.guardian_id).map_err(bson_err)? };
        self.guardians
            .replace_one(filter, guardian, None)
            .await
            .map_err(mongo_err)?;
        Ok(())
    }

    async fn insert_transaction(&self, tx: TransactionRecord) -> Result<(), CoordinatorError> {
        self.transactions
            .insert_one(tx, None)
            .await
            .map_err(mongo_err)?;
        Ok(())
    }

    async fn find_transaction(
        &self,
        tx_id: TransactionId,
    ) -> Result<Option<TransactionRecord>, CoordinatorError> {
        let filter = doc! { "tx_id": to_bson(&tx_id).map_err(bson_err)? };
        self.transactions.find_one(filter, None).await.map_err(mongo_err)
    }

    async fn update_transaction_if_status(
        &self,
        tx_id: TransactionId,
        expected_status: TransactionStatus,
        new_record: TransactionRecord,
    ) -> Result<bool, CoordinatorError> {
        let filter = doc! {
            "tx_id": to_bson(&tx_id).map_err(bson_err)?,
            "status": to_bson(&expected_status).map_err(bson_err)?,
        };
        let options = FindOneAndReplaceOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let result = self
            .transactions
            .find_one_and_replace(filter, new_record, options)
            .await
            .map_err(mongo_err)?;
        Ok(result.is_some())
    }

    async fn find_expired_transactions(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<TransactionId>, CoordinatorError> {
        let terminal = vec![
            to_bson(&TransactionStatus::Completed).map_err(bson_err)?,
            to_bson(&TransactionStatus::Failed).map_err(bson_err)?,
            to_bson(&TransactionStatus::Cancelled).map_err(bson_err)?,
        ];
        let filter = doc! { "status": { "$nin": terminal } };
        let mut cursor = self.transactions.find(filter, None).await.map_err(mongo_err)?;
        let mut expired = Vec::new();
        while let Some(tx) = cursor.try_next().await.map_err(mongo_err)? {
            if tx.timeout_at <= now {
                expired.push(tx.tx_id);
            }
        }
        Ok(expired)
    }

    /// Mongo has no positional "append to a map field iff status matches"
    /// update for an arbitrary `GuardianId` key, so this retries a
    /// read-modify-`findOneAndReplace` loop instead of the single atomic
    /// op `InMemoryStore` gets from holding a lock across read and write:
    /// a lost race (another guardian's contribution landed between the
    /// read and the replace) just means the read was stale, not a real
    /// conflict, so it re-reads and tries again rather than surfacing an
    /// error to a guardian who did nothing wrong.
    async fn append_round1_contribution(
        &self,
        tx_id: TransactionId,
        guardian_id: GuardianId,
        contribution: Round1Contribution,
    ) -> Result<Round1SubmitOutcome, CoordinatorError> {
        loop {
            let Some(tx) = self.find_transaction(tx_id).await? else {
                return Err(CoordinatorError::NotFound(format!("transaction {tx_id}")));
            };
            match tx.status {
                TransactionStatus::Pending | TransactionStatus::Round1 => {}
                other => return Ok(Round1SubmitOutcome::WrongStage { actual: other }),
            }
            if tx.round1_data.contains_key(&guardian_id) {
                return Ok(Round1SubmitOutcome::AlreadyContributed);
            }

            let mut updated = tx.clone();
            updated.round1_data.insert(guardian_id, contribution.clone());
            updated.status = TransactionStatus::Round1;

            let filter = doc! {
                "tx_id": to_bson(&tx_id).map_err(bson_err)?,
                "status": to_bson(&tx.status).map_err(bson_err)?,
            };
            let options = FindOneAndReplaceOptions::builder()
                .return_document(ReturnDocument::After)
                .build();
            let committed = self
                .transactions
                .find_one_and_replace(filter, updated.clone(), options)
                .await
                .map_err(mongo_err)?;
            if committed.is_some() {
                return Ok(Round1SubmitOutcome::Accepted { contributions_so_far: updated.round1_data });
            }
        }
    }

    /// Round-3 counterpart of [`MongoStore::append_round1_contribution`];
    /// same retry-on-stale-read loop.
    async fn append_round3_contribution(
        &self,
        tx_id: TransactionId,
        guardian_id: GuardianId,
        contribution: Round3Contribution,
    ) -> Result<Round3SubmitOutcome, CoordinatorError> {
        loop {
            let Some(tx) = self.find_transaction(tx_id).await? else {
                return Err(CoordinatorError::NotFound(format!("transaction {tx_id}")));
            };
            if tx.status != TransactionStatus::Round3 {
                return Ok(Round3SubmitOutcome::WrongStage { actual: tx.status });
            }
            if tx.round3_data.contains_key(&guardian_id) {
                return Ok(Round3SubmitOutcome::AlreadyContributed);
            }

            let mut updated = tx.clone();
            updated.round3_data.insert(guardian_id, contribution.clone());

            let filter = doc! {
                "tx_id": to_bson(&tx_id).map_err(bson_err)?,
                "status": to_bson(&TransactionStatus::Round3).map_err(bson_err)?,
            };
            let options = FindOneAndReplaceOptions::builder()
                .return_document(ReturnDocument::After)
                .build();
            let committed = self
                .transactions
                .find_one_and_replace(filter, updated.clone(), options)
                .await
                .map_err(mongo_err)?;
            if committed.is_some() {
                return Ok(Round3SubmitOutcome::Accepted { contributions_so_far: updated.round3_data });
            }
        }
    }
}
