//! Periodic timeout sweeper (spec §5): a background loop that fails every
//! transaction whose deadline has passed, mirroring the teacher's
//! `ceremony_runner.rs` deadline handling (there, one `tokio::time::Sleep`
//! per in-flight ceremony; here, one shared `tokio::time::interval` since
//! the coordinator tracks many transactions through one `Store` instead of
//! one ceremony per task).

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use crate::context::CoordinatorContext;

/// How often the sweeper polls `Store::find_expired_transactions`. Shorter
/// than any reasonable `transaction_timeout_seconds` so a timed-out
/// transaction is failed within one tick of its deadline, not one sweep
/// cycle late.
const SWEEP_INTERVAL: Duration = Duration::from_secs(10);

/// Runs [`CoordinatorContext::sweep_timed_out_transactions`] on a fixed
/// interval until the process exits. Intended to be spawned once alongside
/// the signing-plane server; a failed sweep pass is logged and retried on
/// the next tick rather than aborting the loop.
pub async fn run_sweeper(context: Arc<CoordinatorContext>) {
    let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
    loop {
        ticker.tick().await;
        match context.sweep_timed_out_transactions().await {
            Ok(0) => {}
            Ok(swept) => info!(swept, "sweeper failed timed-out transactions"),
            Err(error) => error!(%error, "sweep pass failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoordinatorConfig;
    use crate::pubsub::Rooms;
    use crate::store::InMemoryStore;

    fn config() -> CoordinatorConfig {
        CoordinatorConfig {
            mongodb_url: None,
            mongodb_db_name: None,
            host: "127.0.0.1".to_string(),
            port: 0,
            debug: true,
            secret_key: "test".to_string(),
            cors_origins: Vec::new(),
            signing_round_timeout_seconds: 300,
            transaction_timeout_seconds: 3600,
        }
    }

    #[tokio::test]
    async fn one_sweep_tick_fails_an_already_expired_transaction() {
        let store = InMemoryStore::new();
        let pubsub = Arc::new(Rooms::new());
        let context = Arc::new(CoordinatorContext::new(store.clone(), pubsub, config()));

        let vault_id = gv_primitives::VaultId::new();
        let mut vault = crate::model::VaultRecord::new(
            vault_id,
            "sweep test".to_string(),
            gv_primitives::CoinType::Bitcoin,
            1,
            0,
        );
        vault.status = crate::model::VaultStatus::Active;
        store.insert_vault(vault).await.unwrap();

        let tx_id = gv_primitives::TransactionId::new();
        let tx = crate::model::TransactionRecord {
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
            status: crate::model::TransactionStatus::Pending,
            signatures_required: 1,
            round1_data: Default::default(),
            round2_data: None,
            round3_data: Default::default(),
            final_signature: None,
            timeout_at: chrono::Utc::now() - chrono::Duration::seconds(1),
            error_message: None,
        };
        store.insert_transaction(tx).await.unwrap();

        let swept = context.sweep_timed_out_transactions().await.unwrap();
        assert_eq!(swept, 1);

        let stored = store.find_transaction(tx_id).await.unwrap().unwrap();
        assert_eq!(stored.status, crate::model::TransactionStatus::Failed);
    }
}
