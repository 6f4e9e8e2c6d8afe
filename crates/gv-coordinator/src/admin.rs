//! The REST admin surface's trait contracts (spec §1, §6: "any conforming
//! routing suffices, but the semantics are fixed"; SPEC_FULL.md §6). No
//! HTTP router binds to these in this workspace — `gv-coordinator-server`
//! exposes only the signing websocket and a liveness route — but the
//! operation signatures and status-code contracts are recorded here so an
//! external admin surface (and its authentication, both explicitly out of
//! scope per spec §1) has a fixed shape to implement against.

use gv_primitives::{CoinType, GuardianId, VaultId};

use crate::error::CoordinatorError;
use crate::model::{GuardianRecord, GuardianStatus, VaultRecord};

/// Create/list/get/update/delete plus activation and stats for vaults
/// (spec §6). Implementors map these to `201`/`200`/`204`/`400`/`404`/
/// `409` the way spec §6 enumerates; this trait only fixes behavior, not
/// wire format.
#[async_trait::async_trait]
pub trait VaultDirectory: Send + Sync {
    /// `201` on success; the vault starts in [`crate::model::VaultStatus::Setup`].
    async fn create_vault(
        &self,
        name: String,
        coin_type: CoinType,
        total_guardians: u32,
        account_index: u32,
    ) -> Result<VaultRecord, CoordinatorError>;

    /// `200`, or `404` if no vault with this id exists.
    async fn get_vault(&self, vault_id: VaultId) -> Result<VaultRecord, CoordinatorError>;

    /// `200`; no pagination contract is fixed by spec §6.
    async fn list_vaults(&self) -> Result<Vec<VaultRecord>, CoordinatorError>;

    /// `200` on a field update; `409` if the update would violate
    /// `threshold == total_guardians` (spec §3 invariant).
    async fn update_vault(&self, vault: VaultRecord) -> Result<VaultRecord, CoordinatorError>;

    /// `204`; refused (`409`) once any transaction under this vault has
    /// left `Pending` — a vault with in-flight ceremonies is not a safe
    /// deletion target.
    async fn delete_vault(&self, vault_id: VaultId) -> Result<(), CoordinatorError>;

    /// `200` on the `Setup -> Active` transition if
    /// `guardians_joined == total_guardians`; `409` otherwise (spec §3).
    async fn activate_vault(&self, vault_id: VaultId) -> Result<VaultRecord, CoordinatorError>;

    /// `200`; guardian count, transaction counts by status, and whatever
    /// else an operator dashboard needs — spec §6 names this operation but
    /// not its exact response shape.
    async fn vault_stats(&self, vault_id: VaultId) -> Result<VaultStats, CoordinatorError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VaultStats {
    pub guardians_joined: u32,
    pub total_guardians: u32,
    pub transactions_pending: u32,
    pub transactions_completed: u32,
    pub transactions_failed: u32,
}

/// Create/list/get/update/delete plus invitation and join for guardians
/// (spec §3, §6). A guardian's `invitation_code` is unique globally and
/// accepted exactly once (spec §3); `join_with_invitation` is the only
/// operation that flips `Invited -> Active` and increments the owning
/// vault's `guardians_joined`.
#[async_trait::async_trait]
pub trait GuardianDirectory: Send + Sync {
    /// `201`; status starts `Invited` with a freshly generated, globally
    /// unique `invitation_code`.
    async fn invite_guardian(
        &self,
        vault_id: VaultId,
        name: String,
        email: String,
        share_id: u32,
    ) -> Result<GuardianRecord, CoordinatorError>;

    /// `200`, or `404`.
    async fn get_guardian(&self, guardian_id: GuardianId) -> Result<GuardianRecord, CoordinatorError>;

    /// `200`.
    async fn list_guardians(&self, vault_id: VaultId) -> Result<Vec<GuardianRecord>, CoordinatorError>;

    /// `200` on a field update (e.g. `name`/`email`), or `409` attempting
    /// to edit a `Removed` guardian.
    async fn update_guardian(&self, guardian: GuardianRecord) -> Result<GuardianRecord, CoordinatorError>;

    /// `204`; moves status to [`GuardianStatus::Removed`] rather than
    /// deleting the row outright, so a vault's historical `guardian_ids`
    /// and past signing contributions stay attributable.
    async fn remove_guardian(&self, guardian_id: GuardianId) -> Result<(), CoordinatorError>;

    /// `200` on first use of `invitation_code`; `409` on reuse (spec §3:
    /// "accepted exactly once") or `404` if the code doesn't exist.
    async fn join_with_invitation(&self, invitation_code: &str) -> Result<GuardianRecord, CoordinatorError>;
}

pub(crate) fn status_after_join(current: GuardianStatus) -> Result<GuardianStatus, CoordinatorError> {
    match current {
        GuardianStatus::Invited => Ok(GuardianStatus::Active),
        GuardianStatus::Active => Err(CoordinatorError::StateConflict(
            "invitation code has already been accepted".to_string(),
        )),
        GuardianStatus::Inactive | GuardianStatus::Removed => Err(CoordinatorError::StateConflict(
            "guardian is no longer eligible to join".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn an_invited_guardian_can_join_exactly_once() {
        assert_eq!(status_after_join(GuardianStatus::Invited).unwrap(), GuardianStatus::Active);
        assert!(status_after_join(GuardianStatus::Active).is_err());
        assert!(status_after_join(GuardianStatus::Removed).is_err());
    }
}
