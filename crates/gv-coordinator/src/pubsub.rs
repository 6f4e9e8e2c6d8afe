//! The vault-scoped broadcast fabric (spec §4.5, §6: "rooms"). Every
//! guardian session connected to a vault receives every `SigningEvent`
//! published to that vault; this is the in-process analogue of the
//! teacher's `OutgoingMultisigStageMessages::Broadcast`, scoped to a
//! vault instead of a ceremony's authorized party set.

use async_trait::async_trait;
use gv_primitives::VaultId;
use tokio::sync::broadcast;

use crate::error::CoordinatorError;
use crate::events::SigningEvent;

const ROOM_CAPACITY: usize = 256;

/// A handle a connected guardian session reads events from after joining
/// a vault's room.
pub type RoomReceiver = broadcast::Receiver<SigningEvent>;

#[async_trait]
pub trait PubSub: Send + Sync {
    /// Publishes `event` to every session currently subscribed to
    /// `vault_id`'s room. A room with no subscribers silently drops the
    /// event — there is no outbox to replay from (spec §4.5: the
    /// in-memory session index is soft state).
    async fn publish(&self, vault_id: VaultId, event: SigningEvent) -> Result<(), CoordinatorError>;

    /// Joins `vault_id`'s room, creating it if this is the first
    /// subscriber.
    fn subscribe(&self, vault_id: VaultId) -> RoomReceiver;
}

/// In-process room registry. One `tokio::sync::broadcast` channel per
/// vault, created lazily on first publish or subscribe.
pub struct Rooms {
    rooms: dashmap::DashMap<VaultId, broadcast::Sender<SigningEvent>>,
}

impl Default for Rooms {
    fn default() -> Self {
        Rooms { rooms: dashmap::DashMap::new() }
    }
}

impl Rooms {
    pub fn new() -> Self {
        Self::default()
    }

    fn room(&self, vault_id: VaultId) -> broadcast::Sender<SigningEvent> {
        self.rooms
            .entry(vault_id)
            .or_insert_with(|| broadcast::channel(ROOM_CAPACITY).0)
            .clone()
    }
}

#[async_trait]
impl PubSub for Rooms {
    async fn publish(&self, vault_id: VaultId, event: SigningEvent) -> Result<(), CoordinatorError> {
        // A send with no receivers returns `Err(SendError)`; that is not a
        // transport failure (spec §4.5 lifecycle note), so it is not
        // propagated as a `CoordinatorError`.
        let _ = self.room(vault_id).send(event);
        Ok(())
    }

    fn subscribe(&self, vault_id: VaultId) -> RoomReceiver {
        self.room(vault_id).subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gv_primitives::TransactionId;

    #[tokio::test]
    async fn a_published_event_reaches_a_subscriber() {
        let rooms = Rooms::new();
        let vault_id = VaultId::new();
        let mut receiver = rooms.subscribe(vault_id);

        let event = SigningEvent::GuardianConnected { vault_id, guardian_id: gv_primitives::GuardianId::new() };
        rooms.publish(vault_id, event.clone()).await.unwrap();

        let received = receiver.recv().await.unwrap();
        assert_eq!(received, event);
    }

    #[tokio::test]
    async fn publishing_to_an_empty_room_does_not_error() {
        let rooms = Rooms::new();
        rooms
            .publish(
                VaultId::new(),
                SigningEvent::GuardianDisconnected {
                    vault_id: VaultId::new(),
                    guardian_id: gv_primitives::GuardianId::new(),
                },
            )
            .await
            .unwrap();
    }
}
