use crate::error::StoreError;
use async_trait::async_trait;
use huddle_core::{Participant, Room, RoomId, StatusPatch};
use tokio::sync::watch;

/// Atomic mutations of a room's participant list.
///
/// `Add` and `Remove` are set operations keyed by `uid` and are applied by
/// the store itself, never as a read-modify-write of the whole list.
#[derive(Debug, Clone)]
pub enum ParticipantOp {
    /// Set-union: no-op when a participant with the same uid is present.
    Add(Participant),
    /// Set-difference: no-op when the uid is absent.
    Remove { uid: String },
    UpdateStatus { uid: String, patch: StatusPatch },
    /// Refreshes `last_seen` with the store clock.
    Touch { uid: String },
}

/// Real-time document store holding room records.
#[async_trait]
pub trait RoomStore: Send + Sync + 'static {
    /// Creates an empty room and returns its id.
    async fn create(&self, host_id: &str, name: &str) -> Result<RoomId, StoreError>;

    async fn exists(&self, room_id: &RoomId) -> Result<bool, StoreError>;

    /// Latest snapshot, `None` when the room does not exist or was closed.
    async fn snapshot(&self, room_id: &RoomId) -> Result<Option<Room>, StoreError>;

    async fn mutate_participants(&self, room_id: &RoomId, op: ParticipantOp)
    -> Result<(), StoreError>;

    /// Logically destroys the room. Idempotent.
    async fn close(&self, room_id: &RoomId) -> Result<(), StoreError>;

    /// Closes the room only if its participant list is empty, atomically
    /// with respect to concurrent joins. Returns whether it was closed.
    async fn close_if_empty(&self, room_id: &RoomId) -> Result<bool, StoreError>;

    /// Opens a live feed of full snapshots; `None` means the room is gone.
    ///
    /// The sender side is dropped when the connection to the store is lost,
    /// which callers observe as `changed()` returning an error.
    async fn watch(&self, room_id: &RoomId) -> Result<watch::Receiver<Option<Room>>, StoreError>;

    /// Store clock in unix milliseconds.
    async fn server_time(&self) -> Result<u64, StoreError>;
}
