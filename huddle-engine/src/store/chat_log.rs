use crate::error::StoreError;
use async_trait::async_trait;
use huddle_core::{ChatMessage, NewChatMessage, RoomId};
use tokio::sync::broadcast;

/// Per-room, append-only message collection with server-assigned ordering.
#[async_trait]
pub trait ChatLog: Send + Sync + 'static {
    /// Persists a message. The store assigns the id and the timestamp.
    async fn append(&self, room_id: &RoomId, message: NewChatMessage)
    -> Result<ChatMessage, StoreError>;

    async fn history(&self, room_id: &RoomId) -> Result<Vec<ChatMessage>, StoreError>;

    /// Live feed of newly appended messages. Closes when the store connection is lost.
    async fn watch_messages(
        &self,
        room_id: &RoomId,
    ) -> Result<broadcast::Receiver<ChatMessage>, StoreError>;
}
