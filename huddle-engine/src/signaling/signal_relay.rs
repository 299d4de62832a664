use crate::error::SignalingError;
use async_trait::async_trait;
use huddle_core::{PeerId, RoomId};
use tokio::sync::mpsc;

/// Transport for serialized signaling frames, addressed per room and peer.
///
/// Implementations must deliver at least once and keep frames from one
/// sender to one receiver in order. Nothing is promised across pairs.
#[async_trait]
pub trait SignalRelay: Send + Sync + 'static {
    async fn publish(&self, room_id: &RoomId, to: &PeerId, frame: String)
    -> Result<(), SignalingError>;

    /// Frames addressed to `local`. Frames published before the first
    /// subscription are held and delivered on subscribe.
    async fn subscribe(
        &self,
        room_id: &RoomId,
        local: &PeerId,
    ) -> Result<mpsc::UnboundedReceiver<String>, SignalingError>;
}
