use crate::orchestrator::SessionState;
use crate::transport::RemoteTrackInfo;
use huddle_core::PeerId;

/// What the orchestrator reports about remote peers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerEvent {
    StateChanged { peer_id: PeerId, state: SessionState },
    RemoteTrack { peer_id: PeerId, track: RemoteTrackInfo },
    /// The session is gone; `reason` is `Closed` or `Failed`.
    Removed { peer_id: PeerId, reason: SessionState },
}

impl PeerEvent {
    pub fn peer_id(&self) -> &PeerId {
        match self {
            PeerEvent::StateChanged { peer_id, .. }
            | PeerEvent::RemoteTrack { peer_id, .. }
            | PeerEvent::Removed { peer_id, .. } => peer_id,
        }
    }
}
