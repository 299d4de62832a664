use huddle_core::{PeerId, TrackKind};

/// Identifies one connection object. A session that rebuilds its connection
/// gets a new generation, so late events from the old one can be told apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LinkId {
    pub peer_id: PeerId,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrackInfo {
    pub track_id: String,
    pub stream_id: String,
    pub kind: TrackKind,
}

/// Events a transport reports back to the orchestrator loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A local ICE candidate, serialized as JSON, to trickle to the remote side.
    CandidateGenerated(LinkId, String),

    /// Media can flow.
    Connected(LinkId),

    /// The network path dropped; the connection may still be restarted.
    PathLost(LinkId),

    /// The connection is gone for good.
    Closed(LinkId),

    RemoteTrack(LinkId, RemoteTrackInfo),
}

impl TransportEvent {
    pub fn link(&self) -> &LinkId {
        match self {
            TransportEvent::CandidateGenerated(link, _)
            | TransportEvent::Connected(link)
            | TransportEvent::PathLost(link)
            | TransportEvent::Closed(link)
            | TransportEvent::RemoteTrack(link, _) => link,
        }
    }
}
