use crate::error::TransportError;
use crate::media::{MediaTrack, OutboundTracks};
use crate::transport::{LinkId, TransportConfig, TransportEvent};
use async_trait::async_trait;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdpKind {
    Offer,
    Answer,
}

/// How a video track substitution was carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackSwap {
    /// The sender now carries the new track; no signaling needed.
    InPlace,
    /// The track was staged but the remote side only sees it after a new offer/answer.
    NeedsRenegotiation,
}

/// One point-to-point media connection.
///
/// Every method is a local operation. Network progress is reported
/// asynchronously through the [`TransportEvent`] channel given at creation.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Creates an offer and installs it as the local description.
    async fn create_offer(&self, ice_restart: bool) -> Result<String, TransportError>;

    /// Creates an answer to the current remote offer and installs it locally.
    async fn create_answer(&self) -> Result<String, TransportError>;

    async fn set_remote_description(&self, kind: SdpKind, sdp: String)
    -> Result<(), TransportError>;

    /// Discards a local offer that has not been answered.
    async fn rollback(&self) -> Result<(), TransportError>;

    async fn add_ice_candidate(&self, candidate: String) -> Result<(), TransportError>;

    /// Sends `track` (or nothing) on the video sender.
    async fn replace_video_track(
        &self,
        track: Option<&MediaTrack>,
    ) -> Result<TrackSwap, TransportError>;

    async fn close(&self) -> Result<(), TransportError>;
}

/// Builds transports for new sessions.
#[async_trait]
pub trait TransportFactory: Send + Sync + 'static {
    async fn create(
        &self,
        link: LinkId,
        config: &TransportConfig,
        tracks: &OutboundTracks,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn PeerTransport>, TransportError>;
}
