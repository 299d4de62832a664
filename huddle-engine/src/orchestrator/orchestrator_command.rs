use crate::media::MediaTrack;
use crate::orchestrator::SessionInfo;
use huddle_core::PeerId;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// Requests from the rest of the client into the orchestrator loop.
#[derive(Debug)]
pub enum OrchestratorCommand {
    /// A participant appeared in the room document.
    PeerJoined(PeerId),

    /// A participant left the room document.
    PeerLeft(PeerId),

    /// Explicit connect request; same as discovery but also revives a failed peer.
    ConnectToPeer(PeerId),

    /// Send this track (or no video) on every connection.
    ReplaceVideoTrack(Option<MediaTrack>),

    Sessions(oneshot::Sender<Vec<SessionInfo>>),

    /// Say goodbye to every peer and stop. Acknowledged once done.
    Shutdown(oneshot::Sender<()>),
}

/// Cloneable handle to a running orchestrator.
///
/// Every method is a no-op once the orchestrator has stopped.
#[derive(Debug, Clone)]
pub struct OrchestratorHandle {
    tx: mpsc::Sender<OrchestratorCommand>,
}

impl OrchestratorHandle {
    pub(crate) fn new(tx: mpsc::Sender<OrchestratorCommand>) -> Self {
        Self { tx }
    }

    pub async fn peer_joined(&self, peer_id: PeerId) {
        self.send(OrchestratorCommand::PeerJoined(peer_id)).await;
    }

    pub async fn peer_left(&self, peer_id: PeerId) {
        self.send(OrchestratorCommand::PeerLeft(peer_id)).await;
    }

    pub async fn connect_to_peer(&self, peer_id: PeerId) {
        self.send(OrchestratorCommand::ConnectToPeer(peer_id)).await;
    }

    pub async fn replace_video_track(&self, track: Option<MediaTrack>) {
        self.send(OrchestratorCommand::ReplaceVideoTrack(track))
            .await;
    }

    /// Snapshot of every live session, ordered by peer id.
    pub async fn sessions(&self) -> Vec<SessionInfo> {
        let (tx, rx) = oneshot::channel();
        self.send(OrchestratorCommand::Sessions(tx)).await;
        rx.await.unwrap_or_default()
    }

    pub async fn shutdown(&self) {
        let (tx, rx) = oneshot::channel();
        self.send(OrchestratorCommand::Shutdown(tx)).await;
        let _ = rx.await;
    }

    pub fn is_running(&self) -> bool {
        !self.tx.is_closed()
    }

    async fn send(&self, cmd: OrchestratorCommand) {
        if let Err(e) = self.tx.send(cmd).await {
            debug!("Orchestrator is gone, dropping {:?}", e.0);
        }
    }
}
