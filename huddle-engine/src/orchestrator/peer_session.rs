use crate::transport::{LinkId, PeerTransport};
use huddle_core::{PeerId, Role};
use std::collections::VecDeque;
use tokio::task::AbortHandle;

/// Lifecycle of the connection to one remote peer.
///
/// ```text
/// Idle -> Negotiating -> Connected <-> Reconnecting
///              |                            |
///              +---------> Failed <---------+
/// ```
/// Any state can move to `Closed` when either side leaves. `Failed` and
/// `Closed` are terminal; the session is dropped right after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Idle,
    Negotiating,
    Connected,
    Reconnecting,
    Failed,
    Closed,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Failed | SessionState::Closed)
    }
}

/// Read-only view of a session for callers outside the orchestrator loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub peer_id: PeerId,
    pub role: Role,
    pub state: SessionState,
    /// Set when an answerer took over the offerer role after waiting in vain.
    pub promoted: bool,
    /// Id of the local video track currently sent on this connection.
    pub outbound_video: Option<String>,
    pub pending_candidates: usize,
    pub has_remote_description: bool,
}

pub struct PeerSession {
    pub peer_id: PeerId,
    pub role: Role,
    pub state: SessionState,
    pub link: LinkId,
    pub transport: Box<dyn PeerTransport>,
    pub local_description: Option<String>,
    pub remote_description: Option<String>,
    /// Remote candidates that arrived before the remote description.
    pub pending_candidates: VecDeque<String>,
    pub outbound_video: Option<String>,
    /// A local offer is out and unanswered.
    pub awaiting_answer: bool,
    pub promoted: bool,
    pub negotiation_attempts: u32,
    pub reconnect_attempts: u32,
    /// A track change is waiting for the next offer.
    pub renegotiate_pending: bool,
    /// Bumped on every state change and timer arm; stale timers carry an older value.
    pub timer_epoch: u64,
    pub timer: Option<AbortHandle>,
}

impl PeerSession {
    pub fn new(
        link: LinkId,
        role: Role,
        transport: Box<dyn PeerTransport>,
        outbound_video: Option<String>,
    ) -> Self {
        Self {
            peer_id: link.peer_id.clone(),
            role,
            state: SessionState::Idle,
            link,
            transport,
            local_description: None,
            remote_description: None,
            pending_candidates: VecDeque::new(),
            outbound_video,
            awaiting_answer: false,
            promoted: false,
            negotiation_attempts: 0,
            reconnect_attempts: 0,
            renegotiate_pending: false,
            timer_epoch: 0,
            timer: None,
        }
    }

    /// Whether this side sends offers for the pair.
    pub fn may_initiate(&self) -> bool {
        self.role == Role::Offerer || self.promoted
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            peer_id: self.peer_id.clone(),
            role: self.role,
            state: self.state,
            promoted: self.promoted,
            outbound_video: self.outbound_video.clone(),
            pending_candidates: self.pending_candidates.len(),
            has_remote_description: self.remote_description.is_some(),
        }
    }
}
