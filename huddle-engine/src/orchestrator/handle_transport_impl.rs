use crate::orchestrator::timer_impl::TimerKind;
use crate::orchestrator::{Orchestrator, PeerEvent, SessionState};
use crate::transport::TransportEvent;
use huddle_core::{PeerId, SignalBody};
use tracing::{debug, info, warn};

impl Orchestrator {
    pub(super) async fn handle_transport_event(&mut self, event: TransportEvent) {
        let link = event.link().clone();
        let Some(session) = self.sessions.get(&link.peer_id) else {
            debug!("Transport event for unknown peer {}", link.peer_id);
            return;
        };
        if session.link != link {
            debug!("Dropping event from a stale connection to {}", link.peer_id);
            return;
        }
        let state = session.state;
        let awaiting_answer = session.awaiting_answer;
        let peer_id = link.peer_id;

        match event {
            TransportEvent::CandidateGenerated(_, candidate) => {
                let body = SignalBody::Candidate { candidate };
                if let Err(e) = self.signal_tx.send(&peer_id, body).await {
                    warn!("Failed to send ICE candidate to {}: {}", peer_id, e);
                }
            }

            TransportEvent::Connected(_) => match state {
                SessionState::Negotiating if !awaiting_answer => {
                    self.mark_connected(&peer_id).await;
                }
                SessionState::Reconnecting => {
                    info!("Network path to {} restored", peer_id);
                    self.mark_connected(&peer_id).await;
                }
                _ => {}
            },

            TransportEvent::PathLost(_) => {
                if state == SessionState::Connected {
                    self.begin_reconnect(&peer_id).await;
                }
            }

            TransportEvent::Closed(_) => {
                if !state.is_terminal() {
                    warn!("Connection to {} closed underneath us", peer_id);
                    self.fail_session(&peer_id).await;
                }
            }

            TransportEvent::RemoteTrack(_, track) => {
                let _ = self.events.send(PeerEvent::RemoteTrack { peer_id, track });
            }
        }
    }

    async fn begin_reconnect(&mut self, peer_id: &PeerId) {
        warn!("Lost the network path to {}, reconnecting", peer_id);
        self.set_state(peer_id, SessionState::Reconnecting);
        if let Some(session) = self.sessions.get_mut(peer_id) {
            session.reconnect_attempts = 1;
        }
        self.restart_path(peer_id).await;
        let delay = self.config.reconnect_backoff.delay(1);
        self.arm_timer(peer_id, TimerKind::Reconnect, delay);
    }

    /// Sends an ICE-restart offer if this side initiates for the pair;
    /// otherwise the restart offer is expected from the remote side.
    pub(super) async fn restart_path(&mut self, peer_id: &PeerId) {
        let may_initiate = self
            .sessions
            .get(peer_id)
            .is_some_and(|s| s.may_initiate());
        if may_initiate {
            self.send_offer(peer_id, true).await;
        } else {
            debug!("Waiting for {} to restart the path", peer_id);
        }
    }
}
