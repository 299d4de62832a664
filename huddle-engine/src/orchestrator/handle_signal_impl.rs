use crate::orchestrator::timer_impl::TimerKind;
use crate::orchestrator::{Orchestrator, SessionState};
use crate::transport::SdpKind;
use huddle_core::{PeerId, SignalBody, SignalMessage};
use tracing::{debug, error, info, warn};

impl Orchestrator {
    pub(super) async fn handle_signal(&mut self, msg: SignalMessage) {
        let from = msg.from_peer_id.clone();

        match msg.body() {
            SignalBody::Offer { sdp } => self.handle_remote_offer(from, sdp).await,
            SignalBody::Answer { sdp } => self.handle_remote_answer(from, sdp).await,
            SignalBody::Candidate { candidate } => {
                self.handle_remote_candidate(from, candidate).await
            }
            SignalBody::Bye => {
                info!("Peer {} said goodbye", from);
                self.signal_tx.restart(&from);
                self.teardown(&from).await;
            }
        }
    }

    async fn handle_remote_offer(&mut self, from: PeerId, sdp: String) {
        if self.is_departed(&from) {
            debug!("Ignoring offer from departed peer {}", from);
            return;
        }
        if !self.sessions.contains_key(&from) {
            if let Err(e) = self.open_session(&from).await {
                error!("Failed to create transport for {}: {}", from, e);
                return;
            }
        }
        let Some(session) = self.sessions.get_mut(&from) else {
            return;
        };

        if session.awaiting_answer {
            if !session.role.is_polite() {
                info!("Ignoring colliding offer from {}", from);
                return;
            }
            info!("Offer collision with {}, rolling back our offer", from);
            if let Err(e) = session.transport.rollback().await {
                warn!("Rollback for {} failed: {}", from, e);
            }
            session.awaiting_answer = false;
            session.local_description = None;
        }

        let applied = session
            .transport
            .set_remote_description(SdpKind::Offer, sdp.clone())
            .await;
        if let Err(e) = applied {
            warn!("Rejecting offer from {}: {}", from, e);
            return;
        }
        session.remote_description = Some(sdp);

        let answer = match session.transport.create_answer().await {
            Ok(answer) => answer,
            Err(e) => {
                warn!("Failed to answer {}: {}", from, e);
                return;
            }
        };
        session.local_description = Some(answer.clone());
        let state = session.state;

        self.flush_candidates(&from).await;
        if let Err(e) = self.signal_tx.send(&from, SignalBody::Answer { sdp: answer }).await {
            warn!("Failed to send answer to {}: {}", from, e);
        }

        match state {
            SessionState::Idle | SessionState::Negotiating => {
                self.set_state(&from, SessionState::Negotiating);
                let timeout = self.config.negotiation_timeout;
                self.arm_timer(&from, TimerKind::Negotiation, timeout);
            }
            SessionState::Connected | SessionState::Reconnecting => {
                debug!("Answered a renegotiation from {}", from);
            }
            SessionState::Failed | SessionState::Closed => {}
        }
    }

    async fn handle_remote_answer(&mut self, from: PeerId, sdp: String) {
        let Some(session) = self.sessions.get_mut(&from) else {
            debug!("Answer from unknown peer {}", from);
            return;
        };
        if !session.awaiting_answer {
            warn!("Discarding unsolicited answer from {}", from);
            return;
        }

        let applied = session
            .transport
            .set_remote_description(SdpKind::Answer, sdp.clone())
            .await;
        if let Err(e) = applied {
            warn!("Rejecting answer from {}: {}", from, e);
            return;
        }
        session.awaiting_answer = false;
        session.remote_description = Some(sdp);
        let state = session.state;

        self.flush_candidates(&from).await;
        if state == SessionState::Negotiating {
            self.mark_connected(&from).await;
        }
    }

    async fn handle_remote_candidate(&mut self, from: PeerId, candidate: String) {
        let Some(session) = self.sessions.get_mut(&from) else {
            debug!("Dropping candidate from unknown peer {}", from);
            return;
        };
        if session.remote_description.is_none() {
            debug!("Queueing candidate from {} until its description arrives", from);
            session.pending_candidates.push_back(candidate);
            return;
        }
        if let Err(e) = session.transport.add_ice_candidate(candidate).await {
            warn!("Failed to add ICE candidate for {}: {}", from, e);
        }
    }
}
