use crate::orchestrator::{Orchestrator, SessionState};
use huddle_core::PeerId;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimerKind {
    /// An answerer waited long enough for an offer.
    Promotion,
    Negotiation,
    /// Time for the next reconnection attempt.
    Reconnect,
}

#[derive(Debug)]
pub(crate) struct TimerFired {
    peer_id: PeerId,
    epoch: u64,
    kind: TimerKind,
}

impl Orchestrator {
    /// Arms the session's single timer, replacing whatever was armed before.
    pub(super) fn arm_timer(&mut self, peer_id: &PeerId, kind: TimerKind, delay: Duration) {
        let Some(session) = self.sessions.get_mut(peer_id) else {
            return;
        };
        session.timer_epoch += 1;
        if let Some(previous) = session.timer.take() {
            previous.abort();
        }
        let fired = TimerFired {
            peer_id: peer_id.clone(),
            epoch: session.timer_epoch,
            kind,
        };

        while self.timers.try_join_next().is_some() {}
        let tx = self.timer_tx.clone();
        let handle = self.timers.spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(fired);
        });
        session.timer = Some(handle);
    }

    pub(super) async fn handle_timer(&mut self, fired: TimerFired) {
        let peer_id = fired.peer_id;
        let Some(session) = self.sessions.get_mut(&peer_id) else {
            return;
        };
        if session.timer_epoch != fired.epoch {
            return;
        }

        match (fired.kind, session.state) {
            (TimerKind::Promotion, SessionState::Idle) => {
                warn!(
                    "No offer from {} within {:?}, taking over as offerer",
                    peer_id, self.config.promotion_timeout
                );
                session.promoted = true;
                self.send_offer(&peer_id, false).await;
            }

            (TimerKind::Negotiation, SessionState::Negotiating) => {
                session.negotiation_attempts += 1;
                let attempts = session.negotiation_attempts;
                if attempts >= self.config.max_negotiation_attempts {
                    warn!(
                        "Negotiation with {} timed out {} times, giving up",
                        peer_id, attempts
                    );
                    self.fail_session(&peer_id).await;
                    return;
                }

                if session.may_initiate() {
                    info!("Negotiation with {} timed out, sending a fresh offer", peer_id);
                    self.send_offer(&peer_id, true).await;
                } else {
                    debug!("Negotiation with {} timed out, still waiting", peer_id);
                    let timeout = self.config.negotiation_timeout;
                    self.arm_timer(&peer_id, TimerKind::Negotiation, timeout);
                }
            }

            (TimerKind::Reconnect, SessionState::Reconnecting) => {
                if session.reconnect_attempts >= self.config.max_reconnect_attempts {
                    warn!(
                        "Could not reconnect to {} after {} attempts",
                        peer_id, session.reconnect_attempts
                    );
                    self.fail_session(&peer_id).await;
                    return;
                }
                session.reconnect_attempts += 1;
                let attempt = session.reconnect_attempts;
                info!(
                    "Reconnect attempt {}/{} for {}",
                    attempt, self.config.max_reconnect_attempts, peer_id
                );
                self.restart_path(&peer_id).await;
                let delay = self.config.reconnect_backoff.delay(attempt);
                self.arm_timer(&peer_id, TimerKind::Reconnect, delay);
            }

            (kind, state) => debug!("Ignoring {:?} timer for {} in {:?}", kind, peer_id, state),
        }
    }
}
