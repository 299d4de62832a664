use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::media::{MediaTrack, OutboundTracks};
use crate::orchestrator::timer_impl::{TimerFired, TimerKind};
use crate::orchestrator::{
    OrchestratorCommand, OrchestratorHandle, PeerEvent, PeerSession, SessionInfo, SessionState,
};
use crate::signaling::{SignalReceiver, SignalSender};
use crate::transport::{LinkId, TrackSwap, TransportConfig, TransportEvent, TransportFactory};
use huddle_core::{PeerId, Role, SignalBody};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// How long offers from a peer that left are ignored.
pub const DEPARTED_GRACE: Duration = Duration::from_secs(30);

/// Owns every peer session of one joined room.
///
/// All session state lives on a single task; commands, signaling frames,
/// transport events and timers are funneled into [`Orchestrator::run`].
pub struct Orchestrator {
    pub(super) config: ClientConfig,
    pub(super) transport_config: TransportConfig,
    pub(super) factory: Arc<dyn TransportFactory>,
    pub(super) outbound: OutboundTracks,
    pub(super) sessions: HashMap<PeerId, PeerSession>,
    /// Peers currently listed in the room.
    pub(super) present: HashSet<PeerId>,
    /// Peers that left the room recently; late offers from them are ignored.
    pub(super) departed: HashMap<PeerId, Instant>,
    pub(super) signal_tx: SignalSender,
    pub(super) signal_rx: SignalReceiver,
    pub(super) command_rx: mpsc::Receiver<OrchestratorCommand>,
    pub(super) transport_tx: mpsc::Sender<TransportEvent>,
    pub(super) transport_rx: mpsc::Receiver<TransportEvent>,
    pub(super) timer_tx: mpsc::UnboundedSender<TimerFired>,
    pub(super) timer_rx: mpsc::UnboundedReceiver<TimerFired>,
    pub(super) timers: JoinSet<()>,
    pub(super) events: mpsc::UnboundedSender<PeerEvent>,
    next_generation: u64,
}

impl Orchestrator {
    pub fn new(
        config: ClientConfig,
        factory: Arc<dyn TransportFactory>,
        outbound: OutboundTracks,
        signal_tx: SignalSender,
        signal_rx: SignalReceiver,
    ) -> (Self, OrchestratorHandle, mpsc::UnboundedReceiver<PeerEvent>) {
        let (command_tx, command_rx) = mpsc::channel(64);
        let (transport_tx, transport_rx) = mpsc::channel(256);
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        let (events, events_rx) = mpsc::unbounded_channel();

        let orchestrator = Self {
            transport_config: TransportConfig::from(&config),
            config,
            factory,
            outbound,
            sessions: HashMap::new(),
            present: HashSet::new(),
            departed: HashMap::new(),
            signal_tx,
            signal_rx,
            command_rx,
            transport_tx,
            transport_rx,
            timer_tx,
            timer_rx,
            timers: JoinSet::new(),
            events,
            next_generation: 0,
        };
        (orchestrator, OrchestratorHandle::new(command_tx), events_rx)
    }

    pub fn local(&self) -> &PeerId {
        self.signal_tx.local()
    }

    pub async fn run(mut self) {
        info!("Orchestrator for {} started", self.local());

        loop {
            tokio::select! {
                biased;

                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(OrchestratorCommand::Shutdown(ack)) => {
                            self.close_all().await;
                            let _ = ack.send(());
                            break;
                        }
                        Some(c) => self.handle_command(c).await,
                        None => {
                            info!("Command channel closed. Shutting down orchestrator.");
                            self.close_all().await;
                            break;
                        }
                    }
                }

                Some(fired) = self.timer_rx.recv() => self.handle_timer(fired).await,

                Some(evt) = self.transport_rx.recv() => self.handle_transport_event(evt).await,

                Some(msg) = self.signal_rx.recv() => self.handle_signal(msg).await,
            }
        }

        self.timers.abort_all();
        info!("Orchestrator for {} finished", self.local());
    }

    async fn handle_command(&mut self, cmd: OrchestratorCommand) {
        match cmd {
            OrchestratorCommand::PeerJoined(peer_id) => {
                self.present.insert(peer_id.clone());
                self.discover_peer(peer_id).await;
            }

            OrchestratorCommand::ConnectToPeer(peer_id) => {
                info!("Connect requested for {}", peer_id);
                self.discover_peer(peer_id).await;
            }

            OrchestratorCommand::PeerLeft(peer_id) => {
                info!("Peer {} left the room", peer_id);
                self.present.remove(&peer_id);
                if self.sessions.contains_key(&peer_id) {
                    self.say_goodbye(&peer_id).await;
                }
                self.teardown(&peer_id).await;
            }

            OrchestratorCommand::ReplaceVideoTrack(track) => self.replace_video_track(track).await,

            OrchestratorCommand::Sessions(reply) => {
                let mut infos: Vec<SessionInfo> =
                    self.sessions.values().map(PeerSession::info).collect();
                infos.sort_by(|a, b| a.peer_id.cmp(&b.peer_id));
                let _ = reply.send(infos);
            }

            // Handled in `run`.
            OrchestratorCommand::Shutdown(_) => {}
        }
    }

    /// Starts a session for a newly seen peer. The offerer sends an offer
    /// right away; the answerer waits, and promotes itself if nothing arrives.
    async fn discover_peer(&mut self, peer_id: PeerId) {
        if peer_id == *self.local() {
            return;
        }
        self.departed.remove(&peer_id);
        if self.sessions.contains_key(&peer_id) {
            debug!("Already have a session with {}", peer_id);
            return;
        }
        if let Err(e) = self.open_session(&peer_id).await {
            error!("Failed to create transport for {}: {}", peer_id, e);
            return;
        }

        match Role::for_pair(self.local(), &peer_id) {
            Role::Offerer => self.send_offer(&peer_id, false).await,
            Role::Answerer => {
                debug!("Waiting for an offer from {}", peer_id);
                let timeout = self.config.promotion_timeout;
                self.arm_timer(&peer_id, TimerKind::Promotion, timeout);
            }
        }
    }

    pub(super) async fn open_session(&mut self, peer_id: &PeerId) -> Result<(), TransportError> {
        self.next_generation += 1;
        let link = LinkId {
            peer_id: peer_id.clone(),
            generation: self.next_generation,
        };
        let transport = self
            .factory
            .create(
                link.clone(),
                &self.transport_config,
                &self.outbound,
                self.transport_tx.clone(),
            )
            .await?;

        let role = Role::for_pair(self.local(), peer_id);
        let outbound_video = self.outbound.video.as_ref().map(|t| t.id().to_owned());
        info!("New session with {} as {:?}", peer_id, role);
        self.sessions.insert(
            peer_id.clone(),
            PeerSession::new(link, role, transport, outbound_video),
        );
        let _ = self.events.send(PeerEvent::StateChanged {
            peer_id: peer_id.clone(),
            state: SessionState::Idle,
        });
        Ok(())
    }

    pub(super) fn set_state(&mut self, peer_id: &PeerId, state: SessionState) {
        let Some(session) = self.sessions.get_mut(peer_id) else {
            return;
        };
        if session.state == state {
            return;
        }
        info!("Peer {}: {:?} -> {:?}", peer_id, session.state, state);
        session.state = state;
        session.timer_epoch += 1;
        let _ = self.events.send(PeerEvent::StateChanged {
            peer_id: peer_id.clone(),
            state,
        });
    }

    /// Creates an offer, installs it and sends it. Moves an idle or
    /// connected session into `Negotiating`; a reconnecting one stays put.
    pub(super) async fn send_offer(&mut self, peer_id: &PeerId, ice_restart: bool) {
        let Some(session) = self.sessions.get_mut(peer_id) else {
            return;
        };
        let reconnecting = session.state == SessionState::Reconnecting;

        let offer = session.transport.create_offer(ice_restart).await;
        match offer {
            Ok(sdp) => {
                session.local_description = Some(sdp.clone());
                session.awaiting_answer = true;
                if let Err(e) = self.signal_tx.send(peer_id, SignalBody::Offer { sdp }).await {
                    warn!("Failed to send offer to {}: {}", peer_id, e);
                }
            }
            Err(e) => warn!("Failed to create offer for {}: {}", peer_id, e),
        }

        if !reconnecting {
            self.set_state(peer_id, SessionState::Negotiating);
            let timeout = self.config.negotiation_timeout;
            self.arm_timer(peer_id, TimerKind::Negotiation, timeout);
        }
    }

    /// Marks the session connected and sends any offer that was held back.
    pub(super) async fn mark_connected(&mut self, peer_id: &PeerId) {
        self.set_state(peer_id, SessionState::Connected);
        let Some(session) = self.sessions.get_mut(peer_id) else {
            return;
        };
        session.negotiation_attempts = 0;
        session.reconnect_attempts = 0;
        if session.may_initiate() && std::mem::take(&mut session.renegotiate_pending) {
            info!("Renegotiating with {} for a track change", peer_id);
            self.send_offer(peer_id, false).await;
        }
    }

    pub(super) async fn flush_candidates(&mut self, peer_id: &PeerId) {
        let Some(session) = self.sessions.get_mut(peer_id) else {
            return;
        };
        if !session.pending_candidates.is_empty() {
            debug!(
                "Applying {} queued candidates from {}",
                session.pending_candidates.len(),
                peer_id
            );
        }
        while let Some(candidate) = session.pending_candidates.pop_front() {
            if let Err(e) = session.transport.add_ice_candidate(candidate).await {
                warn!("Failed to add ICE candidate for {}: {}", peer_id, e);
            }
        }
    }

    /// Gives up on a session after exhausting its retries.
    pub(super) async fn fail_session(&mut self, peer_id: &PeerId) {
        self.set_state(peer_id, SessionState::Failed);
        self.remove_session(peer_id, SessionState::Failed).await;
    }

    /// Closes the session with a peer. Idempotent.
    ///
    /// A peer that is no longer listed is remembered as departed for a
    /// while; one that is still listed may reconnect at any time.
    pub(super) async fn teardown(&mut self, peer_id: &PeerId) {
        let now = Instant::now();
        self.departed
            .retain(|_, at| now.duration_since(*at) < DEPARTED_GRACE);
        if !self.present.contains(peer_id) {
            self.departed.insert(peer_id.clone(), now);
        }
        if !self.sessions.contains_key(peer_id) {
            return;
        }
        self.set_state(peer_id, SessionState::Closed);
        self.remove_session(peer_id, SessionState::Closed).await;
    }

    pub(super) fn is_departed(&self, peer_id: &PeerId) -> bool {
        self.departed
            .get(peer_id)
            .is_some_and(|at| at.elapsed() < DEPARTED_GRACE)
    }

    /// Tells `peer_id` we are closing and stops listening to its current stream.
    async fn say_goodbye(&mut self, peer_id: &PeerId) {
        if let Err(e) = self.signal_tx.send(peer_id, SignalBody::Bye).await {
            debug!("Could not say goodbye to {}: {}", peer_id, e);
        }
        self.signal_rx.restart(peer_id);
    }

    async fn remove_session(&mut self, peer_id: &PeerId, reason: SessionState) {
        let Some(session) = self.sessions.remove(peer_id) else {
            return;
        };
        if let Some(timer) = &session.timer {
            timer.abort();
        }
        if let Err(e) = session.transport.close().await {
            debug!("Error closing transport for {}: {}", peer_id, e);
        }
        let _ = self.events.send(PeerEvent::Removed {
            peer_id: peer_id.clone(),
            reason,
        });
    }

    async fn close_all(&mut self) {
        let peers: Vec<PeerId> = self.sessions.keys().cloned().collect();
        info!("Closing {} sessions", peers.len());
        for peer_id in peers {
            self.say_goodbye(&peer_id).await;
            self.teardown(&peer_id).await;
        }
    }

    /// Puts `track` on every connection, in place where the transport
    /// allows it and by renegotiating otherwise.
    async fn replace_video_track(&mut self, track: Option<MediaTrack>) {
        let track_id = track.as_ref().map(|t| t.id().to_owned());
        self.outbound.video = track.clone();

        let peers: Vec<PeerId> = self.sessions.keys().cloned().collect();
        for peer_id in peers {
            let Some(session) = self.sessions.get_mut(&peer_id) else {
                continue;
            };
            let swap = session.transport.replace_video_track(track.as_ref()).await;
            match swap {
                Ok(TrackSwap::InPlace) => {
                    debug!("Swapped video for {} in place", peer_id);
                    session.outbound_video = track_id.clone();
                }
                Ok(TrackSwap::NeedsRenegotiation) => {
                    session.outbound_video = track_id.clone();
                    if !session.may_initiate() {
                        warn!(
                            "Video for {} changes once the offerer renegotiates",
                            peer_id
                        );
                        continue;
                    }
                    let state = session.state;
                    match state {
                        SessionState::Connected => self.send_offer(&peer_id, false).await,
                        SessionState::Negotiating | SessionState::Reconnecting => {
                            session.renegotiate_pending = true;
                        }
                        _ => {}
                    }
                }
                Err(e) => warn!("Failed to replace video for {}: {}", peer_id, e),
            }
        }
    }
}
