use async_trait::async_trait;
use huddle_core::PeerId;
use huddle_engine::{
    LinkId, MediaTrack, OutboundTracks, PeerTransport, SdpKind, TrackSwap, TransportConfig,
    TransportError, TransportEvent, TransportFactory,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;

/// Shared switches for every mock connection in a test.
pub struct MockNetwork {
    link_up: AtomicBool,
    in_place_swap: AtomicBool,
    links: Mutex<Vec<Arc<MockLink>>>,
}

impl Default for MockNetwork {
    fn default() -> Self {
        Self {
            link_up: AtomicBool::new(true),
            in_place_swap: AtomicBool::new(true),
            links: Mutex::new(Vec::new()),
        }
    }
}

impl MockNetwork {
    pub fn is_up(&self) -> bool {
        self.link_up.load(Ordering::SeqCst)
    }

    /// Taking the network down reports a lost path on every open connection.
    pub fn set_link_up(&self, up: bool) {
        self.link_up.store(up, Ordering::SeqCst);
        if up {
            return;
        }
        for link in self.links.lock().unwrap().iter() {
            if !link.state().closed {
                link.emit(TransportEvent::PathLost(link.link.clone()));
            }
        }
    }

    pub fn set_in_place_swap(&self, supported: bool) {
        self.in_place_swap.store(supported, Ordering::SeqCst);
    }
}

/// Offer/answer progress of one mock connection.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum MockSignaling {
    #[default]
    Stable,
    HaveLocalOffer,
    HaveRemoteOffer,
}

#[derive(Debug, Default, Clone)]
pub struct MockLinkState {
    pub signaling: MockSignaling,
    pub has_remote_description: bool,
    pub offers: usize,
    pub ice_restarts: usize,
    pub answers: usize,
    pub rollbacks: usize,
    pub candidates: Vec<String>,
    pub audio: Option<String>,
    pub video: Option<String>,
    pub closed: bool,
}

/// Recorded state of one mock connection.
pub struct MockLink {
    pub link: LinkId,
    events: mpsc::Sender<TransportEvent>,
    state: Mutex<MockLinkState>,
}

impl MockLink {
    pub fn state(&self) -> MutexGuard<'_, MockLinkState> {
        self.state.lock().unwrap()
    }

    pub fn snapshot(&self) -> MockLinkState {
        self.state().clone()
    }

    fn emit(&self, event: TransportEvent) {
        let _ = self.events.try_send(event);
    }
}

struct MockTransport {
    link: Arc<MockLink>,
    network: Arc<MockNetwork>,
}

impl MockTransport {
    fn maybe_connect(&self) {
        if self.network.is_up() {
            self.link.emit(TransportEvent::Connected(self.link.link.clone()));
        }
    }
}

fn negotiation(msg: &str) -> TransportError {
    TransportError::Negotiation(msg.to_owned())
}

#[async_trait]
impl PeerTransport for MockTransport {
    async fn create_offer(&self, ice_restart: bool) -> Result<String, TransportError> {
        let (sdp, candidate) = {
            let mut state = self.link.state();
            if state.closed {
                return Err(TransportError::Closed);
            }
            if state.signaling == MockSignaling::HaveRemoteOffer {
                return Err(negotiation("cannot offer while a remote offer is pending"));
            }
            state.signaling = MockSignaling::HaveLocalOffer;
            state.offers += 1;
            if ice_restart {
                state.ice_restarts += 1;
            }
            let sdp = format!(
                "mock-offer #{} audio={:?} video={:?}",
                state.offers, state.audio, state.video
            );
            let candidate = format!(
                r#"{{"candidate":"mock {} {}"}}"#,
                self.link.link.peer_id, state.offers
            );
            (sdp, candidate)
        };
        self.link.emit(TransportEvent::CandidateGenerated(
            self.link.link.clone(),
            candidate,
        ));
        Ok(sdp)
    }

    async fn create_answer(&self) -> Result<String, TransportError> {
        {
            let mut state = self.link.state();
            if state.signaling != MockSignaling::HaveRemoteOffer {
                return Err(negotiation("no remote offer to answer"));
            }
            state.signaling = MockSignaling::Stable;
            state.answers += 1;
        }
        self.maybe_connect();
        Ok("mock-answer".to_owned())
    }

    async fn set_remote_description(
        &self,
        kind: SdpKind,
        _sdp: String,
    ) -> Result<(), TransportError> {
        {
            let mut state = self.link.state();
            state.signaling = match (kind, state.signaling) {
                (SdpKind::Offer, MockSignaling::HaveLocalOffer) => {
                    return Err(negotiation("offer received with a local offer pending"));
                }
                (SdpKind::Offer, _) => MockSignaling::HaveRemoteOffer,
                (SdpKind::Answer, MockSignaling::HaveLocalOffer) => MockSignaling::Stable,
                (SdpKind::Answer, _) => {
                    return Err(negotiation("answer received without a local offer"));
                }
            };
            state.has_remote_description = true;
        }
        if kind == SdpKind::Answer {
            self.maybe_connect();
        }
        Ok(())
    }

    async fn rollback(&self) -> Result<(), TransportError> {
        let mut state = self.link.state();
        if state.signaling == MockSignaling::HaveLocalOffer {
            state.signaling = MockSignaling::Stable;
        }
        state.rollbacks += 1;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: String) -> Result<(), TransportError> {
        let mut state = self.link.state();
        if !state.has_remote_description {
            return Err(negotiation("candidate before remote description"));
        }
        state.candidates.push(candidate);
        Ok(())
    }

    async fn replace_video_track(
        &self,
        track: Option<&MediaTrack>,
    ) -> Result<TrackSwap, TransportError> {
        self.link.state().video = track.map(|t| t.id().to_owned());
        if self.network.in_place_swap.load(Ordering::SeqCst) {
            Ok(TrackSwap::InPlace)
        } else {
            Ok(TrackSwap::NeedsRenegotiation)
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.link.state().closed = true;
        Ok(())
    }
}

/// Hands out mock connections and keeps them for inspection.
pub struct MockTransportFactory {
    network: Arc<MockNetwork>,
    created: Mutex<Vec<Arc<MockLink>>>,
}

impl MockTransportFactory {
    pub fn new(network: Arc<MockNetwork>) -> Self {
        Self {
            network,
            created: Mutex::new(Vec::new()),
        }
    }

    /// Latest connection created towards `peer_id`.
    pub fn link_to(&self, peer_id: &PeerId) -> Option<Arc<MockLink>> {
        self.created
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|l| &l.link.peer_id == peer_id)
            .cloned()
    }

    pub fn link_count(&self, peer_id: &PeerId) -> usize {
        self.created
            .lock()
            .unwrap()
            .iter()
            .filter(|l| &l.link.peer_id == peer_id)
            .count()
    }

    pub fn total_offers(&self) -> usize {
        self.created
            .lock()
            .unwrap()
            .iter()
            .map(|l| l.state().offers)
            .sum()
    }
}

#[async_trait]
impl TransportFactory for MockTransportFactory {
    async fn create(
        &self,
        link: LinkId,
        _config: &TransportConfig,
        tracks: &OutboundTracks,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn PeerTransport>, TransportError> {
        let mock = Arc::new(MockLink {
            link,
            events,
            state: Mutex::new(MockLinkState {
                audio: tracks.audio.as_ref().map(|t| t.id().to_owned()),
                video: tracks.video.as_ref().map(|t| t.id().to_owned()),
                ..Default::default()
            }),
        });
        self.created.lock().unwrap().push(mock.clone());
        self.network.links.lock().unwrap().push(mock.clone());

        Ok(Box::new(MockTransport {
            link: mock,
            network: self.network.clone(),
        }))
    }
}
