use huddle_core::{PeerId, SignalKind, SignalMessage};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Out-of-order messages buffered per sender before a gap is given up on.
pub const REORDER_WINDOW: usize = 64;

struct PairState {
    next: u64,
    buffered: BTreeMap<u64, SignalMessage>,
    /// The previous stream ended; only a new one starting at 1 is accepted.
    closed: bool,
}

impl PairState {
    fn new() -> Self {
        Self {
            next: 1,
            buffered: BTreeMap::new(),
            closed: false,
        }
    }

    fn close(&mut self) {
        self.buffered.clear();
        self.closed = true;
    }

    fn drain_ready(&mut self, ready: &mut Vec<SignalMessage>) {
        while let Some(msg) = self.buffered.remove(&self.next) {
            self.next += 1;
            let bye = msg.kind == SignalKind::Bye;
            ready.push(msg);
            if bye {
                self.close();
                return;
            }
        }
    }
}

/// Restores per-sender order and drops duplicates, using the sequence
/// number each sender stamps on its messages.
///
/// A `bye` ends the sender's stream: anything after it is dropped until the
/// sender starts over at sequence 1.
#[derive(Default)]
pub struct InboundSequencer {
    pairs: HashMap<PeerId, PairState>,
}

impl InboundSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts one message and returns every message that is now deliverable, in order.
    pub fn admit(&mut self, msg: SignalMessage) -> Vec<SignalMessage> {
        let from = msg.from_peer_id.clone();
        let state = self.pairs.entry(from.clone()).or_insert_with(PairState::new);

        if state.closed {
            if msg.sequence != 1 {
                debug!(
                    "Dropping {:?} #{} from the closed stream of {}",
                    msg.kind, msg.sequence, from
                );
                return Vec::new();
            }
            debug!("{} started a new signaling stream", from);
            *state = PairState::new();
        }

        if msg.sequence < state.next || state.buffered.contains_key(&msg.sequence) {
            debug!(
                "Dropping duplicate {:?} #{} from {}",
                msg.kind, msg.sequence, from
            );
            return Vec::new();
        }

        state.buffered.insert(msg.sequence, msg);
        let mut ready = Vec::new();
        state.drain_ready(&mut ready);

        if ready.is_empty() && state.buffered.len() > REORDER_WINDOW {
            if let Some(&first) = state.buffered.keys().next() {
                warn!(
                    "Gap {}..{} from {} never filled, skipping ahead",
                    state.next, first, from
                );
                state.next = first;
                state.drain_ready(&mut ready);
            }
        }
        ready
    }

    /// Ends the stream from `peer` locally, as if its `bye` had arrived.
    pub fn close(&mut self, peer: &PeerId) {
        self.pairs
            .entry(peer.clone())
            .or_insert_with(PairState::new)
            .close();
    }

    /// Next sequence number expected from `peer`.
    pub fn expected(&self, peer: &PeerId) -> u64 {
        self.pairs.get(peer).map_or(1, |s| s.next)
    }
}
