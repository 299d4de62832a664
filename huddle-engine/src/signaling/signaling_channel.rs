use crate::error::SignalingError;
use crate::signaling::{InboundSequencer, SignalRelay};
use huddle_core::{PeerId, RoomId, SignalBody, SignalMessage};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Per-room signaling endpoint of one local peer.
pub struct SignalingChannel;

impl SignalingChannel {
    /// Subscribes `local` in `room_id` and returns the two halves.
    pub async fn open(
        relay: Arc<dyn SignalRelay>,
        room_id: RoomId,
        local: PeerId,
    ) -> Result<(SignalSender, SignalReceiver), SignalingError> {
        let frames = relay.subscribe(&room_id, &local).await?;

        let sender = SignalSender {
            relay,
            room_id,
            local: local.clone(),
            next_sequence: HashMap::new(),
        };
        let receiver = SignalReceiver {
            frames,
            local,
            sequencer: InboundSequencer::new(),
            ready: VecDeque::new(),
        };
        Ok((sender, receiver))
    }
}

/// Stamps outgoing messages with a per-destination sequence number.
pub struct SignalSender {
    relay: Arc<dyn SignalRelay>,
    room_id: RoomId,
    local: PeerId,
    next_sequence: HashMap<PeerId, u64>,
}

impl SignalSender {
    pub fn local(&self) -> &PeerId {
        &self.local
    }

    /// Sends `body` to `to` and returns the sequence number used.
    ///
    /// A `bye` closes the stream to `to`; the next message starts over at 1.
    pub async fn send(&mut self, to: &PeerId, body: SignalBody) -> Result<u64, SignalingError> {
        let counter = self.next_sequence.entry(to.clone()).or_insert(0);
        *counter += 1;
        let sequence = *counter;
        if body == SignalBody::Bye {
            self.next_sequence.remove(to);
        }

        let msg = SignalMessage::new(self.local.clone(), to.clone(), sequence, body);
        let frame =
            serde_json::to_string(&msg).map_err(|e| SignalingError::Malformed(e.to_string()))?;

        debug!("-> {:?} #{} to {}", msg.kind, sequence, to);
        self.relay.publish(&self.room_id, to, frame).await?;
        Ok(sequence)
    }

    /// Starts a new stream to `to` after it said goodbye to us.
    pub fn restart(&mut self, to: &PeerId) {
        self.next_sequence.remove(to);
    }
}

/// Decodes, validates and orders incoming frames. Malformed, misaddressed
/// and duplicate frames are logged and dropped.
pub struct SignalReceiver {
    frames: mpsc::UnboundedReceiver<String>,
    local: PeerId,
    sequencer: InboundSequencer,
    ready: VecDeque<SignalMessage>,
}

impl SignalReceiver {
    /// Next in-order message. Cancel safe. `None` once the relay is gone.
    pub async fn recv(&mut self) -> Option<SignalMessage> {
        loop {
            if let Some(msg) = self.ready.pop_front() {
                return Some(msg);
            }
            let frame = self.frames.recv().await?;
            if let Err(e) = self.accept(&frame) {
                warn!("Discarding signaling frame for {}: {}", self.local, e);
            }
        }
    }

    /// Drops whatever is still in flight from `peer` on its current stream.
    pub fn restart(&mut self, peer: &PeerId) {
        self.ready.retain(|m| &m.from_peer_id != peer);
        self.sequencer.close(peer);
    }

    fn accept(&mut self, frame: &str) -> Result<(), SignalingError> {
        let msg: SignalMessage =
            serde_json::from_str(frame).map_err(|e| SignalingError::Malformed(e.to_string()))?;

        if msg.to_peer_id != self.local {
            return Err(SignalingError::Malformed(format!(
                "addressed to {}",
                msg.to_peer_id
            )));
        }
        if msg.from_peer_id == self.local {
            return Err(SignalingError::Malformed("sent by ourselves".into()));
        }

        self.ready.extend(self.sequencer.admit(msg));
        Ok(())
    }
}
