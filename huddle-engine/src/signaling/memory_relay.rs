use crate::error::SignalingError;
use crate::signaling::SignalRelay;
use async_trait::async_trait;
use dashmap::DashMap;
use huddle_core::{PeerId, RoomId};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Frames kept for a peer that has not subscribed yet (or went away).
pub const MAX_HELD_FRAMES: usize = 256;

enum Mailbox {
    Held(Vec<String>),
    Open(mpsc::UnboundedSender<String>),
}

/// In-process relay keyed by `(room, peer)`.
///
/// With duplicate delivery enabled every frame is handed over twice, which
/// is allowed by the at-least-once contract.
#[derive(Default)]
pub struct MemorySignalRelay {
    mailboxes: DashMap<(RoomId, PeerId), Mailbox>,
    duplicate_delivery: AtomicBool,
}

impl MemorySignalRelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_duplicate_delivery(self) -> Self {
        self.duplicate_delivery.store(true, Ordering::SeqCst);
        self
    }

    fn hold(frames: &mut Vec<String>, frame: String, to: &PeerId) {
        if frames.len() >= MAX_HELD_FRAMES {
            warn!("Mailbox for {} is full, dropping oldest frame", to);
            frames.remove(0);
        }
        frames.push(frame);
    }
}

#[async_trait]
impl SignalRelay for MemorySignalRelay {
    async fn publish(
        &self,
        room_id: &RoomId,
        to: &PeerId,
        frame: String,
    ) -> Result<(), SignalingError> {
        let copies = if self.duplicate_delivery.load(Ordering::SeqCst) {
            2
        } else {
            1
        };

        let mut mailbox = self
            .mailboxes
            .entry((room_id.clone(), to.clone()))
            .or_insert_with(|| Mailbox::Held(Vec::new()));

        for _ in 0..copies {
            match &mut *mailbox {
                Mailbox::Open(tx) => {
                    if let Err(mpsc::error::SendError(frame)) = tx.send(frame.clone()) {
                        debug!("Subscriber {} went away, holding frames", to);
                        let mut held = Vec::new();
                        Self::hold(&mut held, frame, to);
                        *mailbox = Mailbox::Held(held);
                    }
                }
                Mailbox::Held(frames) => Self::hold(frames, frame.clone(), to),
            }
        }
        Ok(())
    }

    async fn subscribe(
        &self,
        room_id: &RoomId,
        local: &PeerId,
    ) -> Result<mpsc::UnboundedReceiver<String>, SignalingError> {
        let (tx, rx) = mpsc::unbounded_channel();

        let previous = self
            .mailboxes
            .insert((room_id.clone(), local.clone()), Mailbox::Open(tx.clone()));

        if let Some(Mailbox::Held(frames)) = previous {
            debug!("Flushing {} held frames to {}", frames.len(), local);
            for frame in frames {
                tx.send(frame).map_err(|_| SignalingError::RelayClosed)?;
            }
        }
        Ok(rx)
    }
}
