use crate::chat::ChatEntry;
use crate::error::MediaError;
use crate::orchestrator::PeerEvent;
use huddle_core::Participant;
use std::time::Duration;

/// Everything the UI layer needs to render a joined room.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    /// The full participant list, sent whenever it changes.
    Roster(Vec<Participant>),
    ParticipantJoined(Participant),
    ParticipantLeft(Participant),
    /// Mute or camera state of a participant changed.
    ParticipantUpdated(Participant),
    Peer(PeerEvent),
    ChatUpdated(Vec<ChatEntry>),
    StoreReconnecting { attempt: u32, delay: Duration },
    StoreRestored,
    RoomClosed,
    /// The capture source ended the share; the camera is back.
    ScreenShareEnded,
    /// A device could not be opened; the room works without it.
    MediaUnavailable(MediaError),
}
