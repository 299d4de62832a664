mod chat;
mod media;
mod peer;
mod room;
mod signaling;

pub use chat::{ChatMessage, ClientToken, NewChatMessage};
pub use media::{MediaConstraints, TrackKind, TrackSource};
pub use peer::{PeerId, Role};
pub use room::{Participant, Room, RoomId, StatusPatch};
pub use signaling::{IceServerConfig, SignalBody, SignalKind, SignalMessage};
