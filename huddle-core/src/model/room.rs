use crate::model::peer::PeerId;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RoomId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for RoomId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One entry of a room's participant list. `uid` is unique within a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub uid: String,
    pub display_name: String,
    #[serde(rename = "photoURL")]
    pub photo_url: String,
    pub peer_id: PeerId,
    /// Client clock at join time, informational only.
    pub joined_at: u64,
    pub is_muted: bool,
    pub is_video_off: bool,
    /// Store clock of the last heartbeat.
    #[serde(default)]
    pub last_seen: u64,
}

/// Partial status update. Only `Some` fields are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_muted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_video_off: Option<bool>,
}

impl StatusPatch {
    pub fn muted(is_muted: bool) -> Self {
        Self {
            is_muted: Some(is_muted),
            ..Default::default()
        }
    }

    pub fn video_off(is_video_off: bool) -> Self {
        Self {
            is_video_off: Some(is_video_off),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.is_muted.is_none() && self.is_video_off.is_none()
    }

    /// Merges the provided fields into `participant`. Returns whether anything changed.
    pub fn apply(&self, participant: &mut Participant) -> bool {
        let before = (participant.is_muted, participant.is_video_off);
        if let Some(muted) = self.is_muted {
            participant.is_muted = muted;
        }
        if let Some(off) = self.is_video_off {
            participant.is_video_off = off;
        }
        before != (participant.is_muted, participant.is_video_off)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: RoomId,
    pub host_id: String,
    pub name: String,
    pub created_at: u64,
    /// Ordered by join.
    pub participants: Vec<Participant>,
}

impl Room {
    pub fn participant(&self, uid: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.uid == uid)
    }

    pub fn participant_by_peer(&self, peer_id: &PeerId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.peer_id == peer_id)
    }

    pub fn contains(&self, uid: &str) -> bool {
        self.participant(uid).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}
