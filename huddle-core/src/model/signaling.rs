use crate::model::peer::PeerId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalKind {
    Offer,
    Answer,
    Candidate,
    Bye,
}

/// Typed view of a signaling payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalBody {
    Offer { sdp: String },
    Answer { sdp: String },
    Candidate { candidate: String },
    Bye,
}

impl SignalBody {
    pub fn kind(&self) -> SignalKind {
        match self {
            SignalBody::Offer { .. } => SignalKind::Offer,
            SignalBody::Answer { .. } => SignalKind::Answer,
            SignalBody::Candidate { .. } => SignalKind::Candidate,
            SignalBody::Bye => SignalKind::Bye,
        }
    }
}

/// Wire form of a signaling message.
///
/// `sequence` grows by one per message within a `(from_peer_id, to_peer_id)`
/// pair, starting at 1. The payload is an opaque session description for
/// offers and answers, an opaque candidate descriptor for candidates and
/// empty for `bye`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalMessage {
    #[serde(rename = "type")]
    pub kind: SignalKind,
    pub from_peer_id: PeerId,
    pub to_peer_id: PeerId,
    pub sequence: u64,
    #[serde(default)]
    pub payload: String,
}

impl SignalMessage {
    pub fn new(from: PeerId, to: PeerId, sequence: u64, body: SignalBody) -> Self {
        let kind = body.kind();
        let payload = match body {
            SignalBody::Offer { sdp } | SignalBody::Answer { sdp } => sdp,
            SignalBody::Candidate { candidate } => candidate,
            SignalBody::Bye => String::new(),
        };
        Self {
            kind,
            from_peer_id: from,
            to_peer_id: to,
            sequence,
            payload,
        }
    }

    pub fn body(&self) -> SignalBody {
        match self.kind {
            SignalKind::Offer => SignalBody::Offer {
                sdp: self.payload.clone(),
            },
            SignalKind::Answer => SignalBody::Answer {
                sdp: self.payload.clone(),
            },
            SignalKind::Candidate => SignalBody::Candidate {
                candidate: self.payload.clone(),
            },
            SignalKind::Bye => SignalBody::Bye,
        }
    }
}
