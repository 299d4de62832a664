use huddle_core::{RoomId, TrackKind};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("room store is unreachable")]
    Unavailable,
    #[error("room {0} does not exist")]
    RoomNotFound(RoomId),
    #[error("participant {0} is not in the room")]
    ParticipantNotFound(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignalingError {
    #[error("signaling relay is closed")]
    RelayClosed,
    #[error("malformed signaling frame: {0}")]
    Malformed(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MediaError {
    #[error("permission to use the {0:?} device was denied")]
    PermissionDenied(TrackKind),
    #[error("no {0:?} device is available")]
    DeviceUnavailable(TrackKind),
    #[error("screen capture was refused or cancelled")]
    ScreenCaptureDenied,
    #[error("no local track of that kind has been acquired")]
    NotAcquired,
    #[error("screen sharing is already active")]
    ScreenShareActive,
    #[error("screen sharing is not active")]
    NoScreenShare,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("negotiation failed: {0}")]
    Negotiation(String),
    #[error("transport is closed")]
    Closed,
    #[error(transparent)]
    WebRtc(#[from] webrtc::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors surfaced to the embedding UI.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("room {0} does not exist")]
    RoomNotFound(RoomId),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Signaling(#[from] SignalingError),
    #[error(transparent)]
    Media(#[from] MediaError),
    #[error("chat messages must not be empty")]
    EmptyMessage,
}
