use crate::error::MediaError;
use crate::media::MediaTrack;
use async_trait::async_trait;
use dashmap::DashMap;
use huddle_core::{TrackKind, TrackSource};
use tracing::info;

/// Capture primitives supplied by the host environment.
#[async_trait]
pub trait MediaDevices: Send + Sync + 'static {
    /// Opens the microphone or the camera.
    async fn capture(&self, kind: TrackKind) -> Result<MediaTrack, MediaError>;

    /// Asks the user for a screen or window to share.
    async fn capture_screen(&self) -> Result<MediaTrack, MediaError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceAccess {
    Granted,
    Denied,
    Missing,
}

/// Devices with a fixed grant/deny policy, for headless clients.
///
/// Counts every capture so callers can verify a device is opened once.
pub struct StaticDevices {
    microphone: DeviceAccess,
    camera: DeviceAccess,
    screen: DeviceAccess,
    captures: DashMap<TrackSource, usize>,
}

impl Default for StaticDevices {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticDevices {
    pub fn new() -> Self {
        Self {
            microphone: DeviceAccess::Granted,
            camera: DeviceAccess::Granted,
            screen: DeviceAccess::Granted,
            captures: DashMap::new(),
        }
    }

    pub fn with_microphone(mut self, access: DeviceAccess) -> Self {
        self.microphone = access;
        self
    }

    pub fn with_camera(mut self, access: DeviceAccess) -> Self {
        self.camera = access;
        self
    }

    pub fn with_screen(mut self, access: DeviceAccess) -> Self {
        self.screen = access;
        self
    }

    pub fn capture_count(&self, source: TrackSource) -> usize {
        self.captures.get(&source).map_or(0, |n| *n)
    }

    fn open(&self, source: TrackSource, access: DeviceAccess) -> Result<MediaTrack, MediaError> {
        match access {
            DeviceAccess::Granted => {
                *self.captures.entry(source).or_insert(0) += 1;
                info!("Opened {:?} device", source);
                Ok(MediaTrack::new(source, format!("{source:?}")))
            }
            DeviceAccess::Denied if source == TrackSource::Screen => {
                Err(MediaError::ScreenCaptureDenied)
            }
            DeviceAccess::Denied => Err(MediaError::PermissionDenied(source.kind())),
            DeviceAccess::Missing => Err(MediaError::DeviceUnavailable(source.kind())),
        }
    }
}

#[async_trait]
impl MediaDevices for StaticDevices {
    async fn capture(&self, kind: TrackKind) -> Result<MediaTrack, MediaError> {
        match kind {
            TrackKind::Audio => self.open(TrackSource::Microphone, self.microphone),
            TrackKind::Video => self.open(TrackSource::Camera, self.camera),
        }
    }

    async fn capture_screen(&self) -> Result<MediaTrack, MediaError> {
        self.open(TrackSource::Screen, self.screen)
    }
}
