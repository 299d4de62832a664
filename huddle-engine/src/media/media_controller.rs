use crate::error::MediaError;
use crate::media::{MediaDevices, MediaTrack};
use huddle_core::{MediaConstraints, TrackKind};
use std::sync::Arc;
use tracing::{info, warn};

/// The tracks each new connection should send.
#[derive(Debug, Clone, Default)]
pub struct OutboundTracks {
    pub audio: Option<MediaTrack>,
    pub video: Option<MediaTrack>,
}

/// Owns the local capture tracks.
///
/// The camera stays open while a screen share occupies the outbound video
/// slot, so stopping the share hands back the very same camera track.
pub struct MediaController {
    devices: Arc<dyn MediaDevices>,
    microphone: Option<MediaTrack>,
    camera: Option<MediaTrack>,
    screen: Option<MediaTrack>,
}

impl MediaController {
    pub fn new(devices: Arc<dyn MediaDevices>) -> Self {
        Self {
            devices,
            microphone: None,
            camera: None,
            screen: None,
        }
    }

    /// Opens the requested devices. Failures are returned, not raised: a
    /// participant without a camera can still join with audio, or with nothing.
    pub async fn acquire(&mut self, constraints: MediaConstraints) -> Vec<MediaError> {
        let mut errors = Vec::new();

        if constraints.audio && self.microphone.is_none() {
            match self.devices.capture(TrackKind::Audio).await {
                Ok(track) => self.microphone = Some(track),
                Err(e) => {
                    warn!("Joining without audio: {}", e);
                    errors.push(e);
                }
            }
        }
        if constraints.video && self.camera.is_none() {
            match self.devices.capture(TrackKind::Video).await {
                Ok(track) => self.camera = Some(track),
                Err(e) => {
                    warn!("Joining without video: {}", e);
                    errors.push(e);
                }
            }
        }

        errors
    }

    pub fn microphone(&self) -> Option<&MediaTrack> {
        self.microphone.as_ref()
    }

    pub fn camera(&self) -> Option<&MediaTrack> {
        self.camera.as_ref()
    }

    pub fn screen(&self) -> Option<&MediaTrack> {
        self.screen.as_ref()
    }

    pub fn is_screen_sharing(&self) -> bool {
        self.screen.is_some()
    }

    pub fn audio_enabled(&self) -> bool {
        self.microphone.as_ref().is_some_and(MediaTrack::is_enabled)
    }

    pub fn video_enabled(&self) -> bool {
        self.camera.as_ref().is_some_and(MediaTrack::is_enabled)
    }

    pub fn set_audio_enabled(&mut self, enabled: bool) -> Result<(), MediaError> {
        let track = self.microphone.as_ref().ok_or(MediaError::NotAcquired)?;
        track.set_enabled(enabled);
        info!("Microphone {}", if enabled { "unmuted" } else { "muted" });
        Ok(())
    }

    pub fn set_video_enabled(&mut self, enabled: bool) -> Result<(), MediaError> {
        let track = self.camera.as_ref().ok_or(MediaError::NotAcquired)?;
        track.set_enabled(enabled);
        info!("Camera {}", if enabled { "on" } else { "off" });
        Ok(())
    }

    /// Flips the microphone and returns whether it is now enabled.
    pub fn toggle_audio(&mut self) -> Result<bool, MediaError> {
        let enabled = !self.audio_enabled();
        self.set_audio_enabled(enabled)?;
        Ok(enabled)
    }

    pub fn toggle_video(&mut self) -> Result<bool, MediaError> {
        let enabled = !self.video_enabled();
        self.set_video_enabled(enabled)?;
        Ok(enabled)
    }

    /// Captures a screen track. The caller substitutes it for the camera on
    /// every connection.
    pub async fn start_screen_share(&mut self) -> Result<MediaTrack, MediaError> {
        if self.screen.is_some() {
            return Err(MediaError::ScreenShareActive);
        }
        let track = self.devices.capture_screen().await?;
        info!("Screen share started ({})", track.label());
        self.screen = Some(track.clone());
        Ok(track)
    }

    /// Stops the share and returns the camera track to send in its place.
    pub fn stop_screen_share(&mut self) -> Result<Option<MediaTrack>, MediaError> {
        let screen = self.screen.take().ok_or(MediaError::NoScreenShare)?;
        screen.stop();
        info!("Screen share stopped");
        Ok(self.camera.clone())
    }

    /// Clears a share that the capture source ended on its own.
    ///
    /// Returns `None` when `track` is no longer the active share.
    pub fn screen_share_ended(&mut self, track: &MediaTrack) -> Option<Option<MediaTrack>> {
        if !self.screen.as_ref().is_some_and(|s| s.same_as(track)) {
            return None;
        }
        self.screen = None;
        info!("Screen share ended by the capture source");
        Some(self.camera.clone())
    }

    pub fn outbound(&self) -> OutboundTracks {
        OutboundTracks {
            audio: self.microphone.clone(),
            video: self.screen.clone().or_else(|| self.camera.clone()),
        }
    }

    /// Releases every device.
    pub fn cleanup(&mut self) {
        for track in [self.screen.take(), self.camera.take(), self.microphone.take()]
            .into_iter()
            .flatten()
        {
            track.stop();
        }
    }
}

impl Drop for MediaController {
    fn drop(&mut self) {
        self.cleanup();
    }
}
