use crate::error::TransportError;
use crate::media::{MediaTrack, OutboundTracks};
use crate::transport::{
    LinkId, PeerTransport, RemoteTrackInfo, SdpKind, TrackSwap, TransportConfig, TransportEvent,
    TransportFactory,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use huddle_core::{TrackKind, TrackSource};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, trace};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::offer_answer_options::RTCOfferOptions;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;
use webrtc::track::track_local::TrackLocal;

/// A [`PeerTransport`] backed by a webrtc-rs peer connection.
pub struct WebRtcTransport {
    link: LinkId,
    peer_connection: Arc<RTCPeerConnection>,
    video_sender: Arc<RTCRtpSender>,
}

impl WebRtcTransport {
    /// Builds the peer connection, attaches the outbound tracks and wires
    /// its callbacks into `event_tx`.
    pub async fn new(
        link: LinkId,
        config: &TransportConfig,
        tracks: &OutboundTracks,
        event_tx: mpsc::Sender<TransportEvent>,
    ) -> Result<Self> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: config
                .ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);

        // Both m-lines are always present so a later substitution never needs
        // a new one; a placeholder stands in for a missing device.
        let audio = tracks
            .audio
            .clone()
            .unwrap_or_else(|| MediaTrack::new(TrackSource::Microphone, "placeholder"));
        let video = tracks
            .video
            .clone()
            .unwrap_or_else(|| MediaTrack::new(TrackSource::Camera, "placeholder"));
        add_sender(&peer_connection, &audio).await?;
        let video_sender = add_sender(&peer_connection, &video).await?;

        let state_tx = event_tx.clone();
        let state_link = link.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                let link = state_link.clone();

                Box::pin(async move {
                    info!("Connection state for {}: {:?}", link.peer_id, s);
                    let event = match s {
                        RTCPeerConnectionState::Connected => TransportEvent::Connected(link),
                        RTCPeerConnectionState::Disconnected | RTCPeerConnectionState::Failed => {
                            TransportEvent::PathLost(link)
                        }
                        RTCPeerConnectionState::Closed => TransportEvent::Closed(link),
                        _ => return,
                    };
                    let _ = tx.send(event).await;
                })
            },
        ));

        let ice_tx = event_tx.clone();
        let ice_link = link.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            let link = ice_link.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(json_candidate) = candidate.to_json() else {
                    return;
                };
                let Ok(str_candidate) = serde_json::to_string(&json_candidate) else {
                    return;
                };
                let _ = tx
                    .send(TransportEvent::CandidateGenerated(link, str_candidate))
                    .await;
            })
        }));

        let track_tx = event_tx;
        let track_link = link.clone();
        peer_connection.on_track(Box::new(move |track, _receiver, _transceiver| {
            let tx = track_tx.clone();
            let link = track_link.clone();

            Box::pin(async move {
                let kind = match track.kind() {
                    RTPCodecType::Audio => TrackKind::Audio,
                    _ => TrackKind::Video,
                };
                let info = RemoteTrackInfo {
                    track_id: track.id(),
                    stream_id: track.stream_id(),
                    kind,
                };
                debug!("Remote {:?} track {} from {}", kind, info.track_id, link.peer_id);
                let _ = tx.send(TransportEvent::RemoteTrack(link, info)).await;

                // The handler must return promptly; reading happens elsewhere.
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 1500];
                    while track.read(&mut buf).await.is_ok() {}
                    trace!("Remote track {} ended", track.id());
                });
            })
        }));

        Ok(Self {
            link,
            peer_connection,
            video_sender,
        })
    }

    pub fn link(&self) -> &LinkId {
        &self.link
    }
}

async fn add_sender(
    peer_connection: &RTCPeerConnection,
    track: &MediaTrack,
) -> Result<Arc<RTCRtpSender>> {
    let sender = peer_connection
        .add_track(track.rtp_track() as Arc<dyn TrackLocal + Send + Sync>)
        .await
        .with_context(|| format!("Failed to add {:?} track", track.kind()))?;

    let rtcp_sender = sender.clone();
    tokio::spawn(async move {
        let mut rtcp_buf = vec![0u8; 1500];
        while rtcp_sender.read(&mut rtcp_buf).await.is_ok() {}
    });

    Ok(sender)
}

#[async_trait]
impl PeerTransport for WebRtcTransport {
    async fn create_offer(&self, ice_restart: bool) -> Result<String, TransportError> {
        let options = ice_restart.then(|| RTCOfferOptions {
            ice_restart: true,
            ..Default::default()
        });
        let offer = self.peer_connection.create_offer(options).await?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await?;
        Ok(offer.sdp)
    }

    async fn create_answer(&self) -> Result<String, TransportError> {
        let answer = self.peer_connection.create_answer(None).await?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await?;
        Ok(answer.sdp)
    }

    async fn set_remote_description(
        &self,
        kind: SdpKind,
        sdp: String,
    ) -> Result<(), TransportError> {
        let desc = match kind {
            SdpKind::Offer => RTCSessionDescription::offer(sdp)?,
            SdpKind::Answer => RTCSessionDescription::answer(sdp)?,
        };
        self.peer_connection.set_remote_description(desc).await?;
        Ok(())
    }

    async fn rollback(&self) -> Result<(), TransportError> {
        let mut rollback = RTCSessionDescription::default();
        rollback.sdp_type = RTCSdpType::Rollback;
        self.peer_connection.set_local_description(rollback).await?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: String) -> Result<(), TransportError> {
        let candidate: RTCIceCandidateInit =
            serde_json::from_str(&candidate).context("Failed to parse ICE candidate JSON")?;
        self.peer_connection.add_ice_candidate(candidate).await?;
        Ok(())
    }

    async fn replace_video_track(
        &self,
        track: Option<&MediaTrack>,
    ) -> Result<TrackSwap, TransportError> {
        let track = track.map(|t| t.rtp_track() as Arc<dyn TrackLocal + Send + Sync>);
        self.video_sender.replace_track(track).await?;
        Ok(TrackSwap::InPlace)
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.peer_connection.close().await?;
        Ok(())
    }
}

/// Creates a [`WebRtcTransport`] per session.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebRtcTransportFactory;

#[async_trait]
impl TransportFactory for WebRtcTransportFactory {
    async fn create(
        &self,
        link: LinkId,
        config: &TransportConfig,
        tracks: &OutboundTracks,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn PeerTransport>, TransportError> {
        let transport = WebRtcTransport::new(link, config, tracks, events).await?;
        Ok(Box::new(transport))
    }
}
