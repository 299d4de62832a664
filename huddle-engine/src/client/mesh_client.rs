use crate::client::JoinedRoom;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::media::MediaDevices;
use crate::signaling::SignalRelay;
use crate::store::{ChatLog, RoomStore};
use crate::transport::TransportFactory;
use huddle_core::{MediaConstraints, PeerId, RoomId};
use std::sync::Arc;
use tracing::{info, warn};

pub const ANONYMOUS_DISPLAY_NAME: &str = "Anonymous";

/// The authenticated user, as handed over by the sign-in layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub uid: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

impl UserIdentity {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            display_name: None,
            photo_url: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_photo_url(mut self, url: impl Into<String>) -> Self {
        self.photo_url = Some(url.into());
        self
    }

    pub fn display_name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(ANONYMOUS_DISPLAY_NAME)
    }
}

/// Entry point of the conferencing engine.
///
/// Holds the external services every room needs and hands out
/// [`JoinedRoom`]s. Cheap to clone.
#[derive(Clone)]
pub struct MeshClient {
    pub(crate) store: Arc<dyn RoomStore>,
    pub(crate) chat: Arc<dyn ChatLog>,
    pub(crate) relay: Arc<dyn SignalRelay>,
    pub(crate) transports: Arc<dyn TransportFactory>,
    pub(crate) devices: Arc<dyn MediaDevices>,
    pub(crate) config: ClientConfig,
}

impl MeshClient {
    pub fn new(
        store: Arc<dyn RoomStore>,
        chat: Arc<dyn ChatLog>,
        relay: Arc<dyn SignalRelay>,
        transports: Arc<dyn TransportFactory>,
        devices: Arc<dyn MediaDevices>,
        config: ClientConfig,
    ) -> Self {
        Self {
            store,
            chat,
            relay,
            transports,
            devices,
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Creates an empty room. The host joins separately.
    pub async fn create_room(
        &self,
        host: &UserIdentity,
        name: &str,
    ) -> Result<RoomId, ClientError> {
        let room_id = self.store.create(&host.uid, name).await?;
        info!("{} created room {}", host.uid, room_id);
        Ok(room_id)
    }

    /// `false` when the room is missing or the store cannot be reached.
    pub async fn check_room_exists(&self, room_id: &RoomId) -> bool {
        match self.store.exists(room_id).await {
            Ok(exists) => exists,
            Err(e) => {
                warn!("Could not check whether room {} exists: {}", room_id, e);
                false
            }
        }
    }

    pub async fn close_room(&self, room_id: &RoomId) -> Result<(), ClientError> {
        self.store.close(room_id).await?;
        info!("Room {} closed", room_id);
        Ok(())
    }

    /// Opens the local devices, registers `user` in the room and starts
    /// connecting to everyone already there.
    pub async fn join_room(
        &self,
        room_id: &RoomId,
        user: UserIdentity,
        constraints: MediaConstraints,
    ) -> Result<JoinedRoom, ClientError> {
        self.join_room_with_peer_id(room_id, user, constraints, PeerId::new())
            .await
    }

    /// Like [`MeshClient::join_room`] with a caller-chosen peer id. The id
    /// must be unique to this session.
    pub async fn join_room_with_peer_id(
        &self,
        room_id: &RoomId,
        user: UserIdentity,
        constraints: MediaConstraints,
        peer_id: PeerId,
    ) -> Result<JoinedRoom, ClientError> {
        JoinedRoom::join(self, room_id.clone(), user, constraints, peer_id).await
    }
}
