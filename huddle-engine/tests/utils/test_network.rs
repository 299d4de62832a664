use huddle_core::{MediaConstraints, PeerId, RoomId};
use huddle_engine::{
    ClientConfig, JoinedRoom, MemorySignalRelay, MemoryStore, MeshClient, RoomStore,
    StaticDevices, UserIdentity,
};
use std::sync::Arc;
use std::time::Duration;

use super::{MockNetwork, MockTransportFactory};

/// Production timings without external ICE servers.
pub fn test_config() -> ClientConfig {
    ClientConfig {
        ice_servers: vec![],
        ..Default::default()
    }
}

/// Everything shared between the clients of one test: store, relay and network.
pub struct TestNetwork {
    pub store: Arc<MemoryStore>,
    pub relay: Arc<MemorySignalRelay>,
    pub network: Arc<MockNetwork>,
}

impl TestNetwork {
    pub fn new() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            relay: Arc::new(MemorySignalRelay::default()),
            network: Arc::new(MockNetwork::default()),
        }
    }

    pub async fn create_room(&self) -> RoomId {
        self.store
            .create("host", "test room")
            .await
            .expect("Failed to create room")
    }

    pub fn client(&self) -> TestClient {
        self.client_with(test_config(), StaticDevices::new())
    }

    pub fn client_with(&self, config: ClientConfig, devices: StaticDevices) -> TestClient {
        let transports = Arc::new(MockTransportFactory::new(self.network.clone()));
        let devices = Arc::new(devices);
        let mesh = MeshClient::new(
            self.store.clone(),
            self.store.clone(),
            self.relay.clone(),
            transports.clone(),
            devices.clone(),
            config,
        );
        TestClient {
            mesh,
            transports,
            devices,
        }
    }
}

/// One simulated participant device.
pub struct TestClient {
    pub mesh: MeshClient,
    pub transports: Arc<MockTransportFactory>,
    pub devices: Arc<StaticDevices>,
}

impl TestClient {
    pub async fn join(&self, room_id: &RoomId, uid: &str, peer_id: &str) -> JoinedRoom {
        self.mesh
            .join_room_with_peer_id(
                room_id,
                UserIdentity::new(uid).with_display_name(uid.to_uppercase()),
                MediaConstraints::default(),
                PeerId::from(peer_id),
            )
            .await
            .expect("Failed to join room")
    }
}

/// Promotion quick enough to provoke a colliding offer.
pub fn eager_promotion_config() -> ClientConfig {
    ClientConfig {
        promotion_timeout: Duration::from_millis(50),
        ..test_config()
    }
}
