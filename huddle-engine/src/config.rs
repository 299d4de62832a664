use crate::backoff::Backoff;
use huddle_core::IceServerConfig;
use huddle_core::utils::{DEFAULT_STUN_ADDR, DEFAULT_STUN_ADDR_2};
use std::env;
use std::time::Duration;

pub const ICE_SERVERS_ENV: &str = "HUDDLE_ICE_SERVERS";
pub const TURN_USERNAME_ENV: &str = "HUDDLE_TURN_USERNAME";
pub const TURN_CREDENTIAL_ENV: &str = "HUDDLE_TURN_CREDENTIAL";

/// Tunables for one client. `Default` matches production values.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// STUN/TURN endpoints, handed to the connection layer unmodified.
    pub ice_servers: Vec<IceServerConfig>,
    /// How long a session may stay in `Negotiating` without progress.
    pub negotiation_timeout: Duration,
    /// Negotiation rounds (initial included) before a session is `Failed`.
    pub max_negotiation_attempts: u32,
    /// How long an answerer waits for an offer before offering itself.
    pub promotion_timeout: Duration,
    pub reconnect_backoff: Backoff,
    pub max_reconnect_attempts: u32,
    pub store_backoff: Backoff,
    pub heartbeat_interval: Duration,
    /// Participants whose heartbeat is older than this are swept.
    pub liveness_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![
                IceServerConfig::stun(DEFAULT_STUN_ADDR),
                IceServerConfig::stun(DEFAULT_STUN_ADDR_2),
            ],
            negotiation_timeout: Duration::from_secs(15),
            max_negotiation_attempts: 3,
            promotion_timeout: Duration::from_secs(10),
            reconnect_backoff: Backoff::new(Duration::from_secs(1), Duration::from_secs(16)),
            max_reconnect_attempts: 5,
            store_backoff: Backoff::new(Duration::from_millis(500), Duration::from_secs(10)),
            heartbeat_interval: Duration::from_secs(10),
            liveness_timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    /// Defaults, with ICE servers taken from the environment when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(servers) = ice_servers_from(
            env::var(ICE_SERVERS_ENV).ok(),
            env::var(TURN_USERNAME_ENV).ok(),
            env::var(TURN_CREDENTIAL_ENV).ok(),
        ) {
            config.ice_servers = servers;
        }
        config
    }
}

fn ice_servers_from(
    urls: Option<String>,
    username: Option<String>,
    credential: Option<String>,
) -> Option<Vec<IceServerConfig>> {
    let urls: Vec<String> = urls?
        .split(',')
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_owned)
        .collect();
    if urls.is_empty() {
        return None;
    }

    let (stun, turn): (Vec<String>, Vec<String>) =
        urls.into_iter().partition(|u| u.starts_with("stun:"));

    let mut servers = Vec::new();
    if !stun.is_empty() {
        servers.push(IceServerConfig {
            urls: stun,
            username: None,
            credential: None,
        });
    }
    if !turn.is_empty() {
        servers.push(IceServerConfig {
            urls: turn,
            username,
            credential,
        });
    }
    Some(servers)
}
