use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

/// Idempotency token generated by the composing client and carried through
/// to the stored record, so the optimistic echo can be matched exactly.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientToken(pub String);

impl ClientToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for ClientToken {
    fn default() -> Self {
        Self::new()
    }
}

/// A message as written by a client. The store assigns `id` and the timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChatMessage {
    pub sender_id: String,
    pub sender_name: String,
    pub text: String,
    pub client_token: ClientToken,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub text: String,
    pub server_timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_token: Option<ClientToken>,
}

impl ChatMessage {
    /// Display order: server timestamp, then id.
    pub fn display_cmp(&self, other: &Self) -> Ordering {
        self.server_timestamp
            .cmp(&other.server_timestamp)
            .then_with(|| self.id.cmp(&other.id))
    }
}
