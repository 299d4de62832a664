use crate::error::StoreError;
use crate::store::{ChatLog, ParticipantOp, RoomStore};
use async_trait::async_trait;
use dashmap::DashMap;
use huddle_core::utils::unix_millis;
use huddle_core::{ChatMessage, NewChatMessage, Room, RoomId};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

const CHAT_FEED_CAPACITY: usize = 256;

struct RoomEntry {
    /// `None` once the room has been closed; the entry stays as a tombstone.
    room: Option<Room>,
    feed: watch::Sender<Option<Room>>,
    messages: Vec<ChatMessage>,
    chat_feed: broadcast::Sender<ChatMessage>,
    next_message_seq: u64,
}

impl RoomEntry {
    fn publish(&self) {
        self.feed.send_replace(self.room.clone());
    }

    fn live_room(&mut self, room_id: &RoomId) -> Result<&mut Room, StoreError> {
        self.room
            .as_mut()
            .ok_or_else(|| StoreError::RoomNotFound(room_id.clone()))
    }
}

/// In-process real-time store: room documents plus per-room chat collections.
///
/// Every mutation runs under the room's map shard lock, so participant set
/// operations are atomic. [`MemoryStore::set_online`] simulates losing the
/// connection to the store: calls fail with [`StoreError::Unavailable`] and
/// every open feed is cut.
pub struct MemoryStore {
    rooms: DashMap<RoomId, RoomEntry>,
    online: AtomicBool,
    last_timestamp: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
            online: AtomicBool::new(true),
            last_timestamp: AtomicU64::new(0),
        }
    }

    pub fn set_online(&self, online: bool) {
        let was = self.online.swap(online, Ordering::SeqCst);
        if was == online {
            return;
        }
        if online {
            info!("Room store back online");
            return;
        }

        warn!("Room store going offline, cutting {} feeds", self.rooms.len());
        for mut entry in self.rooms.iter_mut() {
            let (feed, _) = watch::channel(entry.room.clone());
            let (chat_feed, _) = broadcast::channel(CHAT_FEED_CAPACITY);
            entry.feed = feed;
            entry.chat_feed = chat_feed;
        }
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    fn ensure_online(&self) -> Result<(), StoreError> {
        if self.is_online() {
            Ok(())
        } else {
            Err(StoreError::Unavailable)
        }
    }

    /// Non-decreasing store clock.
    fn next_timestamp(&self) -> u64 {
        let now = unix_millis();
        let prev = self.last_timestamp.fetch_max(now, Ordering::SeqCst);
        prev.max(now)
    }
}

#[async_trait]
impl RoomStore for MemoryStore {
    async fn create(&self, host_id: &str, name: &str) -> Result<RoomId, StoreError> {
        self.ensure_online()?;

        let id = RoomId::new();
        let room = Room {
            id: id.clone(),
            host_id: host_id.to_owned(),
            name: name.to_owned(),
            created_at: self.next_timestamp(),
            participants: Vec::new(),
        };
        let (feed, _) = watch::channel(Some(room.clone()));
        let (chat_feed, _) = broadcast::channel(CHAT_FEED_CAPACITY);

        self.rooms.insert(
            id.clone(),
            RoomEntry {
                room: Some(room),
                feed,
                messages: Vec::new(),
                chat_feed,
                next_message_seq: 1,
            },
        );
        info!("Created room {} ('{}') for host {}", id, name, host_id);
        Ok(id)
    }

    async fn exists(&self, room_id: &RoomId) -> Result<bool, StoreError> {
        self.ensure_online()?;
        Ok(self
            .rooms
            .get(room_id)
            .is_some_and(|entry| entry.room.is_some()))
    }

    async fn snapshot(&self, room_id: &RoomId) -> Result<Option<Room>, StoreError> {
        self.ensure_online()?;
        Ok(self.rooms.get(room_id).and_then(|entry| entry.room.clone()))
    }

    async fn mutate_participants(
        &self,
        room_id: &RoomId,
        op: ParticipantOp,
    ) -> Result<(), StoreError> {
        self.ensure_online()?;
        let now = self.next_timestamp();

        let mut entry = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| StoreError::RoomNotFound(room_id.clone()))?;
        let room = entry.live_room(room_id)?;

        let changed = match op {
            ParticipantOp::Add(mut participant) => {
                if room.contains(&participant.uid) {
                    debug!("Participant {} already in room {}", participant.uid, room_id);
                    false
                } else {
                    participant.last_seen = now;
                    room.participants.push(participant);
                    true
                }
            }
            ParticipantOp::Remove { uid } => {
                let before = room.participants.len();
                room.participants.retain(|p| p.uid != uid);
                before != room.participants.len()
            }
            ParticipantOp::UpdateStatus { uid, patch } => {
                let participant = room
                    .participants
                    .iter_mut()
                    .find(|p| p.uid == uid)
                    .ok_or(StoreError::ParticipantNotFound(uid))?;
                patch.apply(participant)
            }
            ParticipantOp::Touch { uid } => {
                let participant = room
                    .participants
                    .iter_mut()
                    .find(|p| p.uid == uid)
                    .ok_or(StoreError::ParticipantNotFound(uid))?;
                participant.last_seen = now;
                true
            }
        };

        if changed {
            entry.publish();
        }
        Ok(())
    }

    async fn close(&self, room_id: &RoomId) -> Result<(), StoreError> {
        self.ensure_online()?;
        if let Some(mut entry) = self.rooms.get_mut(room_id) {
            if entry.room.take().is_some() {
                info!("Closed room {}", room_id);
                entry.publish();
            }
        }
        Ok(())
    }

    async fn close_if_empty(&self, room_id: &RoomId) -> Result<bool, StoreError> {
        self.ensure_online()?;
        let Some(mut entry) = self.rooms.get_mut(room_id) else {
            return Ok(false);
        };
        if !entry.room.as_ref().is_some_and(Room::is_empty) {
            return Ok(false);
        }
        entry.room = None;
        entry.publish();
        info!("Closed empty room {}", room_id);
        Ok(true)
    }

    async fn watch(&self, room_id: &RoomId) -> Result<watch::Receiver<Option<Room>>, StoreError> {
        self.ensure_online()?;
        self.rooms
            .get(room_id)
            .map(|entry| entry.feed.subscribe())
            .ok_or_else(|| StoreError::RoomNotFound(room_id.clone()))
    }

    async fn server_time(&self) -> Result<u64, StoreError> {
        self.ensure_online()?;
        Ok(unix_millis().max(self.last_timestamp.load(Ordering::SeqCst)))
    }
}

#[async_trait]
impl ChatLog for MemoryStore {
    async fn append(
        &self,
        room_id: &RoomId,
        message: NewChatMessage,
    ) -> Result<ChatMessage, StoreError> {
        self.ensure_online()?;
        let server_timestamp = self.next_timestamp();

        let mut entry = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| StoreError::RoomNotFound(room_id.clone()))?;
        entry.live_room(room_id)?;

        let seq = entry.next_message_seq;
        entry.next_message_seq += 1;

        let stored = ChatMessage {
            id: format!("{:010}-{}", seq, &Uuid::new_v4().simple().to_string()[..8]),
            sender_id: message.sender_id,
            sender_name: message.sender_name,
            text: message.text,
            server_timestamp,
            client_token: Some(message.client_token),
        };
        entry.messages.push(stored.clone());
        let _ = entry.chat_feed.send(stored.clone());
        Ok(stored)
    }

    async fn history(&self, room_id: &RoomId) -> Result<Vec<ChatMessage>, StoreError> {
        self.ensure_online()?;
        self.rooms
            .get(room_id)
            .map(|entry| entry.messages.clone())
            .ok_or_else(|| StoreError::RoomNotFound(room_id.clone()))
    }

    async fn watch_messages(
        &self,
        room_id: &RoomId,
    ) -> Result<broadcast::Receiver<ChatMessage>, StoreError> {
        self.ensure_online()?;
        self.rooms
            .get(room_id)
            .map(|entry| entry.chat_feed.subscribe())
            .ok_or_else(|| StoreError::RoomNotFound(room_id.clone()))
    }
}
