use crate::backoff::Backoff;
use crate::chat::{ChatEntry, ChatTimeline};
use crate::error::{ClientError, StoreError};
use crate::store::ChatLog;
use huddle_core::{ChatMessage, ClientToken, NewChatMessage, RoomId};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Live, ordered view of a room's chat.
///
/// Every client renders the same order because ordering uses only what the
/// store assigned: server timestamp, then message id. Local messages show up
/// immediately as pending and are swapped for the stored copy once the
/// store confirms them.
pub struct ChatStream {
    log: Arc<dyn ChatLog>,
    room_id: RoomId,
    timeline: Arc<watch::Sender<ChatTimeline>>,
    task: JoinHandle<()>,
}

impl ChatStream {
    pub fn open(log: Arc<dyn ChatLog>, room_id: RoomId, backoff: Backoff) -> Self {
        let (timeline, _) = watch::channel(ChatTimeline::default());
        let timeline = Arc::new(timeline);
        let task = tokio::spawn(sync_loop(
            log.clone(),
            room_id.clone(),
            backoff,
            timeline.clone(),
        ));

        Self {
            log,
            room_id,
            timeline,
            task,
        }
    }

    /// Sends a message. `text` is trimmed; blank messages are rejected.
    pub async fn post(
        &self,
        sender_id: &str,
        sender_name: &str,
        text: &str,
    ) -> Result<ChatMessage, ClientError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ClientError::EmptyMessage);
        }

        let token = ClientToken::new();
        self.timeline.send_modify(|t| {
            t.add_pending(ChatMessage {
                id: format!("local-{}", token.0),
                sender_id: sender_id.to_owned(),
                sender_name: sender_name.to_owned(),
                text: text.to_owned(),
                server_timestamp: u64::MAX,
                client_token: Some(token.clone()),
            })
        });

        let new_message = NewChatMessage {
            sender_id: sender_id.to_owned(),
            sender_name: sender_name.to_owned(),
            text: text.to_owned(),
            client_token: token.clone(),
        };
        match self.log.append(&self.room_id, new_message).await {
            Ok(stored) => {
                self.timeline.send_if_modified(|t| t.confirm(stored.clone()));
                Ok(stored)
            }
            Err(e) => {
                warn!("Failed to send chat message: {}", e);
                self.timeline.send_if_modified(|t| t.discard_pending(&token));
                Err(e.into())
            }
        }
    }

    pub fn entries(&self) -> Vec<ChatEntry> {
        self.timeline.borrow().entries()
    }

    /// Receiver that is notified on every timeline change.
    pub fn subscribe(&self) -> watch::Receiver<ChatTimeline> {
        self.timeline.subscribe()
    }
}

impl Drop for ChatStream {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn sync_loop(
    log: Arc<dyn ChatLog>,
    room_id: RoomId,
    backoff: Backoff,
    timeline: Arc<watch::Sender<ChatTimeline>>,
) {
    let mut attempt = 0u32;

    loop {
        // Subscribe before reading history so nothing falls in between.
        match open_feed(log.as_ref(), &room_id).await {
            Ok((mut feed, history)) => {
                if attempt > 0 {
                    info!("Chat feed for {} restored", room_id);
                    attempt = 0;
                }
                timeline.send_if_modified(|t| t.confirm_all(history));

                loop {
                    match feed.recv().await {
                        Ok(message) => {
                            timeline.send_if_modified(|t| t.confirm(message));
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!("Chat feed skipped {} messages, refetching history", skipped);
                            match log.history(&room_id).await {
                                Ok(history) => {
                                    timeline.send_if_modified(|t| t.confirm_all(history));
                                }
                                Err(e) => {
                                    debug!("History refetch failed: {}", e);
                                    break;
                                }
                            }
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            warn!("Lost chat feed for {}", room_id);
                            break;
                        }
                    }
                }
            }
            Err(StoreError::RoomNotFound(_)) => {
                debug!("Room {} is gone, stopping chat sync", room_id);
                return;
            }
            Err(e) => debug!("Chat feed for {} unavailable: {}", room_id, e),
        }

        attempt += 1;
        tokio::time::sleep(backoff.delay(attempt)).await;
    }
}

async fn open_feed(
    log: &dyn ChatLog,
    room_id: &RoomId,
) -> Result<(broadcast::Receiver<ChatMessage>, Vec<ChatMessage>), StoreError> {
    let feed = log.watch_messages(room_id).await?;
    let history = log.history(room_id).await?;
    Ok((feed, history))
}
