use crate::backoff::Backoff;
use crate::error::StoreError;
use crate::store::RoomStore;
use futures::Stream;
use huddle_core::{Room, RoomId};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// What a room subscription delivers.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    Snapshot(Room),
    /// The room does not exist (anymore).
    RoomClosed,
    /// The store connection was lost; the next attempt happens after `delay`.
    Reconnecting { attempt: u32, delay: Duration },
    /// The connection was re-established after one or more failed attempts.
    Restored,
}

/// Live, self-healing feed of room snapshots.
///
/// The feed never ends on its own: connection losses are retried with
/// backoff and reported as [`StoreEvent::Reconnecting`]. Dropping the
/// subscription cancels it.
pub struct RoomSubscription {
    events: mpsc::UnboundedReceiver<StoreEvent>,
    task: JoinHandle<()>,
}

impl RoomSubscription {
    pub fn open(store: Arc<dyn RoomStore>, room_id: RoomId, backoff: Backoff) -> Self {
        let (tx, events) = mpsc::unbounded_channel();
        let task = tokio::spawn(feed_loop(store, room_id, backoff, tx));
        Self { events, task }
    }
}

impl Stream for RoomSubscription {
    type Item = StoreEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<StoreEvent>> {
        self.events.poll_recv(cx)
    }
}

impl Drop for RoomSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn feed_loop(
    store: Arc<dyn RoomStore>,
    room_id: RoomId,
    backoff: Backoff,
    tx: mpsc::UnboundedSender<StoreEvent>,
) {
    let mut attempt = 0u32;

    loop {
        match store.watch(&room_id).await {
            Ok(mut feed) => {
                if attempt > 0 {
                    info!("Room feed for {} restored after {} attempts", room_id, attempt);
                    if tx.send(StoreEvent::Restored).is_err() {
                        return;
                    }
                    attempt = 0;
                }

                loop {
                    let event = match feed.borrow_and_update().clone() {
                        Some(room) => StoreEvent::Snapshot(room),
                        None => StoreEvent::RoomClosed,
                    };
                    if tx.send(event).is_err() {
                        return;
                    }
                    if feed.changed().await.is_err() {
                        warn!("Lost room feed for {}", room_id);
                        break;
                    }
                }
            }
            Err(StoreError::RoomNotFound(_)) => {
                debug!("Room {} not found, parking subscription", room_id);
                let _ = tx.send(StoreEvent::RoomClosed);
                std::future::pending::<()>().await;
            }
            Err(e) => {
                debug!("Room feed for {} unavailable: {}", room_id, e);
            }
        }

        attempt += 1;
        let delay = backoff.delay(attempt);
        if tx.send(StoreEvent::Reconnecting { attempt, delay }).is_err() {
            return;
        }
        tokio::time::sleep(delay).await;
    }
}
