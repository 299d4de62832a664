use crate::chat::{ChatEntry, ChatStream, ChatTimeline};
use crate::client::{MeshClient, RoomEvent, UserIdentity};
use crate::error::{ClientError, StoreError};
use crate::media::{MediaController, MediaTrack, OutboundTracks};
use crate::orchestrator::{Orchestrator, OrchestratorHandle, PeerEvent, SessionInfo};
use crate::presence::{JoinOutcome, PresenceManager, RosterDiff};
use crate::signaling::SignalingChannel;
use crate::store::{RoomSubscription, StoreEvent};
use futures::StreamExt;
use huddle_core::utils::unix_millis;
use huddle_core::{ChatMessage, MediaConstraints, Participant, PeerId, RoomId, StatusPatch};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

/// A room this client is currently in.
///
/// Background tasks keep presence, peer connections and chat in sync and
/// report through [`JoinedRoom::next_event`]. [`JoinedRoom::leave_room`] is
/// the orderly exit; dropping the value cancels every task and leaves on a
/// best-effort basis.
pub struct JoinedRoom {
    room_id: RoomId,
    local: Participant,
    presence: PresenceManager,
    orchestrator: OrchestratorHandle,
    orchestrator_task: Option<JoinHandle<()>>,
    media: Arc<Mutex<MediaController>>,
    chat: ChatStream,
    events_tx: mpsc::UnboundedSender<RoomEvent>,
    events_rx: mpsc::UnboundedReceiver<RoomEvent>,
    tasks: JoinSet<()>,
    left: bool,
}

impl JoinedRoom {
    pub(crate) async fn join(
        client: &MeshClient,
        room_id: RoomId,
        user: UserIdentity,
        constraints: MediaConstraints,
        peer_id: PeerId,
    ) -> Result<Self, ClientError> {
        if !client.store.exists(&room_id).await? {
            return Err(ClientError::RoomNotFound(room_id));
        }
        let config = &client.config;
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let mut media = MediaController::new(client.devices.clone());
        for error in media.acquire(constraints).await {
            let _ = events_tx.send(RoomEvent::MediaUnavailable(error));
        }

        let (signal_tx, signal_rx) =
            SignalingChannel::open(client.relay.clone(), room_id.clone(), peer_id.clone()).await?;
        let (orchestrator, handle, peer_events) = Orchestrator::new(
            config.clone(),
            client.transports.clone(),
            media.outbound(),
            signal_tx,
            signal_rx,
        );
        let orchestrator_task = tokio::spawn(orchestrator.run());

        let presence = PresenceManager::new(client.store.clone(), config.liveness_timeout)
            .with_teardown(handle.clone());
        let local = Participant {
            uid: user.uid.clone(),
            display_name: user.display_name().to_owned(),
            photo_url: user.photo_url.clone().unwrap_or_default(),
            peer_id: peer_id.clone(),
            joined_at: unix_millis(),
            is_muted: !media.audio_enabled(),
            is_video_off: !media.video_enabled(),
            last_seen: 0,
        };

        // Subscribe first so the snapshot that includes us is not missed.
        let subscription =
            RoomSubscription::open(client.store.clone(), room_id.clone(), config.store_backoff);

        if let Err(e) = register(&presence, &room_id, &local).await {
            warn!("Joining room {} failed: {}", room_id, e);
            handle.shutdown().await;
            media.cleanup();
            return Err(e.into());
        }
        info!("Joined room {} as {} ({})", room_id, local.uid, peer_id);

        let chat = ChatStream::open(client.chat.clone(), room_id.clone(), config.store_backoff);

        let mut tasks = JoinSet::new();
        tasks.spawn(pump_room(
            subscription,
            local.clone(),
            handle.clone(),
            events_tx.clone(),
        ));
        tasks.spawn(forward_peer_events(peer_events, events_tx.clone()));
        tasks.spawn(forward_chat(chat.subscribe(), events_tx.clone()));
        tasks.spawn(keep_alive(
            presence.clone(),
            room_id.clone(),
            local.clone(),
            config.heartbeat_interval,
        ));

        Ok(Self {
            room_id,
            local,
            presence,
            orchestrator: handle,
            orchestrator_task: Some(orchestrator_task),
            media: Arc::new(Mutex::new(media)),
            chat,
            events_tx,
            events_rx,
            tasks,
            left: false,
        })
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// The record this client registered in the room.
    pub fn local_participant(&self) -> &Participant {
        &self.local
    }

    pub async fn next_event(&mut self) -> Option<RoomEvent> {
        self.events_rx.recv().await
    }

    /// Leaves the room: says goodbye to every peer, removes the local
    /// participant and releases all devices.
    pub async fn leave_room(mut self) -> Result<(), ClientError> {
        self.left = true;
        self.tasks.abort_all();
        self.orchestrator.shutdown().await;
        if let Some(task) = self.orchestrator_task.take() {
            let _ = task.await;
        }
        self.cleanup_media().await;

        self.presence.leave(&self.room_id, &self.local.uid).await?;
        info!("Left room {}", self.room_id);
        Ok(())
    }

    /// Stops every local track. Peer connections are closed by leaving.
    pub async fn cleanup_media(&self) {
        self.media.lock().await.cleanup();
    }

    pub async fn update_participant_status(&self, patch: StatusPatch) -> Result<(), ClientError> {
        self.presence
            .update_status(&self.room_id, &self.local.uid, patch)
            .await?;
        Ok(())
    }

    pub async fn send_message(&self, text: &str) -> Result<ChatMessage, ClientError> {
        self.chat
            .post(&self.local.uid, &self.local.display_name, text)
            .await
    }

    pub fn chat_entries(&self) -> Vec<ChatEntry> {
        self.chat.entries()
    }

    /// Flips the microphone, publishes the new state and returns whether
    /// audio is now on.
    pub async fn toggle_audio(&self) -> Result<bool, ClientError> {
        let enabled = self.media.lock().await.toggle_audio()?;
        self.update_participant_status(StatusPatch::muted(!enabled))
            .await?;
        Ok(enabled)
    }

    pub async fn toggle_video(&self) -> Result<bool, ClientError> {
        let enabled = self.media.lock().await.toggle_video()?;
        self.update_participant_status(StatusPatch::video_off(!enabled))
            .await?;
        Ok(enabled)
    }

    /// Sends the screen instead of the camera on every connection.
    pub async fn start_screen_share(&mut self) -> Result<(), ClientError> {
        let screen = self.media.lock().await.start_screen_share().await?;
        self.orchestrator
            .replace_video_track(Some(screen.clone()))
            .await;
        self.tasks.spawn(watch_screen_share(
            screen,
            self.media.clone(),
            self.orchestrator.clone(),
            self.events_tx.clone(),
        ));
        Ok(())
    }

    /// Ends the share and sends the camera again.
    pub async fn stop_screen_share(&self) -> Result<(), ClientError> {
        let camera = self.media.lock().await.stop_screen_share()?;
        self.orchestrator.replace_video_track(camera).await;
        Ok(())
    }

    pub async fn is_screen_sharing(&self) -> bool {
        self.media.lock().await.is_screen_sharing()
    }

    /// The local tracks currently offered to peers.
    pub async fn outbound_tracks(&self) -> OutboundTracks {
        self.media.lock().await.outbound()
    }

    pub async fn connect_to_peer(&self, peer_id: PeerId) {
        self.orchestrator.connect_to_peer(peer_id).await;
    }

    pub async fn peer_states(&self) -> Vec<SessionInfo> {
        self.orchestrator.sessions().await
    }
}

impl Drop for JoinedRoom {
    fn drop(&mut self) {
        if self.left {
            return;
        }
        self.tasks.abort_all();

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let orchestrator = self.orchestrator.clone();
        let presence = self.presence.clone();
        let room_id = self.room_id.clone();
        let uid = self.local.uid.clone();
        runtime.spawn(async move {
            orchestrator.shutdown().await;
            if let Err(e) = presence.leave(&room_id, &uid).await {
                debug!("Best-effort leave of {} failed: {}", room_id, e);
            }
        });
    }
}

/// Adds `local` to the room, taking over a record a previous session of
/// the same user left behind.
async fn register(
    presence: &PresenceManager,
    room_id: &RoomId,
    local: &Participant,
) -> Result<(), StoreError> {
    match presence.join(room_id, local.clone()).await? {
        JoinOutcome::Joined => Ok(()),
        JoinOutcome::AlreadyPresent => presence.replace(room_id, local.clone()).await,
    }
}

/// Turns room snapshots into roster events and session starts/stops.
async fn pump_room(
    mut subscription: RoomSubscription,
    local: Participant,
    orchestrator: OrchestratorHandle,
    events: mpsc::UnboundedSender<RoomEvent>,
) {
    let mut roster: Vec<Participant> = Vec::new();
    let mut first = true;

    while let Some(event) = subscription.next().await {
        let room_event = match event {
            StoreEvent::Snapshot(room) => {
                let diff = RosterDiff::between(&roster, &room.participants);
                for p in &diff.left {
                    if p.peer_id != local.peer_id {
                        orchestrator.peer_left(p.peer_id.clone()).await;
                    }
                    let _ = events.send(RoomEvent::ParticipantLeft(p.clone()));
                }
                for p in &diff.joined {
                    if p.peer_id != local.peer_id {
                        orchestrator.peer_joined(p.peer_id.clone()).await;
                    }
                    let _ = events.send(RoomEvent::ParticipantJoined(p.clone()));
                }
                for p in diff.updated.iter().cloned() {
                    let _ = events.send(RoomEvent::ParticipantUpdated(p));
                }

                let changed = first || !diff.is_empty();
                first = false;
                roster = room.participants;
                if !changed {
                    continue;
                }
                RoomEvent::Roster(roster.clone())
            }
            StoreEvent::RoomClosed => {
                info!("Room closed");
                for p in roster.drain(..) {
                    if p.peer_id != local.peer_id {
                        orchestrator.peer_left(p.peer_id).await;
                    }
                }
                RoomEvent::RoomClosed
            }
            StoreEvent::Reconnecting { attempt, delay } => {
                RoomEvent::StoreReconnecting { attempt, delay }
            }
            StoreEvent::Restored => RoomEvent::StoreRestored,
        };
        if events.send(room_event).is_err() {
            return;
        }
    }
}

async fn forward_peer_events(
    mut peer_events: mpsc::UnboundedReceiver<PeerEvent>,
    events: mpsc::UnboundedSender<RoomEvent>,
) {
    while let Some(event) = peer_events.recv().await {
        if events.send(RoomEvent::Peer(event)).is_err() {
            return;
        }
    }
}

async fn forward_chat(
    mut timeline: watch::Receiver<ChatTimeline>,
    events: mpsc::UnboundedSender<RoomEvent>,
) {
    while timeline.changed().await.is_ok() {
        let entries = timeline.borrow_and_update().entries();
        if events.send(RoomEvent::ChatUpdated(entries)).is_err() {
            return;
        }
    }
}

/// Refreshes our heartbeat and sweeps participants whose clients died.
async fn keep_alive(
    presence: PresenceManager,
    room_id: RoomId,
    local: Participant,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match presence.heartbeat(&room_id, &local.uid).await {
            Ok(()) => {}
            Err(StoreError::ParticipantNotFound(_)) => {
                warn!("{} was dropped from room {}, rejoining", local.uid, room_id);
                if let Err(e) = presence.join(&room_id, local.clone()).await {
                    debug!("Rejoin failed: {}", e);
                }
            }
            Err(StoreError::RoomNotFound(_)) => return,
            Err(e) => debug!("Heartbeat failed: {}", e),
        }
        if let Err(e) = presence.sweep_stale(&room_id).await {
            debug!("Sweep failed: {}", e);
        }
    }
}

/// Restores the camera when the capture source ends a share on its own.
async fn watch_screen_share(
    screen: MediaTrack,
    media: Arc<Mutex<MediaController>>,
    orchestrator: OrchestratorHandle,
    events: mpsc::UnboundedSender<RoomEvent>,
) {
    screen.ended().await;
    let restored = media.lock().await.screen_share_ended(&screen);
    if let Some(camera) = restored {
        orchestrator.replace_video_track(camera).await;
        let _ = events.send(RoomEvent::ScreenShareEnded);
    }
}
