use crate::error::StoreError;
use crate::orchestrator::OrchestratorHandle;
use crate::store::{ParticipantOp, RoomStore};
use huddle_core::{Participant, RoomId, StatusPatch};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined,
    AlreadyPresent,
}

/// Idempotent membership and status operations on top of a [`RoomStore`].
///
/// When attached to an orchestrator, removing a remote participant also
/// tears down the local session to that participant's peer.
#[derive(Clone)]
pub struct PresenceManager {
    store: Arc<dyn RoomStore>,
    liveness_timeout: Duration,
    teardown: Option<OrchestratorHandle>,
}

impl PresenceManager {
    pub fn new(store: Arc<dyn RoomStore>, liveness_timeout: Duration) -> Self {
        Self {
            store,
            liveness_timeout,
            teardown: None,
        }
    }

    pub fn with_teardown(mut self, orchestrator: OrchestratorHandle) -> Self {
        self.teardown = Some(orchestrator);
        self
    }

    /// Adds `participant` unless the latest snapshot already lists its uid.
    pub async fn join(
        &self,
        room_id: &RoomId,
        participant: Participant,
    ) -> Result<JoinOutcome, StoreError> {
        let room = self
            .store
            .snapshot(room_id)
            .await?
            .ok_or_else(|| StoreError::RoomNotFound(room_id.clone()))?;

        if room.contains(&participant.uid) {
            debug!("{} is already present in room {}", participant.uid, room_id);
            return Ok(JoinOutcome::AlreadyPresent);
        }

        info!(
            "{} joins room {} as peer {}",
            participant.uid, room_id, participant.peer_id
        );
        self.store
            .mutate_participants(room_id, ParticipantOp::Add(participant))
            .await?;
        Ok(JoinOutcome::Joined)
    }

    /// Swaps whatever record `participant.uid` has for `participant`, e.g.
    /// when a restarted client finds its old peer id still listed.
    pub async fn replace(
        &self,
        room_id: &RoomId,
        participant: Participant,
    ) -> Result<(), StoreError> {
        info!(
            "Replacing the record of {} in room {} (now peer {})",
            participant.uid, room_id, participant.peer_id
        );
        self.store
            .mutate_participants(
                room_id,
                ParticipantOp::Remove {
                    uid: participant.uid.clone(),
                },
            )
            .await?;
        self.store
            .mutate_participants(room_id, ParticipantOp::Add(participant))
            .await
    }

    /// Removes `uid`. A missing room or participant is not an error.
    ///
    /// The room is closed once its last participant has left.
    pub async fn leave(&self, room_id: &RoomId, uid: &str) -> Result<(), StoreError> {
        let room = match self.store.snapshot(room_id).await {
            Ok(Some(room)) => room,
            Ok(None) | Err(StoreError::RoomNotFound(_)) => {
                debug!("Leave of {}: room {} is already gone", uid, room_id);
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        let departing = room.participant(uid).cloned();

        match self
            .store
            .mutate_participants(room_id, ParticipantOp::Remove { uid: uid.to_owned() })
            .await
        {
            Ok(()) | Err(StoreError::RoomNotFound(_)) => {}
            Err(e) => return Err(e),
        }

        if let Some(participant) = departing {
            info!("{} left room {}", uid, room_id);
            if let Some(orchestrator) = &self.teardown {
                orchestrator.peer_left(participant.peer_id).await;
            }
        }

        match self.store.close_if_empty(room_id).await {
            Ok(_) | Err(StoreError::RoomNotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Merges only the provided status fields.
    pub async fn update_status(
        &self,
        room_id: &RoomId,
        uid: &str,
        patch: StatusPatch,
    ) -> Result<(), StoreError> {
        if patch.is_empty() {
            return Ok(());
        }
        self.store
            .mutate_participants(
                room_id,
                ParticipantOp::UpdateStatus {
                    uid: uid.to_owned(),
                    patch,
                },
            )
            .await
    }

    pub async fn heartbeat(&self, room_id: &RoomId, uid: &str) -> Result<(), StoreError> {
        self.store
            .mutate_participants(room_id, ParticipantOp::Touch { uid: uid.to_owned() })
            .await
    }

    /// Removes every participant whose heartbeat is older than the liveness
    /// timeout, measured against the store clock. Returns who was removed.
    pub async fn sweep_stale(&self, room_id: &RoomId) -> Result<Vec<Participant>, StoreError> {
        let now = self.store.server_time().await?;
        self.sweep_stale_at(room_id, now).await
    }

    pub async fn sweep_stale_at(
        &self,
        room_id: &RoomId,
        now_ms: u64,
    ) -> Result<Vec<Participant>, StoreError> {
        let Some(room) = self.store.snapshot(room_id).await? else {
            return Ok(Vec::new());
        };

        let timeout_ms = self.liveness_timeout.as_millis() as u64;
        let stale: Vec<Participant> = room
            .participants
            .into_iter()
            .filter(|p| now_ms.saturating_sub(p.last_seen) > timeout_ms)
            .collect();

        for participant in &stale {
            warn!(
                "Sweeping stale participant {} from room {} (last seen {} ms ago)",
                participant.uid,
                room_id,
                now_ms.saturating_sub(participant.last_seen)
            );
            self.leave(room_id, &participant.uid).await?;
        }
        Ok(stale)
    }
}
