use huddle_core::{ChatMessage, ClientToken};
use std::collections::BTreeMap;

/// One rendered chat line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    pub message: ChatMessage,
    /// Shown optimistically; not yet confirmed by the store.
    pub pending: bool,
}

/// Confirmed messages in display order, followed by local messages that
/// are still in flight.
#[derive(Debug, Default)]
pub struct ChatTimeline {
    confirmed: BTreeMap<(u64, String), ChatMessage>,
    pending: Vec<ChatMessage>,
}

impl ChatTimeline {
    /// Merges a stored message. Returns whether the timeline changed.
    ///
    /// Re-delivering a message is a no-op; a message carrying the token of
    /// a pending echo replaces that echo.
    pub fn confirm(&mut self, message: ChatMessage) -> bool {
        let mut changed = false;
        if let Some(token) = &message.client_token {
            let before = self.pending.len();
            self.pending
                .retain(|p| p.client_token.as_ref() != Some(token));
            changed = before != self.pending.len();
        }

        let key = (message.server_timestamp, message.id.clone());
        if self.confirmed.contains_key(&key) {
            return changed;
        }
        self.confirmed.insert(key, message);
        true
    }

    pub fn confirm_all(&mut self, messages: impl IntoIterator<Item = ChatMessage>) -> bool {
        messages
            .into_iter()
            .fold(false, |changed, m| self.confirm(m) | changed)
    }

    pub fn add_pending(&mut self, message: ChatMessage) {
        self.pending.push(message);
    }

    /// Drops an echo whose write failed.
    pub fn discard_pending(&mut self, token: &ClientToken) -> bool {
        let before = self.pending.len();
        self.pending
            .retain(|p| p.client_token.as_ref() != Some(token));
        before != self.pending.len()
    }

    pub fn len(&self) -> usize {
        self.confirmed.len() + self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn entries(&self) -> Vec<ChatEntry> {
        let confirmed = self.confirmed.values().map(|m| ChatEntry {
            message: m.clone(),
            pending: false,
        });
        let pending = self.pending.iter().map(|m| ChatEntry {
            message: m.clone(),
            pending: true,
        });
        confirmed.chain(pending).collect()
    }
}
