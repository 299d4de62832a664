use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Address of one participant's client for the lifetime of a room session.
///
/// Ordering is plain lexicographic string ordering; negotiation roles are
/// derived from it (see [`Role::for_pair`]).
#[derive(Debug, Serialize, Deserialize, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(transparent)]
pub struct PeerId(pub String);

impl PeerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PeerId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for PeerId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for PeerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Negotiation role of the local side for one peer pair.
///
/// The smaller peer id is the offerer (impolite: it ignores colliding
/// offers). The larger one is the answerer (polite: it rolls back its own
/// offer and answers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Offerer,
    Answerer,
}

impl Role {
    pub fn for_pair(local: &PeerId, remote: &PeerId) -> Role {
        if local < remote {
            Role::Offerer
        } else {
            Role::Answerer
        }
    }

    pub fn is_polite(self) -> bool {
        self == Role::Answerer
    }
}
