use huddle_core::Participant;

/// Difference between two consecutive participant lists, keyed by uid.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RosterDiff {
    pub joined: Vec<Participant>,
    pub left: Vec<Participant>,
    /// Present in both, with a changed status or peer id.
    pub updated: Vec<Participant>,
}

impl RosterDiff {
    pub fn between(previous: &[Participant], next: &[Participant]) -> Self {
        let mut diff = RosterDiff::default();

        for p in next {
            match previous.iter().find(|old| old.uid == p.uid) {
                None => diff.joined.push(p.clone()),
                Some(old) if old.peer_id != p.peer_id => {
                    // Same user, new client session: the old peer is gone.
                    diff.left.push(old.clone());
                    diff.joined.push(p.clone());
                }
                Some(old)
                    if old.is_muted != p.is_muted
                        || old.is_video_off != p.is_video_off
                        || old.display_name != p.display_name =>
                {
                    diff.updated.push(p.clone())
                }
                Some(_) => {}
            }
        }

        for old in previous {
            if !next.iter().any(|p| p.uid == old.uid) {
                diff.left.push(old.clone());
            }
        }

        diff
    }

    pub fn is_empty(&self) -> bool {
        self.joined.is_empty() && self.left.is_empty() && self.updated.is_empty()
    }
}
