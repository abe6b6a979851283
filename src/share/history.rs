use std::sync::RwLock;

use crate::models::ShareEvent;

/// How many events the newest-first display window holds.
pub const DISPLAY_LIMIT: usize = 10;

/// Append-only record of every dispatch, oldest first. Insertion order is
/// chronological order.
#[derive(Default)]
pub struct ShareHistory {
    events: RwLock<Vec<ShareEvent>>,
}

impl ShareHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, event: ShareEvent) {
        self.events.write().unwrap().push(event);
    }

    /// Newest-first window over the last [`DISPLAY_LIMIT`] events.
    pub fn recent(&self) -> Vec<ShareEvent> {
        let events = self.events.read().unwrap();
        events.iter().rev().take(DISPLAY_LIMIT).cloned().collect()
    }

    pub fn all(&self) -> Vec<ShareEvent> {
        self.events.read().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.events.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
