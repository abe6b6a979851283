use serde::{Deserialize, Serialize};

use crate::models::{ChannelMode, Position};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TrackingStatus {
    Stopped,
    Tracking,
}

impl Default for TrackingStatus {
    fn default() -> Self {
        TrackingStatus::Stopped
    }
}

/// Observable session state. Created fresh at session start and discarded
/// with the process; mutated only through the tracking controller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingState {
    pub status: TrackingStatus,
    pub position: Option<Position>,
    pub safety_score: Option<u8>,
    pub is_auto_sharing: bool,
    /// 0 = auto-share disabled.
    pub share_interval_min: u32,
    pub channel_mode: ChannelMode,
    /// Latest user-visible error; replaced by the next error or cleared on
    /// successful recovery.
    pub last_error: Option<String>,
}

impl TrackingState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_tracking(&self) -> bool {
        self.status == TrackingStatus::Tracking
    }

    pub fn begin_tracking(&mut self) {
        self.status = TrackingStatus::Tracking;
        self.last_error = None;
    }

    pub fn stop(&mut self) {
        self.status = TrackingStatus::Stopped;
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }
}
