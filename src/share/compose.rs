use chrono::{DateTime, Local};

use crate::models::{Position, Urgency};

pub struct ComposedMessage {
    pub text: String,
    pub map_url: String,
}

/// Builds the human-readable message for one share. The text is plain UTF-8
/// and safe to percent-encode into `mailto:`, `sms:` and wa.me query strings.
pub fn compose(position: Position, at: DateTime<Local>, urgency: Urgency) -> ComposedMessage {
    let map_url = position.map_url();
    let timestamp = at.format("%Y-%m-%d %H:%M:%S");
    let text = match urgency {
        Urgency::Normal => format!(
            "📍 Location Update\n\nMy current location: {map_url}\n\nTime: {timestamp}\n\nStay safe! 💙"
        ),
        Urgency::Emergency => format!(
            "🚨 EMERGENCY ALERT 🚨\n\nI need immediate help!\n\nMy current location: {map_url}\n\nTime: {timestamp}\n\nPlease contact me immediately or call emergency services if you cannot reach me."
        ),
        Urgency::QuickEmergency => format!(
            "🚨 QUICK EMERGENCY ALERT 🚨\n\nI need immediate help!\n\nMy current location: {map_url}\n\nTime: {timestamp}\n\nPlease contact me immediately or call emergency services if you cannot reach me."
        ),
    };
    ComposedMessage { text, map_url }
}

/// Mail subject line for the given urgency.
pub fn subject(urgency: Urgency) -> &'static str {
    if urgency.is_emergency() {
        "🚨 EMERGENCY ALERT"
    } else {
        "📍 Location Update"
    }
}
