use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EmailContact, PhoneContact, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Urgency {
    Normal,
    Emergency,
    QuickEmergency,
}

impl Urgency {
    pub fn is_emergency(self) -> bool {
        !matches!(self, Urgency::Normal)
    }
}

/// Which outbound channels a share addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChannelMode {
    Email,
    Sms,
    Whatsapp,
    Both,
}

impl Default for ChannelMode {
    fn default() -> Self {
        ChannelMode::Both
    }
}

impl ChannelMode {
    pub fn includes_email(self) -> bool {
        matches!(self, ChannelMode::Email | ChannelMode::Both)
    }

    pub fn includes_sms(self) -> bool {
        matches!(self, ChannelMode::Sms | ChannelMode::Both)
    }

    pub fn includes_whatsapp(self) -> bool {
        matches!(self, ChannelMode::Whatsapp | ChannelMode::Both)
    }
}

/// Record of one dispatch: which channels were attempted, for which position,
/// at which urgency. Immutable once appended to the history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareEvent {
    pub timestamp: DateTime<Utc>,
    pub email_contacts: Vec<EmailContact>,
    pub phone_contacts: Vec<PhoneContact>,
    pub whatsapp_used: bool,
    pub position: Position,
    pub urgency: Urgency,
    pub channel_mode: ChannelMode,
}
