use std::sync::Arc;

use chrono::{Local, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use urlencoding::encode;

use crate::models::{
    ChannelMode, EmailContact, PhoneContact, Position, ShareEvent, Urgency, EMERGENCY_CONTACT,
};

use super::compose::{compose, subject};

/// Fire-and-forget launcher for external applications. The gateway cannot
/// observe whether the spawned app delivered anything; failures are logged
/// and dropped, never retried.
pub trait LinkOpener: Send + Sync {
    fn open(&self, url: &str);
}

/// Opens links through the platform shell.
pub struct SystemOpener;

impl LinkOpener for SystemOpener {
    fn open(&self, url: &str) {
        if let Err(err) = tauri_plugin_opener::open_url(url, None::<&str>) {
            warn!("failed to open external link: {err}");
        }
    }
}

/// The two channels that reach the static emergency contact directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EmergencyChannel {
    Whatsapp,
    Sms,
}

/// Routes composed messages to external channels and records what was
/// attempted. Borrows contact lists to build payloads; never mutates them.
#[derive(Clone)]
pub struct Dispatcher {
    opener: Arc<dyn LinkOpener>,
}

impl Dispatcher {
    pub fn new(opener: Arc<dyn LinkOpener>) -> Self {
        Self { opener }
    }

    /// One dispatch across the eligible channels. Email and SMS address the
    /// registry and require a matching mode plus a non-empty list; WhatsApp
    /// always addresses the static emergency contact. `QuickEmergency`
    /// bypasses mode and registry entirely.
    pub fn dispatch(
        &self,
        position: Position,
        mode: ChannelMode,
        urgency: Urgency,
        emails: Vec<EmailContact>,
        phones: Vec<PhoneContact>,
    ) -> ShareEvent {
        if urgency == Urgency::QuickEmergency {
            return self.dispatch_quick_emergency(position, mode);
        }

        let message = compose(position, Local::now(), urgency);
        let encoded = encode(&message.text);

        let use_email = mode.includes_email() && !emails.is_empty();
        let use_sms = mode.includes_sms() && !phones.is_empty();
        let use_whatsapp = mode.includes_whatsapp();

        if use_email {
            let recipients = emails
                .iter()
                .map(|c| c.email.as_str())
                .collect::<Vec<_>>()
                .join(",");
            let link = format!(
                "mailto:{recipients}?subject={}&body={encoded}",
                encode(subject(urgency))
            );
            self.opener.open(&link);
        }

        if use_sms {
            let recipients = phones
                .iter()
                .map(|c| c.phone.as_str())
                .collect::<Vec<_>>()
                .join(",");
            self.opener.open(&format!("sms:{recipients}?body={encoded}"));
        }

        if use_whatsapp {
            self.opener.open(&emergency_whatsapp_link(&encoded));
        }

        info!(
            "dispatch attempted: email={use_email} sms={use_sms} whatsapp={use_whatsapp} urgency={urgency:?}"
        );

        ShareEvent {
            timestamp: Utc::now(),
            email_contacts: if use_email { emails } else { Vec::new() },
            phone_contacts: if use_sms { phones } else { Vec::new() },
            whatsapp_used: use_whatsapp,
            position,
            urgency,
            channel_mode: mode,
        }
    }

    /// One-shot panic path: always the emergency WhatsApp link plus the
    /// emergency SMS link, registry untouched.
    fn dispatch_quick_emergency(&self, position: Position, mode: ChannelMode) -> ShareEvent {
        let message = compose(position, Local::now(), Urgency::QuickEmergency);
        let encoded = encode(&message.text);

        self.opener.open(&emergency_whatsapp_link(&encoded));
        self.opener
            .open(&format!("sms:{}?body={encoded}", EMERGENCY_CONTACT.phone));

        info!("quick emergency dispatched to the emergency contact");

        ShareEvent {
            timestamp: Utc::now(),
            email_contacts: Vec::new(),
            phone_contacts: vec![EMERGENCY_CONTACT.as_phone_contact()],
            whatsapp_used: true,
            position,
            urgency: Urgency::QuickEmergency,
            channel_mode: mode,
        }
    }

    /// Single-channel share to the static emergency contact (the
    /// emergency-card actions).
    pub fn dispatch_to_emergency(
        &self,
        position: Position,
        channel: EmergencyChannel,
        urgency: Urgency,
        mode: ChannelMode,
    ) -> ShareEvent {
        let message = compose(position, Local::now(), urgency);
        let encoded = encode(&message.text);

        let whatsapp_used = match channel {
            EmergencyChannel::Whatsapp => {
                self.opener.open(&emergency_whatsapp_link(&encoded));
                true
            }
            EmergencyChannel::Sms => {
                self.opener
                    .open(&format!("sms:{}?body={encoded}", EMERGENCY_CONTACT.phone));
                false
            }
        };

        info!("emergency-contact share attempted: channel={channel:?} urgency={urgency:?}");

        ShareEvent {
            timestamp: Utc::now(),
            email_contacts: Vec::new(),
            phone_contacts: if whatsapp_used {
                Vec::new()
            } else {
                vec![EMERGENCY_CONTACT.as_phone_contact()]
            },
            whatsapp_used,
            position,
            urgency,
            channel_mode: mode,
        }
    }
}

fn emergency_whatsapp_link(encoded_text: &str) -> String {
    format!(
        "https://wa.me/{}?text={encoded_text}",
        EMERGENCY_CONTACT.whatsapp_digits()
    )
}
