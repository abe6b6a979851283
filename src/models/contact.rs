use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailContact {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl EmailContact {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            email: email.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneContact {
    pub id: String,
    pub name: String,
    pub phone: String,
}

impl PhoneContact {
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            phone: phone.into(),
        }
    }
}

/// The single always-available contact, distinct from the user registry.
/// Not addable or removable; reachable by SMS and WhatsApp.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    pub name: &'static str,
    pub phone: &'static str,
    pub whatsapp: &'static str,
}

pub const EMERGENCY_CONTACT: EmergencyContact = EmergencyContact {
    name: "Emergency Services",
    phone: "+919142946180",
    whatsapp: "+919142946180",
};

impl EmergencyContact {
    /// Digits-only form required by the wa.me deep link.
    pub fn whatsapp_digits(&self) -> String {
        self.whatsapp.chars().filter(char::is_ascii_digit).collect()
    }

    /// Representation used when recording the contact in a share event.
    pub fn as_phone_contact(&self) -> PhoneContact {
        PhoneContact {
            id: "emergency".to_string(),
            name: self.name.to_string(),
            phone: self.phone.to_string(),
        }
    }
}
