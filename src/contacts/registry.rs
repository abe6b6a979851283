use std::sync::{LazyLock, RwLock};

use log::info;
use regex::Regex;

use crate::models::{EmailContact, PhoneContact};

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));

static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[\d\s\-()]{10,15}$").expect("valid phone pattern"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_PATTERN.is_match(phone)
}

/// Two independent, deduplicated contact collections. Malformed or duplicate
/// inputs are rejected silently at this boundary; the caller keeps the input
/// around for correction.
#[derive(Default)]
pub struct ContactRegistry {
    emails: RwLock<Vec<EmailContact>>,
    phones: RwLock<Vec<PhoneContact>>,
}

impl ContactRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an email contact. Returns `None` when the address is malformed or
    /// already present. An empty name falls back to the address itself.
    pub fn add_email(&self, name: &str, email: &str) -> Option<EmailContact> {
        let email = email.trim();
        if !is_valid_email(email) {
            return None;
        }

        let mut emails = self.emails.write().unwrap();
        if emails.iter().any(|c| c.email == email) {
            return None;
        }

        let name = name.trim();
        let name = if name.is_empty() { email } else { name };
        let contact = EmailContact::new(name, email);
        info!("added email contact {}", contact.id);
        emails.push(contact.clone());
        Some(contact)
    }

    /// Adds an SMS contact. Same gate as `add_email`, with the phone pattern.
    pub fn add_phone(&self, name: &str, phone: &str) -> Option<PhoneContact> {
        let phone = phone.trim();
        if !is_valid_phone(phone) {
            return None;
        }

        let mut phones = self.phones.write().unwrap();
        if phones.iter().any(|c| c.phone == phone) {
            return None;
        }

        let name = name.trim();
        let name = if name.is_empty() { phone } else { name };
        let contact = PhoneContact::new(name, phone);
        info!("added phone contact {}", contact.id);
        phones.push(contact.clone());
        Some(contact)
    }

    /// Removes the contact with the given id from whichever collection holds
    /// it. Unknown ids are ignored.
    pub fn remove(&self, id: &str) {
        self.emails.write().unwrap().retain(|c| c.id != id);
        self.phones.write().unwrap().retain(|c| c.id != id);
    }

    pub fn email_contacts(&self) -> Vec<EmailContact> {
        self.emails.read().unwrap().clone()
    }

    pub fn phone_contacts(&self) -> Vec<PhoneContact> {
        self.phones.read().unwrap().clone()
    }
}
