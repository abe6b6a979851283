use serde::Serialize;
use tauri::State;

use crate::models::{EmailContact, EmergencyContact, PhoneContact, EMERGENCY_CONTACT};
use crate::AppState;

#[derive(Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ContactLists {
    pub email_contacts: Vec<EmailContact>,
    pub phone_contacts: Vec<PhoneContact>,
}

#[tauri::command]
pub fn add_email_contact(
    state: State<'_, AppState>,
    name: String,
    email: String,
) -> Option<EmailContact> {
    state.contacts.add_email(&name, &email)
}

#[tauri::command]
pub fn add_phone_contact(
    state: State<'_, AppState>,
    name: String,
    phone: String,
) -> Option<PhoneContact> {
    state.contacts.add_phone(&name, &phone)
}

#[tauri::command]
pub fn remove_contact(state: State<'_, AppState>, id: String) {
    state.contacts.remove(&id);
}

#[tauri::command]
pub fn get_contacts(state: State<'_, AppState>) -> ContactLists {
    ContactLists {
        email_contacts: state.contacts.email_contacts(),
        phone_contacts: state.contacts.phone_contacts(),
    }
}

#[tauri::command]
pub fn get_emergency_contact() -> EmergencyContact {
    EMERGENCY_CONTACT
}
