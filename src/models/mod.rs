pub mod contact;
pub mod position;
pub mod share_event;

pub use contact::{EmailContact, EmergencyContact, PhoneContact, EMERGENCY_CONTACT};
pub use position::Position;
pub use share_event::{ChannelMode, ShareEvent, Urgency};
