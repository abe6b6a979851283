pub mod commands;
pub mod controller;
pub mod state;
mod watcher;

pub use controller::TrackingController;
pub(crate) use controller::ShareDeps;
pub use state::{TrackingState, TrackingStatus};
