pub mod compose;
pub mod dispatch;
pub mod history;
pub mod scheduler;

pub use dispatch::{Dispatcher, EmergencyChannel, LinkOpener, SystemOpener};
pub use history::ShareHistory;
pub use scheduler::ShareScheduler;
