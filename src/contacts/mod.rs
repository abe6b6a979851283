pub mod commands;
pub mod registry;

pub use registry::ContactRegistry;
