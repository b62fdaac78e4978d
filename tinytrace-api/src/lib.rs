pub mod models;
pub mod shutdown;

pub use shutdown::{Shutdown, ShutdownTrigger, shutdown_channel};
