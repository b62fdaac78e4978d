mod alert;
mod incident;
mod monitor;
mod signal;

pub use alert::*;
pub use incident::*;
pub use monitor::*;
pub use signal::*;

/// Received signal strength in dBm.
pub type Rssi = i16;
