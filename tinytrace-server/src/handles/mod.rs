mod alert_handle;
mod incident_handle;
mod monitor_handle;

pub use alert_handle::*;
pub use incident_handle::*;
pub use monitor_handle::*;
