mod alert_service;
mod monitor_service;
mod scan_service;
pub mod scanner;
mod signal_stream;

pub use alert_service::*;
pub use monitor_service::*;
pub use scan_service::*;
pub use signal_stream::*;
