#[cfg(feature = "ble")]
mod ble;
mod simulated;

#[cfg(feature = "ble")]
pub use ble::BleScanner;
pub use simulated::SimulatedScanner;

use async_trait::async_trait;

use crate::configs::{Radio, RadioKind};
use crate::errors::ScanError;
use crate::services::signal_stream::Advertisement;

/// A radio that reports advertisements while scanning is active.
#[async_trait]
pub trait Scanner: Send {
    async fn start(&mut self) -> Result<(), ScanError>;

    async fn stop(&mut self) -> Result<(), ScanError>;

    /// Waits for the next advertisement. `None` means the source has nothing
    /// more to report until it is restarted.
    async fn next_advertisement(&mut self) -> Option<Advertisement>;
}

pub async fn build_scanner(radio: &Radio, target_name: &str) -> Result<Box<dyn Scanner>, ScanError> {
    match radio.kind {
        RadioKind::Simulated => Ok(Box::new(SimulatedScanner::new(
            target_name,
            radio.simulation.clone(),
        ))),
        #[cfg(feature = "ble")]
        RadioKind::Ble => Ok(Box::new(BleScanner::new().await?)),
        #[cfg(not(feature = "ble"))]
        RadioKind::Ble => Err(ScanError::AdapterUnavailable(
            "built without bluetooth support, enable the `ble` feature".into(),
        )),
    }
}
